use crate::scrape::*;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use reqwest::header::CONTENT_TYPE;
use tempfile::NamedTempFile;

/// Reads the tables of a results document, in document order.
pub trait TableExtractor {
    fn extract(&self, source: &str) -> ScrapeResult<Vec<RawGrid>>;
}

const INPUT_PLACEHOLDER: &str = "{input}";
const PDF_CONTENT_TYPE: &str = "application/pdf";

pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Runs an external program that prints the tables of a document as a JSON list of
/// grids of strings.
#[derive(Debug, Clone)]
pub struct CommandExtractor {
    program: String,
    args: Vec<String>,
    certificate_file: Option<PathBuf>,
}

impl CommandExtractor {
    pub fn new(settings: &ExtractorSettings) -> CommandExtractor {
        CommandExtractor {
            program: settings.program.clone(),
            args: settings.args.clone(),
            certificate_file: settings.certificate_file.as_ref().map(PathBuf::from),
        }
    }

    fn command_args(&self, input: &str) -> Vec<String> {
        if self.args.iter().any(|a| a.contains(INPUT_PLACEHOLDER)) {
            self.args
                .iter()
                .map(|a| a.replace(INPUT_PLACEHOLDER, input))
                .collect()
        } else {
            let mut args = self.args.clone();
            args.push(input.to_string());
            args
        }
    }

    fn run(&self, input: &str) -> ScrapeResult<Vec<RawGrid>> {
        let args = self.command_args(input);
        debug!("run: {} {:?}", self.program, args);
        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .context(RunningExtractorSnafu {
                program: self.program.as_str(),
                input,
            })?;
        ensure!(
            output.status.success(),
            ExtractorFailedSnafu {
                program: self.program.as_str(),
                input,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
        );
        let grids: Vec<RawGrid> =
            serde_json::from_slice(&output.stdout).context(ExtractorOutputSnafu { input })?;
        debug!("run: {}: {} tables", input, grids.len());
        Ok(grids)
    }
}

impl TableExtractor for CommandExtractor {
    /// Documents on remote hosts with an incomplete certificate chain are downloaded
    /// again with the configured certificate, and extracted from the local copy.
    fn extract(&self, source: &str) -> ScrapeResult<Vec<RawGrid>> {
        match self.run(source) {
            Ok(grids) => Ok(grids),
            Err(e) if is_url(source) => {
                warn!(
                    "extract: {}: {}, retrying with a certificate-authenticated download",
                    source, e
                );
                let local = download_with_certificate(source, self.certificate_file.as_deref())?;
                let path = local.path().display().to_string();
                self.run(&path)
            }
            Err(e) => Err(e),
        }
    }
}

fn http_client(certificate: Option<&Path>, url: &str) -> ScrapeResult<reqwest::blocking::Client> {
    let mut builder = reqwest::blocking::Client::builder().user_agent(USER_AGENT);
    if let Some(path) = certificate {
        let path_s = path.display().to_string();
        let bytes = fs::read(path).context(ReadingCertificateSnafu { path: &path_s })?;
        let cert = reqwest::Certificate::from_pem(&bytes)
            .or_else(|_| reqwest::Certificate::from_der(&bytes))
            .context(FetchingSnafu { url })?;
        debug!("http_client: trusting {}", path_s);
        builder = builder.add_root_certificate(cert);
    }
    builder.build().context(FetchingSnafu { url })
}

/// Downloads a PDF document into a temporary file, removed when dropped.
pub fn download_with_certificate(
    url: &str,
    certificate: Option<&Path>,
) -> ScrapeResult<NamedTempFile> {
    let client = http_client(certificate, url)?;
    let response = client.get(url).send().context(FetchingSnafu { url })?;
    ensure!(
        response.status().is_success(),
        HttpStatusSnafu {
            url,
            status: response.status().as_u16()
        }
    );
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    ensure!(
        is_pdf_content_type(&content_type),
        NotAPdfSnafu { url, content_type }
    );
    let bytes = response.bytes().context(FetchingSnafu { url })?;
    let mut file = tempfile::Builder::new()
        .suffix(".pdf")
        .tempfile()
        .context(SavingDownloadSnafu { url })?;
    file.write_all(&bytes).context(SavingDownloadSnafu { url })?;
    info!(
        "download_with_certificate: {}: {} bytes in {}",
        url,
        bytes.len(),
        file.path().display()
    );
    Ok(file)
}

fn is_pdf_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|t| t.trim().eq_ignore_ascii_case(PDF_CONTENT_TYPE))
        .unwrap_or(false)
}
