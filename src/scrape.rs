use log::{debug, error, info, warn};

use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::Path;

use serde_json::Value as JSValue;
use text_diff::print_diff;
use ward_results::*;

use crate::args::Args;
use crate::scrape::config_reader::*;
use crate::scrape::io_cache::ResultCache;
use crate::scrape::io_discovery::{Discovery, DocumentLink, HtmlIndex, ManifestFile};
use crate::scrape::io_extract::{CommandExtractor, TableExtractor};

pub mod config_reader;
pub mod io_cache;
pub mod io_discovery;
pub mod io_extract;
pub mod io_output;

const DEFAULT_OUT_DIR: &str = "data";
const DEFAULT_CACHE_DIR: &str = "cache";
pub(crate) const USER_AGENT: &str = "Mozilla/5.0";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ScrapeError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the JSON content of {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error serializing {what}"))]
    SerializingJson {
        source: serde_json::Error,
        what: String,
    },
    #[snafu(display("The document suffix {suffix} is in both truncation lists"))]
    ConflictingTruncation { suffix: String },
    #[snafu(display("The preliminary date {value} is not of the form YYYY-MM-DD"))]
    InvalidDate {
        source: chrono::ParseError,
        value: String,
    },

    // Retrieval
    #[snafu(display("Error fetching {url}"))]
    Fetching { source: reqwest::Error, url: String },
    #[snafu(display("Fetching {url} returned the status {status}"))]
    HttpStatus { url: String, status: u16 },
    #[snafu(display("{url} is not a PDF document (content type {content_type:?})"))]
    NotAPdf { url: String, content_type: String },
    #[snafu(display("Error reading the certificate {path}"))]
    ReadingCertificate {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error saving the download of {url}"))]
    SavingDownload {
        source: std::io::Error,
        url: String,
    },
    #[snafu(display("Error running the table extractor {program} on {input}"))]
    RunningExtractor {
        source: std::io::Error,
        program: String,
        input: String,
    },
    #[snafu(display("The table extractor {program} failed on {input}: {stderr}"))]
    ExtractorFailed {
        program: String,
        input: String,
        stderr: String,
    },
    #[snafu(display("The table extractor did not print a list of tables for {input}"))]
    ExtractorOutput {
        source: serde_json::Error,
        input: String,
    },

    #[snafu(display("Error accessing the cache entry {path}"))]
    Cache {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },

    #[snafu(display("{url}: {source}"))]
    Document {
        source: Box<ScrapeError>,
        url: String,
    },
    #[snafu(display("{source}"))]
    Pipeline { source: PipelineError },
    #[snafu(display("{failed} of {total} documents could not be processed"))]
    DocumentsFailed { failed: usize, total: usize },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type ScrapeResult<T> = Result<T, ScrapeError>;

impl From<PipelineError> for ScrapeError {
    fn from(source: PipelineError) -> Self {
        ScrapeError::Pipeline { source }
    }
}

/// The outcome of a run over the discovered documents.
struct ProcessedDocuments {
    races: Vec<ClassifiedRace>,
    failures: Vec<ScrapeError>,
    /// The documents that were not skipped.
    processed: usize,
}

/// Processes the documents one by one. The races that could be built are returned along
/// with the failures, which do not stop the processing of the other documents.
fn process_documents(
    documents: &[DocumentLink],
    overrides: &Overrides,
    extractor: &dyn TableExtractor,
    cache: &ResultCache,
) -> ProcessedDocuments {
    let mut races: Vec<ClassifiedRace> = Vec::new();
    let mut failures: Vec<ScrapeError> = Vec::new();
    let mut processed = 0;
    for doc in documents.iter() {
        if overrides.skips(&doc.url) {
            info!("process_documents: skipping {}", doc.url);
            continue;
        }
        processed += 1;
        match process_document(doc, overrides, extractor, cache) {
            Ok(race) => races.push(race),
            Err(e) => {
                error!("process_documents: {}: {}", doc.url, e);
                failures.push(ScrapeError::Document {
                    source: Box::new(e),
                    url: doc.url.clone(),
                });
            }
        }
    }
    ProcessedDocuments {
        races,
        failures,
        processed,
    }
}

fn process_document(
    doc: &DocumentLink,
    overrides: &Overrides,
    extractor: &dyn TableExtractor,
    cache: &ResultCache,
) -> ScrapeResult<ClassifiedRace> {
    debug!(
        "process_document: {:?} / {:?}: {}",
        doc.election_label, doc.link_label, doc.url
    );
    let label = classify_race(&doc.election_label, &doc.link_label, overrides)?;
    let grids: Vec<RawGrid> = cache.get_or_compute("extract", &[doc.url.as_str()], || {
        extractor.extract(&doc.url)
    })?;
    let race = build_race(
        grids,
        overrides.truncation_for(&doc.url),
        label.district,
        &doc.url,
    )?;
    Ok(ClassifiedRace {
        key: label.key,
        race,
    })
}

fn read_reference(path: &str) -> ScrapeResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    serde_json::from_str(&contents).context(ParsingJsonSnafu { path })
}

/// Compares the elections with a reference dump of all the elections.
pub fn check_reference(elections: &[Election], reference_path: &str) -> ScrapeResult<()> {
    let reference = read_reference(reference_path)?;
    let pretty_reference = serde_json::to_string_pretty(&reference).context(SerializingJsonSnafu {
        what: reference_path,
    })?;
    let elections_js = serde_json::to_value(elections).context(SerializingJsonSnafu {
        what: "the elections",
    })?;
    let pretty_elections =
        serde_json::to_string_pretty(&elections_js).context(SerializingJsonSnafu {
            what: "the elections",
        })?;
    if pretty_reference != pretty_elections {
        warn!("Found differences with the reference elections");
        print_diff(pretty_reference.as_str(), pretty_elections.as_str(), "\n");
        whatever!("Difference detected between the scraped elections and the reference elections")
    }
    info!("check_reference: identical to {}", reference_path);
    Ok(())
}

pub fn run_scrape(args: &Args) -> ScrapeResult<()> {
    let config = read_config(args.config.as_deref())?;
    let overrides = validate_overrides(&config)?;

    let cache = if args.no_cache {
        ResultCache::disabled()
    } else {
        ResultCache::new(args.cache_dir.as_deref().unwrap_or(DEFAULT_CACHE_DIR))
    };

    let documents: Vec<DocumentLink> = match &args.manifest {
        Some(path) => ManifestFile::new(path).discover(&config.index_url)?,
        None => {
            let index = HtmlIndex::new(&config);
            let cache_args = index.cache_args(&config.index_url);
            let cache_refs: Vec<&str> = cache_args.iter().map(|a| a.as_str()).collect();
            cache.get_or_compute("discover", &cache_refs, || {
                index.discover(&config.index_url)
            })?
        }
    };
    info!("run_scrape: {} documents", documents.len());

    let extractor = CommandExtractor::new(&config.extractor);
    let ProcessedDocuments {
        races,
        failures,
        processed,
    } = process_documents(&documents, &overrides, &extractor, &cache);
    for failure in failures.iter() {
        eprintln!("Failed: {}", failure);
    }
    if !failures.is_empty() && !args.allow_failures {
        return DocumentsFailedSnafu {
            failed: failures.len(),
            total: processed,
        }
        .fail();
    }

    let elections = group_elections(races, &config.geometry)?;
    info!("run_scrape: {} elections", elections.len());

    let out_dir = args.out.as_deref().unwrap_or(DEFAULT_OUT_DIR);
    io_output::write_outputs(Path::new(out_dir), &elections, &config.index_geometry)?;

    if let Some(reference) = &args.reference {
        check_reference(&elections, reference)?;
    }

    if !failures.is_empty() {
        warn!(
            "run_scrape: {} documents failed and are missing from the output",
            failures.len()
        );
    }
    Ok(())
}
