use crate::scrape::*;

use once_cell::sync::Lazy;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// A results document, as listed on the index page.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DocumentLink {
    #[serde(rename = "electionLabel")]
    pub election_label: String,
    #[serde(rename = "linkLabel")]
    pub link_label: String,
    pub url: String,
}

pub trait Discovery {
    fn discover(&self, index_url: &str) -> ScrapeResult<Vec<DocumentLink>>;
}

// The selectors are constants, parsing them cannot fail.
static DRAWER_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"div[bos_context_type="Drawer"]"#).unwrap());
static HEADING_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("div.dr-t div").unwrap());
static CONTENT_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("div.dr-c").unwrap());
static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

const HEADING_KEYWORD: &str = "municipal";
const LINK_KEYWORDS: [&str; 3] = ["council", "mayor", "result"];

fn normalized_text(element: ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .replace('\u{a0}', " ")
        .trim()
        .to_lowercase()
}

/// Crawls the results index page: one drawer per election, with the links to its documents.
pub struct HtmlIndex {
    include_headings: Vec<String>,
    host_rewrites: Vec<(String, String)>,
}

impl HtmlIndex {
    pub fn new(config: &ScrapeConfig) -> HtmlIndex {
        HtmlIndex {
            include_headings: config.include_headings.clone(),
            host_rewrites: config.host_rewrites.clone(),
        }
    }

    /// The arguments that identify a crawl: the page and the settings that change its result.
    pub fn cache_args(&self, index_url: &str) -> Vec<String> {
        vec![
            index_url.to_string(),
            json!(self.include_headings).to_string(),
            json!(self.host_rewrites).to_string(),
        ]
    }

    fn keeps_heading(&self, heading: &str) -> bool {
        heading.contains(HEADING_KEYWORD) || self.include_headings.iter().any(|h| h == heading)
    }

    fn rewrite_host(&self, url: &str) -> String {
        self.host_rewrites
            .iter()
            .fold(url.to_string(), |u, (from, to)| u.replace(from, to))
    }

    /// Finds the municipal election documents of an index page.
    pub fn parse_index(&self, html: &str, page_url: &Url) -> Vec<DocumentLink> {
        let document = Html::parse_document(html);
        let mut links: Vec<DocumentLink> = Vec::new();
        for drawer in document.select(&DRAWER_SELECTOR) {
            let heading = match drawer.select(&HEADING_SELECTOR).next() {
                Some(h) => normalized_text(h),
                None => {
                    debug!("parse_index: drawer without a heading");
                    continue;
                }
            };
            if !self.keeps_heading(&heading) {
                debug!("parse_index: skipping the election {:?}", heading);
                continue;
            }
            let content = match drawer.select(&CONTENT_SELECTOR).next() {
                Some(c) => c,
                None => continue,
            };
            for anchor in content.select(&LINK_SELECTOR) {
                let link_label = normalized_text(anchor);
                if !LINK_KEYWORDS.iter().any(|k| link_label.contains(k)) {
                    continue;
                }
                let href = anchor.value().attr("href").unwrap_or_default();
                let url = match page_url.join(href) {
                    Ok(u) => self.rewrite_host(u.as_str()),
                    Err(e) => {
                        warn!("parse_index: {:?}: invalid link {:?}: {}", heading, href, e);
                        continue;
                    }
                };
                links.push(DocumentLink {
                    election_label: heading.clone(),
                    link_label,
                    url,
                });
            }
        }
        links
    }
}

impl Discovery for HtmlIndex {
    fn discover(&self, index_url: &str) -> ScrapeResult<Vec<DocumentLink>> {
        info!("discover: fetching {}", index_url);
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context(FetchingSnafu { url: index_url })?;
        let response = client
            .get(index_url)
            .send()
            .context(FetchingSnafu { url: index_url })?;
        ensure!(
            response.status().is_success(),
            HttpStatusSnafu {
                url: index_url,
                status: response.status().as_u16()
            }
        );
        let page_url = response.url().clone();
        let html = response.text().context(FetchingSnafu { url: index_url })?;
        let links = self.parse_index(&html, &page_url);
        info!("discover: {} documents on {}", links.len(), page_url);
        Ok(links)
    }
}

/// A JSON list of documents written by hand or by a previous crawl.
pub struct ManifestFile {
    path: String,
}

impl ManifestFile {
    pub fn new(path: &str) -> ManifestFile {
        ManifestFile {
            path: path.to_string(),
        }
    }
}

impl Discovery for ManifestFile {
    fn discover(&self, _index_url: &str) -> ScrapeResult<Vec<DocumentLink>> {
        info!("discover: reading the manifest {}", self.path);
        let contents = fs::read_to_string(&self.path).context(OpeningJsonSnafu {
            path: self.path.as_str(),
        })?;
        serde_json::from_str(&contents).context(ParsingJsonSnafu {
            path: self.path.as_str(),
        })
    }
}
