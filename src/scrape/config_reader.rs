use crate::scrape::*;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ward_results::{District, DistrictOverride, Overrides};

/// The configuration used when none is given on the command line.
const DEFAULT_CONFIG: &str = include_str!("../../config/boston.json");

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorSettings {
    /// The program that prints the tables of a document as JSON.
    pub program: String,
    /// `{input}` is replaced by the URL or path of the document. If absent, the input
    /// is passed as the last argument.
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(rename = "certificateFile")]
    pub certificate_file: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DistrictOverrideSetting {
    #[serde(rename = "electionLabel")]
    pub election_label: String,
    #[serde(rename = "linkLabel")]
    pub link_label: String,
    pub district: District,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    #[serde(rename = "indexUrl")]
    pub index_url: String,
    #[serde(rename = "includeHeadings", default)]
    pub include_headings: Vec<String>,
    #[serde(rename = "hostRewrites", default)]
    pub host_rewrites: Vec<(String, String)>,
    #[serde(rename = "skipDocuments", default)]
    pub skip_documents: Vec<String>,
    #[serde(rename = "dropLastOne", default)]
    pub drop_last_one: Vec<String>,
    #[serde(rename = "dropLastThree", default)]
    pub drop_last_three: Vec<String>,
    #[serde(rename = "districtOverrides", default)]
    pub district_overrides: Vec<DistrictOverrideSetting>,
    #[serde(rename = "preliminaryDates", default)]
    pub preliminary_dates: Vec<String>,
    #[serde(default)]
    pub geometry: String,
    #[serde(rename = "indexGeometry", default)]
    pub index_geometry: String,
    pub extractor: ExtractorSettings,
}

pub fn read_config(path: Option<&str>) -> ScrapeResult<ScrapeConfig> {
    match path {
        Some(p) => {
            info!("Attempting to read config file {:?}", p);
            let contents = fs::read_to_string(p).context(OpeningJsonSnafu { path: p })?;
            parse_config(&contents, p)
        }
        None => {
            info!("Using the built-in configuration");
            parse_config(DEFAULT_CONFIG, "(built-in)")
        }
    }
}

pub fn parse_config(contents: &str, origin: &str) -> ScrapeResult<ScrapeConfig> {
    let config: ScrapeConfig =
        serde_json::from_str(contents).context(ParsingJsonSnafu { path: origin })?;
    debug!("parse_config: {:?}", config);
    Ok(config)
}

/// Checks the override tables and converts them for the pipeline.
pub fn validate_overrides(config: &ScrapeConfig) -> ScrapeResult<Overrides> {
    for suffix in config.drop_last_one.iter() {
        ensure!(
            !config.drop_last_three.contains(suffix),
            ConflictingTruncationSnafu {
                suffix: suffix.as_str()
            }
        );
    }
    let mut preliminary_dates: Vec<NaiveDate> = Vec::new();
    for value in config.preliminary_dates.iter() {
        let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").context(InvalidDateSnafu {
            value: value.as_str(),
        })?;
        preliminary_dates.push(date);
    }
    Ok(Overrides {
        skip_documents: config.skip_documents.clone(),
        drop_last_one: config.drop_last_one.clone(),
        drop_last_three: config.drop_last_three.clone(),
        districts: config
            .district_overrides
            .iter()
            .map(|o| DistrictOverride {
                election_label: o.election_label.clone(),
                link_label: o.link_label.clone(),
                district: o.district,
            })
            .collect(),
        preliminary_dates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_config() {
        let config = read_config(None).unwrap();
        let overrides = validate_overrides(&config).unwrap();
        assert_eq!(overrides.drop_last_three.len(), 12);
        assert_eq!(
            overrides.district_for("may 16, 2006: special preliminary municipal election", "election results"),
            Some(District::Number(1))
        );
        assert_eq!(
            overrides.preliminary_dates,
            vec![NaiveDate::from_ymd_opt(2007, 9, 25).unwrap()]
        );
        assert_eq!(config.extractor.program, "extract-tables");
    }

    #[test]
    fn minimal_config() {
        let config = parse_config(
            r#"{"indexUrl": "https://example.org/results", "extractor": {"program": "tables"}}"#,
            "test",
        )
        .unwrap();
        assert!(config.extractor.args.is_empty());
        assert_eq!(validate_overrides(&config).unwrap(), Overrides::default());
    }

    #[test]
    fn conflicting_truncations() {
        let config = parse_config(
            r#"{"indexUrl": "x", "dropLastOne": ["/d1.pdf"], "dropLastThree": ["/d1.pdf"],
                "extractor": {"program": "tables"}}"#,
            "test",
        )
        .unwrap();
        let err = validate_overrides(&config).unwrap_err();
        assert!(matches!(err, ScrapeError::ConflictingTruncation { .. }));
    }

    #[test]
    fn bad_preliminary_date() {
        let config = parse_config(
            r#"{"indexUrl": "x", "preliminaryDates": ["25/09/2007"], "extractor": {"program": "tables"}}"#,
            "test",
        )
        .unwrap();
        let err = validate_overrides(&config).unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidDate { .. }));
    }

    #[test]
    fn unknown_district_name() {
        let res = parse_config(
            r#"{"indexUrl": "x", "extractor": {"program": "tables"},
                "districtOverrides": [{"electionLabel": "a", "linkLabel": "b", "district": "governor"}]}"#,
            "test",
        );
        assert!(matches!(res, Err(ScrapeError::ParsingJson { .. })));
    }
}
