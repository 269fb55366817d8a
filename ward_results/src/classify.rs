use chrono::NaiveDate;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use snafu::{OptionExt, ResultExt};

use crate::config::{District, ElectionKey, Overrides};
use crate::error::*;

// The pattern is a compile-time constant; it is known to be valid.
static DISTRICT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"district (\d+)").expect("valid district pattern"));

/// The date format of the election labels, for example `november 8, 2011`.
const LABEL_DATE_FORMAT: &str = "%B %d, %Y";

/// What a results document is about, as read from its labels.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct RaceLabel {
    pub key: ElectionKey,
    pub district: District,
}

/// Classifies a results document from the label of its election
/// (`november 8, 2011: municipal election`) and the text of its link.
pub fn classify_race(
    election_label: &str,
    link_label: &str,
    overrides: &Overrides,
) -> PipelineResult<RaceLabel> {
    let district = resolve_district(election_label, link_label, overrides)?;
    let key = resolve_election(election_label, link_label, overrides)?;
    debug!(
        "classify_race: {:?} / {:?} -> {:?} {:?}",
        election_label, link_label, district, key
    );
    Ok(RaceLabel { key, district })
}

/// Finds the office of a race.
///
/// The overrides are checked first. Otherwise the labels are searched for `mayor`,
/// then `large`, then `district <N>`. There is no default: a document that matches
/// none of them needs an override.
pub fn resolve_district(
    election_label: &str,
    link_label: &str,
    overrides: &Overrides,
) -> PipelineResult<District> {
    if let Some(d) = overrides.district_for(election_label, link_label) {
        return Ok(d);
    }
    let text = search_text(election_label, link_label);
    if text.contains("mayor") {
        return Ok(District::Mayor);
    }
    if text.contains("large") {
        return Ok(District::AtLarge);
    }
    DISTRICT_PATTERN
        .captures(&text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .map(District::Number)
        .context(DistrictUnresolvedSnafu {
            election_label,
            link_label,
        })
}

/// Finds the date and the kind of election a race belongs to.
pub fn resolve_election(
    election_label: &str,
    link_label: &str,
    overrides: &Overrides,
) -> PipelineResult<ElectionKey> {
    let date = parse_election_date(election_label)?;
    let text = search_text(election_label, link_label);
    Ok(ElectionKey {
        date,
        preliminary: text.contains("prelim") || overrides.is_preliminary_date(&date),
        special: text.contains("special"),
    })
}

// The date is the part of the label before the first colon.
fn parse_election_date(election_label: &str) -> PipelineResult<NaiveDate> {
    let prefix = election_label.split(':').next().unwrap_or("").trim();
    NaiveDate::parse_from_str(prefix, LABEL_DATE_FORMAT).context(DateUnresolvedSnafu {
        election_label,
    })
}

fn search_text(election_label: &str, link_label: &str) -> String {
    format!("{}{}", election_label, link_label).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DistrictOverride;
    use crate::error::ErrorKind;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn districts_from_labels() {
        let o = Overrides::default();
        assert_eq!(
            resolve_district("", "district 7 results", &o).unwrap(),
            District::Number(7)
        );
        assert_eq!(
            resolve_district("", "mayor election results", &o).unwrap(),
            District::Mayor
        );
        assert_eq!(
            resolve_district("", "at-large council results", &o).unwrap(),
            District::AtLarge
        );
        assert_eq!(
            resolve_district("november 8, 2011: municipal election", "District 12 Councillor", &o)
                .unwrap(),
            District::Number(12)
        );
    }

    #[test]
    fn unresolved_district() {
        let err = resolve_district("may 15, 2007: special municipal election", "election results", &Overrides::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DistrictUnresolved);
    }

    #[test]
    fn district_overrides_come_first() {
        let o = Overrides {
            districts: vec![DistrictOverride {
                election_label: "may 15, 2007: special municipal election".to_string(),
                link_label: "election results".to_string(),
                district: District::Number(2),
            }],
            ..Overrides::default()
        };
        assert_eq!(
            resolve_district("May 15, 2007: Special Municipal Election", "election results", &o)
                .unwrap(),
            District::Number(2)
        );
    }

    #[test]
    fn election_keys() {
        let o = Overrides {
            preliminary_dates: vec![date(2007, 9, 25)],
            ..Overrides::default()
        };
        let k = resolve_election("november 8, 2011: municipal election", "district 1", &o).unwrap();
        assert_eq!(
            k,
            ElectionKey {
                date: date(2011, 11, 8),
                preliminary: false,
                special: false
            }
        );
        let k = resolve_election(
            "october 19, 2010: special preliminary municipal election",
            "ward and precinct official results",
            &o,
        )
        .unwrap();
        assert!(k.preliminary && k.special);
        assert_eq!(k.date, date(2010, 10, 19));
        // Mislabeled as a general election in the source.
        let k = resolve_election("september 25, 2007", "city council at large", &o).unwrap();
        assert!(k.preliminary);
    }

    #[test]
    fn unreadable_date() {
        let err = resolve_election("municipal election", "mayor", &Overrides::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DateUnresolved);
    }
}
