// ********* Input data structures ***********

use std::fmt::Display;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One table as returned by the extraction program: rows of text cells.
///
/// Rows are not guaranteed to have the same number of cells.
pub type RawGrid = Vec<Vec<String>>;

/// A tidy (candidate, precinct, votes) record produced by the table cleaner.
///
/// The cleaner guarantees that a (candidate, precinct) pair appears at most once per table.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CleanRow {
    pub candidate: String,
    pub precinct: String,
    pub votes: u64,
}

/// How many trailing tables of a document must be ignored before
/// the ward tables are read.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Truncation {
    Keep,
    DropLastOne,
    DropLastThree,
}

impl Truncation {
    pub fn dropped_tables(&self) -> usize {
        match self {
            Truncation::Keep => 0,
            Truncation::DropLastOne => 1,
            Truncation::DropLastThree => 3,
        }
    }
}

// ******** Output data structures *********

/// The label of a precinct, as printed in the column header of a ward table.
///
/// Most precincts are plain numbers, but some documents use labels such as
/// `Ward 4 Precinct 2`.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Serialize)]
#[serde(untagged)]
pub enum PrecinctLabel {
    Number(u32),
    Text(String),
}

impl PrecinctLabel {
    pub fn parse(label: &str) -> PrecinctLabel {
        match label.parse::<u32>() {
            Ok(n) => PrecinctLabel::Number(n),
            Err(_) => PrecinctLabel::Text(label.to_string()),
        }
    }
}

impl Display for PrecinctLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrecinctLabel::Number(n) => write!(f, "{}", n),
            PrecinctLabel::Text(s) => write!(f, "{}", s),
        }
    }
}

/// The office a race is for.
///
/// The order of the variants is the order in which races are listed in an election:
/// mayor first, then at-large, then the numbered districts.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, PartialOrd, Ord)]
pub enum District {
    Mayor,
    AtLarge,
    Number(u32),
}

impl Display for District {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            District::Mayor => write!(f, "mayor"),
            District::AtLarge => write!(f, "at_large"),
            District::Number(n) => write!(f, "{}", n),
        }
    }
}

impl FromStr for District {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mayor" => Ok(District::Mayor),
            "at_large" => Ok(District::AtLarge),
            _ => s
                .parse::<u32>()
                .map(District::Number)
                .map_err(|_| format!("unknown district {:?}", s)),
        }
    }
}

impl Serialize for District {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            District::Number(n) => serializer.serialize_u32(*n),
            other => serializer.serialize_str(&other.to_string()),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DistrictRepr {
    Number(u32),
    Name(String),
}

impl<'de> Deserialize<'de> for District {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match DistrictRepr::deserialize(deserializer)? {
            DistrictRepr::Number(n) => Ok(District::Number(n)),
            DistrictRepr::Name(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
pub struct CandidateVotes {
    pub name: String,
    pub votes: u64,
}

/// The results of one contest in one precinct.
///
/// Invariant: `votes_cast == sum(candidates.votes) + all_others`.
#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
pub struct PrecinctResult {
    pub ward: u32,
    pub precinct: PrecinctLabel,
    /// Always `votes_cast + blanks`. The extracted value is not reliable.
    pub ballots_cast: u64,
    pub votes_cast: u64,
    pub blanks: u64,
    pub all_others: u64,
    /// Sorted by name.
    pub candidates: Vec<CandidateVotes>,
}

/// One contest, as read from one results document.
#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
pub struct Race {
    pub district: District,
    pub url: String,
    /// Sorted by ward, then precinct number. All the precincts list the same candidates.
    pub results: Vec<PrecinctResult>,
}

/// Races that were held on the same day under the same rules share an election.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct ElectionKey {
    pub date: NaiveDate,
    pub preliminary: bool,
    pub special: bool,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
pub struct Election {
    pub date: NaiveDate,
    pub title: String,
    pub geometry: String,
    pub special: bool,
    pub preliminary: bool,
    pub races: Vec<Race>,
}

// ********* Configuration **********

/// A district that cannot be read from the labels of a document.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DistrictOverride {
    pub election_label: String,
    pub link_label: String,
    pub district: District,
}

/// Hand-curated corrections for documents that the rules cannot handle.
///
/// Documents are matched by the suffix of their URL.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Overrides {
    pub skip_documents: Vec<String>,
    pub drop_last_one: Vec<String>,
    pub drop_last_three: Vec<String>,
    pub districts: Vec<DistrictOverride>,
    /// Elections that are preliminary even though their labels do not say so.
    pub preliminary_dates: Vec<NaiveDate>,
}

impl Overrides {
    pub fn skips(&self, url: &str) -> bool {
        self.skip_documents.iter().any(|s| url.ends_with(s.as_str()))
    }

    pub fn truncation_for(&self, url: &str) -> Truncation {
        if self.drop_last_three.iter().any(|s| url.ends_with(s.as_str())) {
            Truncation::DropLastThree
        } else if self.drop_last_one.iter().any(|s| url.ends_with(s.as_str())) {
            Truncation::DropLastOne
        } else {
            Truncation::Keep
        }
    }

    /// Labels are compared case-insensitively.
    pub fn district_for(&self, election_label: &str, link_label: &str) -> Option<District> {
        let election_label = election_label.to_lowercase();
        let link_label = link_label.to_lowercase();
        self.districts
            .iter()
            .find(|o| {
                o.election_label.to_lowercase() == election_label
                    && o.link_label.to_lowercase() == link_label
            })
            .map(|o| o.district)
    }

    pub fn is_preliminary_date(&self, date: &NaiveDate) -> bool {
        self.preliminary_dates.contains(date)
    }
}
