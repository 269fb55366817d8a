// Race-level projections of the precinct results, as rendered by the viewer.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

use crate::config::{District, Election, PrecinctLabel, Race};

#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct CandidateShare {
    pub name: String,
    pub votes: u64,
    pub percent: f64,
}

#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct PrecinctDetail {
    pub ward: u32,
    pub precinct: PrecinctLabel,
    pub votes_cast: u64,
    /// In the order of the race summary.
    pub candidates: Vec<CandidateShare>,
}

/// The content of a per-race file.
#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct RaceDetail {
    /// Sorted by votes, most votes first.
    pub summary: Vec<CandidateShare>,
    pub precincts: Vec<PrecinctDetail>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
pub struct RaceListing {
    pub district: District,
    pub title: String,
}

/// An entry of the election index.
#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
pub struct ElectionListing {
    pub date: NaiveDate,
    pub title: String,
    pub geometry: String,
    pub races: Vec<RaceListing>,
}

/// A percentage with two decimals, exact halves rounded to even. Nothing cast gives 0.
pub fn percent(votes: u64, ballots_cast: u64) -> f64 {
    if ballots_cast == 0 {
        return 0.0;
    }
    (votes as f64 / ballots_cast as f64 * 100.0 * 100.0).round_ties_even() / 100.0
}

/// Folds the precinct results of a race into candidate totals.
///
/// Percentages are taken over the ballots cast, blanks included. Candidate names are
/// title-cased, and every precinct lists its candidates in the order of the summary.
pub fn project_race(race: &Race) -> RaceDetail {
    let mut totals: Vec<(String, u64)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut ballots_cast: u64 = 0;
    for p in race.results.iter() {
        ballots_cast += p.ballots_cast;
        for c in p.candidates.iter() {
            let name = title_case(&c.name);
            let pos = *positions.entry(name.clone()).or_insert_with(|| {
                totals.push((name, 0));
                totals.len() - 1
            });
            totals[pos].1 += c.votes;
        }
    }
    // Stable: ties keep the alphabetical order of the precinct results.
    totals.sort_by(|a, b| b.1.cmp(&a.1));

    let rank: HashMap<&str, usize> = totals
        .iter()
        .enumerate()
        .map(|(idx, (name, _))| (name.as_str(), idx))
        .collect();
    let summary: Vec<CandidateShare> = totals
        .iter()
        .map(|(name, votes)| CandidateShare {
            name: name.clone(),
            votes: *votes,
            percent: percent(*votes, ballots_cast),
        })
        .collect();

    let precincts: Vec<PrecinctDetail> = race
        .results
        .iter()
        .map(|p| {
            let mut candidates: Vec<CandidateShare> = p
                .candidates
                .iter()
                .map(|c| CandidateShare {
                    name: title_case(&c.name),
                    votes: c.votes,
                    percent: percent(c.votes, p.ballots_cast),
                })
                .collect();
            candidates.sort_by_key(|c| rank.get(c.name.as_str()).copied().unwrap_or(usize::MAX));
            PrecinctDetail {
                ward: p.ward,
                precinct: p.precinct.clone(),
                votes_cast: p.votes_cast,
                candidates,
            }
        })
        .collect();

    RaceDetail { summary, precincts }
}

/// The details of every race of an election, in race order.
pub fn project_election(election: &Election) -> Vec<(District, RaceDetail)> {
    election
        .races
        .iter()
        .map(|r| (r.district, project_race(r)))
        .collect()
}

/// The election index: one entry per election, with the titles of its races.
pub fn list_elections(elections: &[Election], geometry: &str) -> Vec<ElectionListing> {
    elections
        .iter()
        .map(|e| ElectionListing {
            date: e.date,
            title: e.title.clone(),
            geometry: geometry.to_string(),
            races: e
                .races
                .iter()
                .map(|r| RaceListing {
                    district: r.district,
                    title: race_title(r.district),
                })
                .collect(),
        })
        .collect()
}

pub fn race_title(district: District) -> String {
    match district {
        District::Mayor => "Mayor".to_string(),
        District::AtLarge => "At Large".to_string(),
        District::Number(n) => format!("District {}", n),
    }
}

/// Capitalizes the first letter of every run of letters and lower-cases the rest:
/// `JOHN O'BRIEN (WRITE-IN)` becomes `John O'Brien (Write-In)`.
pub fn title_case(name: &str) -> String {
    let mut res = String::with_capacity(name.len());
    let mut in_word = false;
    for c in name.chars() {
        if c.is_alphabetic() {
            if in_word {
                res.extend(c.to_lowercase());
            } else {
                res.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            res.push(c);
            in_word = false;
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CandidateVotes, PrecinctResult};

    fn precinct(ward: u32, number: u32, blanks: u64, candidates: &[(&str, u64)]) -> PrecinctResult {
        let votes_cast: u64 = candidates.iter().map(|(_, v)| *v).sum();
        PrecinctResult {
            ward,
            precinct: PrecinctLabel::Number(number),
            ballots_cast: votes_cast + blanks,
            votes_cast,
            blanks,
            all_others: 0,
            candidates: candidates
                .iter()
                .map(|(name, votes)| CandidateVotes {
                    name: name.to_string(),
                    votes: *votes,
                })
                .collect(),
        }
    }

    fn race(results: Vec<PrecinctResult>) -> Race {
        Race {
            district: District::Number(1),
            url: "d1.pdf".to_string(),
            results,
        }
    }

    #[test]
    fn summary_percentages() {
        let r = race(vec![precinct(
            1,
            1,
            0,
            &[("ANNA", 100), ("BOB", 50), ("CLARA", 0)],
        )]);
        let detail = project_race(&r);
        let percents: Vec<f64> = detail.summary.iter().map(|c| c.percent).collect();
        assert_eq!(percents, vec![66.67, 33.33, 0.0]);
        assert!(percents.iter().sum::<f64>() <= 100.0 + 0.01);
        let names: Vec<&str> = detail.summary.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Anna", "Bob", "Clara"]);
    }

    #[test]
    fn halves_round_to_even() {
        assert_eq!(percent(1, 32), 3.12);
        assert_eq!(percent(5, 32), 15.62);
        assert_eq!(percent(3, 32), 9.38);
        assert_eq!(percent(1, 8), 12.5);
    }

    #[test]
    fn blanks_count_in_the_denominator() {
        let r = race(vec![precinct(1, 1, 50, &[("ANNA", 100), ("BOB", 50)])]);
        let detail = project_race(&r);
        assert_eq!(detail.summary[0].percent, 50.0);
        assert_eq!(detail.summary[1].percent, 25.0);
    }

    #[test]
    fn precincts_follow_the_summary_order() {
        let r = race(vec![
            precinct(1, 1, 0, &[("ANNA", 10), ("BOB", 30)]),
            precinct(1, 2, 0, &[("ANNA", 5), ("BOB", 1)]),
        ]);
        let detail = project_race(&r);
        assert_eq!(detail.summary[0].name, "Bob");
        assert_eq!(detail.summary[0].votes, 31);
        for p in detail.precincts.iter() {
            let names: Vec<&str> = p.candidates.iter().map(|c| c.name.as_str()).collect();
            assert_eq!(names, vec!["Bob", "Anna"]);
        }
        assert_eq!(detail.precincts[1].candidates[1].percent, 83.33);
    }

    #[test]
    fn empty_precinct_has_zero_percent() {
        let r = race(vec![precinct(2, 3, 0, &[("ANNA", 0), ("BOB", 0)])]);
        let detail = project_race(&r);
        assert!(detail.precincts[0].candidates.iter().all(|c| c.percent == 0.0));
        assert!(detail.summary.iter().all(|c| c.percent == 0.0));
    }

    #[test]
    fn titles() {
        assert_eq!(title_case("JOHN O'BRIEN (WRITE-IN)"), "John O'Brien (Write-In)");
        assert_eq!(race_title(District::AtLarge), "At Large");
        assert_eq!(race_title(District::Number(9)), "District 9");
        assert_eq!(race_title(District::Mayor), "Mayor");
    }
}
