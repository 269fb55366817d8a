use log::{debug, warn};
use snafu::{ensure, OptionExt};
use std::collections::BTreeMap;

use crate::cleaner::{ALL_OTHERS, BALLOTS_CAST, BLANKS, VOTES_CAST};
use crate::config::{CandidateVotes, CleanRow, PrecinctLabel, PrecinctResult};
use crate::error::*;

/// Builds the precinct results of a race from its cleaned ward tables.
///
/// Arguments:
/// * `wards` the ward numbers, in the order of the tables
/// * `tables` the cleaned table of each ward
///
/// Every precinct is checked for `votes_cast == candidates + all_others`, and all the
/// precincts must list the same candidates. The results are ordered by ward, then by
/// precinct number.
pub fn aggregate_precincts(
    wards: &[u32],
    tables: Vec<Vec<CleanRow>>,
) -> PipelineResult<Vec<PrecinctResult>> {
    ensure!(
        wards.len() == tables.len(),
        WardCountMismatchSnafu {
            wards: wards.len(),
            tables: tables.len(),
        }
    );

    let mut results: Vec<PrecinctResult> = Vec::new();
    for (ward, rows) in wards.iter().zip(tables) {
        let mut by_precinct: BTreeMap<String, Vec<CleanRow>> = BTreeMap::new();
        for row in rows {
            by_precinct.entry(row.precinct.clone()).or_default().push(row);
        }
        debug!(
            "aggregate_precincts: ward {}: precincts {:?}",
            ward,
            by_precinct.keys().collect::<Vec<_>>()
        );
        for (label, rows) in by_precinct {
            results.push(precinct_result(*ward, &label, rows)?);
        }
    }

    check_candidate_names(&results)?;

    let mut keyed: Vec<((u32, u64), PrecinctResult)> = Vec::new();
    for r in results {
        keyed.push((precinct_order(&r)?, r));
    }
    keyed.sort_by_key(|(k, _)| *k);
    Ok(keyed.into_iter().map(|(_, r)| r).collect())
}

fn precinct_result(ward: u32, label: &str, rows: Vec<CleanRow>) -> PipelineResult<PrecinctResult> {
    let mut ballots_cast: Option<u64> = None;
    let mut votes_cast: Option<u64> = None;
    let mut blanks: Option<u64> = None;
    let mut all_others: Option<u64> = None;
    let mut candidates: Vec<CandidateVotes> = Vec::new();
    for row in rows {
        match row.candidate.as_str() {
            BALLOTS_CAST => ballots_cast = Some(row.votes),
            VOTES_CAST => votes_cast = Some(row.votes),
            BLANKS => blanks = Some(row.votes),
            ALL_OTHERS => all_others = Some(row.votes),
            _ => candidates.push(CandidateVotes {
                name: row.candidate,
                votes: row.votes,
            }),
        }
    }
    candidates.sort_by(|a, b| a.name.cmp(&b.name));

    let missing = |field: &'static str| MissingFieldSnafu {
        ward,
        precinct: label,
        field,
    };
    let ballots_cast = ballots_cast.context(missing(BALLOTS_CAST))?;
    let votes_cast = votes_cast.context(missing(VOTES_CAST))?;
    let blanks = blanks.context(missing(BLANKS))?;
    let all_others = all_others.context(missing(ALL_OTHERS))?;

    let candidate_votes: u64 = candidates.iter().map(|c| c.votes).sum();
    ensure!(
        votes_cast == candidate_votes + all_others,
        VoteSumMismatchSnafu {
            ward,
            precinct: label,
            votes_cast,
            candidate_votes,
            all_others,
        }
    );

    // The extracted ballots cast are often wrong: the count is rebuilt from the other rows.
    let derived_ballots_cast = votes_cast + blanks;
    if derived_ballots_cast != ballots_cast {
        warn!(
            "precinct_result: ward {} precinct {}: {} ballots cast in the table, using {} (votes cast + blanks)",
            ward, label, ballots_cast, derived_ballots_cast
        );
    }

    Ok(PrecinctResult {
        ward,
        precinct: PrecinctLabel::parse(label),
        ballots_cast: derived_ballots_cast,
        votes_cast,
        blanks,
        all_others,
        candidates,
    })
}

// A table that mixes several contests shows up as precincts with different candidates.
fn check_candidate_names(results: &[PrecinctResult]) -> PipelineResult<()> {
    let names = |r: &PrecinctResult| -> Vec<String> {
        r.candidates.iter().map(|c| c.name.clone()).collect()
    };
    if let Some(first) = results.first() {
        let expected = names(first);
        for r in results.iter() {
            let found = names(r);
            ensure!(
                found == expected,
                CandidateSetMismatchSnafu {
                    ward: r.ward,
                    precinct: r.precinct.to_string(),
                    expected: expected.clone(),
                    found,
                }
            );
        }
    }
    Ok(())
}

// Only the digits of the label are compared: `Ward 4 Precinct 2` comes before `Ward 4 Precinct 10`.
fn precinct_order(r: &PrecinctResult) -> PipelineResult<(u32, u64)> {
    let label = r.precinct.to_string();
    let digits: String = label.chars().filter(|c| c.is_ascii_digit()).collect();
    let number = digits.parse::<u64>().ok().context(UnorderablePrecinctSnafu {
        ward: r.ward,
        precinct: label.as_str(),
    })?;
    Ok((r.ward, number))
}
