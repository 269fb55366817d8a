// Turns one raw ward table into tidy (candidate, precinct, votes) rows.

use log::debug;
use snafu::{ensure, OptionExt};
use std::collections::HashSet;

use crate::config::{CleanRow, RawGrid};
use crate::error::*;

const CANDIDATES_HEADER: &str = "CANDIDATES";
const CANDIDATE_COLUMN: &str = "candidate";
const TOTAL_COLUMN: &str = "TOTAL";
const WRITE_IN: &str = "(WRITE-IN)";

pub(crate) const BALLOTS_CAST: &str = "BALLOTS CAST";
pub(crate) const VOTES_CAST: &str = "VOTES CAST";
pub(crate) const BLANKS: &str = "BLANKS";
pub(crate) const ALL_OTHERS: &str = "ALL OTHERS";

/// The rows that are not candidates. The extractor sometimes merges their
/// per-precinct counts into a single cell.
pub(crate) const STRUCTURAL_ROWS: [&str; 4] = [BLANKS, VOTES_CAST, BALLOTS_CAST, ALL_OTHERS];

/// Cleans one ward table.
///
/// Arguments:
/// * `grid` the table, whose first row holds the column headers
/// * `table` the position of the table in its document, used for error reporting
///
/// The rows are returned precinct by precinct, in column order, and within a precinct
/// in the order of the table rows.
pub fn clean_table(grid: RawGrid, table: usize) -> PipelineResult<Vec<CleanRow>> {
    let mut rows = grid.into_iter();
    let header: Vec<String> = rows
        .next()
        .context(EmptyTableSnafu { table })?
        .iter()
        .map(|h| match h.trim() {
            CANDIDATES_HEADER => CANDIDATE_COLUMN.to_string(),
            h => h.to_string(),
        })
        .collect();
    let body: Vec<Vec<String>> = rows
        .map(|row| row.iter().map(|c| c.trim().to_string()).collect())
        .collect();
    debug!("clean_table: table {}: header: {:?}", table, header);

    let candidate_col = header
        .iter()
        .position(|h| h == CANDIDATE_COLUMN)
        .context(MissingColumnSnafu {
            table,
            column: CANDIDATE_COLUMN,
        })?;
    let total_col = header
        .iter()
        .position(|h| h == TOTAL_COLUMN)
        .context(MissingColumnSnafu {
            table,
            column: TOTAL_COLUMN,
        })?;
    let first_row = body.first().context(EmptyTableSnafu { table })?;

    // Precincts outside of this ward have no value in the first data row.
    let precinct_cols: Vec<usize> = (0..header.len())
        .filter(|idx| *idx != candidate_col && *idx != total_col)
        .filter(|idx| !cell(first_row, *idx).is_empty())
        .collect();
    debug!(
        "clean_table: table {}: precinct columns: {:?}",
        table, precinct_cols
    );

    let mut wide: Vec<(String, Vec<u64>)> = Vec::new();
    for row in body.iter() {
        let candidate = cell(row, candidate_col);
        if candidate.is_empty() {
            continue;
        }
        let candidate = repair_write_in(candidate);
        let cells: Vec<&str> = precinct_cols.iter().map(|idx| cell(row, *idx)).collect();
        let votes = if STRUCTURAL_ROWS.contains(&candidate.as_str())
            && cells.iter().any(|c| c.is_empty())
        {
            debug!(
                "clean_table: table {}: splitting merged cells of {:?}: {:?}",
                table, candidate, cells
            );
            split_merged_counts(&cells, &candidate, table)?
        } else {
            let mut votes: Vec<u64> = Vec::new();
            for (content, idx) in cells.iter().zip(precinct_cols.iter()) {
                votes.push(parse_votes(content, &candidate, &header[*idx], table)?);
            }
            votes
        };
        wide.push((candidate, votes));
    }

    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut res: Vec<CleanRow> = Vec::new();
    for (pos, idx) in precinct_cols.iter().enumerate() {
        let precinct = header[*idx].as_str();
        for (candidate, votes) in wide.iter() {
            ensure!(
                seen.insert((candidate.as_str(), precinct)),
                DuplicateRowSnafu {
                    table,
                    candidate: candidate.as_str(),
                    precinct,
                }
            );
            res.push(CleanRow {
                candidate: candidate.clone(),
                precinct: precinct.to_string(),
                votes: votes[pos],
            });
        }
    }
    Ok(res)
}

/// Restores the write-in marker that the extractor cuts when a cell wraps over several lines.
///
/// `JANE DOE (WRITE-` becomes `JANE DOE (WRITE-IN)`. Complete names are left untouched.
pub fn repair_write_in(candidate: &str) -> String {
    (1..WRITE_IN.len())
        .rev()
        .map(|len| &WRITE_IN[..len])
        .find(|prefix| candidate.ends_with(prefix))
        .map(|prefix| format!("{}{}", candidate, &WRITE_IN[prefix.len()..]))
        .unwrap_or_else(|| candidate.to_string())
}

/// Spreads the whitespace-separated counts of a merged row over its precinct columns,
/// in column order.
fn split_merged_counts(cells: &[&str], candidate: &str, table: usize) -> PipelineResult<Vec<u64>> {
    let tokens: Vec<&str> = cells.iter().flat_map(|c| c.split_whitespace()).collect();
    ensure!(
        tokens.len() == cells.len(),
        MergedCellMismatchSnafu {
            table,
            candidate,
            expected: cells.len(),
            found: tokens.len(),
        }
    );
    tokens
        .iter()
        .map(|t| parse_votes(t, candidate, "(merged)", table))
        .collect()
}

fn parse_votes(content: &str, candidate: &str, precinct: &str, table: usize) -> PipelineResult<u64> {
    content.parse::<u64>().ok().context(NonNumericVotesSnafu {
        table,
        candidate,
        precinct,
        content,
    })
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(|s| s.as_str()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn grid(rows: &[&[&str]]) -> RawGrid {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    fn votes_of(rows: &[CleanRow], candidate: &str) -> Vec<(String, u64)> {
        rows.iter()
            .filter(|r| r.candidate == candidate)
            .map(|r| (r.precinct.clone(), r.votes))
            .collect()
    }

    #[test]
    fn write_in_repair() {
        assert_eq!(repair_write_in("JANE DOE (WRITE-"), "JANE DOE (WRITE-IN)");
        assert_eq!(repair_write_in("JANE DOE ("), "JANE DOE (WRITE-IN)");
        assert_eq!(repair_write_in("JANE DOE (WRITE-IN"), "JANE DOE (WRITE-IN)");
        assert_eq!(repair_write_in("JOHN SMITH"), "JOHN SMITH");
    }

    #[test]
    fn write_in_repair_is_idempotent() {
        let once = repair_write_in("JANE DOE (WRI");
        assert_eq!(repair_write_in(&once), once);
        assert_eq!(
            repair_write_in("JANE DOE (WRITE-IN)"),
            "JANE DOE (WRITE-IN)"
        );
    }

    #[test]
    fn cleans_a_ward_table() {
        let g = grid(&[
            &["CANDIDATES", "1", "2", "3", "TOTAL"],
            &["BALLOTS CAST", "120", "", "80", "200"],
            &["JOHN SMITH", "70", "", "50", "120"],
            &["", "", "", "", ""],
            &["JANE DOE (WRITE-", "30", "", "20", "50"],
        ]);
        let rows = clean_table(g, 2).unwrap();
        // Precinct 2 is not part of this ward.
        assert!(rows.iter().all(|r| r.precinct != "2"));
        assert_eq!(rows.len(), 6);
        assert_eq!(
            votes_of(&rows, "JANE DOE (WRITE-IN)"),
            vec![("1".to_string(), 30), ("3".to_string(), 20)]
        );
        assert_eq!(rows[0].candidate, "BALLOTS CAST");
        assert_eq!(rows[0].precinct, "1");
    }

    #[test]
    fn redistributes_merged_structural_cells() {
        let g = grid(&[
            &["CANDIDATES", "1", "2", "3", "TOTAL"],
            &["BALLOTS CAST", "150", "60", "40", "250"],
            &["BLANKS", "120 45 30", "", "", "195"],
        ]);
        let rows = clean_table(g, 0).unwrap();
        assert_eq!(
            votes_of(&rows, "BLANKS"),
            vec![
                ("1".to_string(), 120),
                ("2".to_string(), 45),
                ("3".to_string(), 30)
            ]
        );
    }

    #[test]
    fn merged_cells_with_wrong_count() {
        let g = grid(&[
            &["CANDIDATES", "1", "2", "3", "TOTAL"],
            &["BALLOTS CAST", "150", "60", "40", "250"],
            &["VOTES CAST", "120 45", "", "", "165"],
        ]);
        let err = clean_table(g, 4).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MergedCellMismatch {
                expected: 3,
                found: 2,
                ..
            }
        ));
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn candidate_rows_are_not_redistributed() {
        let g = grid(&[
            &["CANDIDATES", "1", "2", "TOTAL"],
            &["BALLOTS CAST", "10", "20", "30"],
            &["JOHN SMITH", "4 5", "", "9"],
        ]);
        let err = clean_table(g, 0).unwrap_err();
        assert!(matches!(err, PipelineError::NonNumericVotes { .. }));
    }

    #[test]
    fn missing_total_column() {
        let g = grid(&[&["CANDIDATES", "1", "2"], &["BALLOTS CAST", "10", "20"]]);
        let err = clean_table(g, 0).unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn { ref column, .. } if column == "TOTAL"));
    }

    #[test]
    fn duplicate_candidates() {
        let g = grid(&[
            &["CANDIDATES", "1", "TOTAL"],
            &["JOHN SMITH", "10", "10"],
            &["JOHN SMITH", "12", "12"],
        ]);
        let err = clean_table(g, 0).unwrap_err();
        assert!(matches!(err, PipelineError::DuplicateRow { .. }));
    }
}
