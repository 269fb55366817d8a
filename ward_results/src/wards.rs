use log::{debug, info};
use snafu::{ensure, OptionExt};

use crate::cleaner::clean_table;
use crate::config::{CleanRow, RawGrid, Truncation};
use crate::error::*;

/// The ward tables of one document, in the order of the ward summary.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct WardTables {
    pub wards: Vec<u32>,
    pub tables: Vec<Vec<CleanRow>>,
}

/// Splits the tables of a document into the ward summary and the per-ward tables.
///
/// The extractor emits every table twice: first with the raw counts, then with
/// percentages. Only the tables at even positions are read. The truncation is applied
/// on the complete sequence, before the percentage tables are dropped.
pub fn extract_wards(grids: Vec<RawGrid>, truncation: Truncation) -> PipelineResult<WardTables> {
    let num_grids = grids.len();
    let kept = num_grids.saturating_sub(truncation.dropped_tables());
    debug!(
        "extract_wards: {} tables, keeping {} ({:?})",
        num_grids, kept, truncation
    );

    let mut counts = grids.into_iter().take(kept).enumerate().step_by(2);
    let (_, summary) = counts.next().context(MissingSummarySnafu {})?;
    let wards = ward_numbers(&summary)?;
    debug!("extract_wards: wards: {:?}", wards);

    let mut tables: Vec<Vec<CleanRow>> = Vec::new();
    for (idx, grid) in counts {
        tables.push(clean_table(grid, idx)?);
    }
    ensure!(
        wards.len() == tables.len(),
        WardCountMismatchSnafu {
            wards: wards.len(),
            tables: tables.len(),
        }
    );
    info!("extract_wards: read {} ward tables", tables.len());
    Ok(WardTables { wards, tables })
}

// The first row of the summary lists the wards between the candidate column and the total column.
fn ward_numbers(summary: &RawGrid) -> PipelineResult<Vec<u32>> {
    let header = summary.first().context(EmptyTableSnafu { table: 0usize })?;
    let inner: &[String] = if header.len() >= 2 {
        &header[1..header.len() - 1]
    } else {
        &[]
    };
    inner
        .iter()
        .map(|content| {
            content
                .trim()
                .parse::<u32>()
                .ok()
                .context(BadWardNumberSnafu {
                    content: content.as_str(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> RawGrid {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    fn summary() -> RawGrid {
        grid(&[
            &["CANDIDATES", "3", "4", "TOTAL"],
            &["JOHN SMITH", "10", "20", "30"],
        ])
    }

    fn percents() -> RawGrid {
        grid(&[
            &["CANDIDATES", "3", "4", "TOTAL"],
            &["JOHN SMITH", "33%", "66%", "100%"],
        ])
    }

    fn ward(precincts: &[&str]) -> RawGrid {
        let mut header = vec!["CANDIDATES"];
        header.extend(precincts);
        header.push("TOTAL");
        let mut row = vec!["JOHN SMITH"];
        row.extend(precincts.iter().map(|_| "5"));
        row.push("0");
        grid(&[header.as_slice(), row.as_slice()])
    }

    #[test]
    fn reads_the_raw_count_tables() {
        let grids = vec![
            summary(),
            percents(),
            ward(&["1", "2"]),
            percents(),
            ward(&["1"]),
            percents(),
        ];
        let wt = extract_wards(grids, Truncation::Keep).unwrap();
        assert_eq!(wt.wards, vec![3, 4]);
        assert_eq!(wt.tables.len(), 2);
        assert_eq!(wt.tables[0].len(), 2);
        assert_eq!(wt.tables[1].len(), 1);
    }

    #[test]
    fn drops_trailing_tables() {
        let grids = vec![
            summary(),
            percents(),
            ward(&["1", "2"]),
            percents(),
            ward(&["1"]),
            percents(),
            ward(&["9"]),
        ];
        let wt = extract_wards(grids.clone(), Truncation::DropLastOne).unwrap();
        assert_eq!(wt.tables.len(), 2);
        let err = extract_wards(grids, Truncation::DropLastThree).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::WardCountMismatch {
                wards: 2,
                tables: 1
            }
        ));
    }

    #[test]
    fn bad_ward_number() {
        let grids = vec![grid(&[&["CANDIDATES", "3", "Ward Four", "TOTAL"]])];
        let err = extract_wards(grids, Truncation::Keep).unwrap_err();
        assert!(matches!(err, PipelineError::BadWardNumber { .. }));
    }

    #[test]
    fn no_tables() {
        let err = extract_wards(vec![], Truncation::Keep).unwrap_err();
        assert!(matches!(err, PipelineError::MissingSummary {}));
    }
}
