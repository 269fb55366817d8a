/*!
Normalization of ward and precinct election result tables.

The input of this crate is the sequence of tables that an extraction program reads from
a results document: a ward summary followed by one table per ward, each of them doubled by
a table of percentages. The output is a validated model of the elections:

```text
Election -> Race -> PrecinctResult -> CandidateVotes
```

The stages, in order:
* [`clean_table`] fixes the known extraction artifacts of one table
* [`extract_wards`] finds the ward tables of a document
* [`aggregate_precincts`] checks the vote counts of every precinct
* [`classify_race`] reads the office and the election of a document from its labels
* [`group_elections`] gathers the races into elections
* [`project_race`] computes the totals and percentages shown for a race

[`build_race`] runs the first three stages on one document.
*/

mod classify;
mod cleaner;
mod config;
mod elections;
mod error;
mod precincts;
mod summary;
mod wards;

use log::info;

pub use crate::classify::{classify_race, resolve_district, resolve_election, RaceLabel};
pub use crate::cleaner::{clean_table, repair_write_in};
pub use crate::config::*;
pub use crate::elections::{election_title, group_elections, ClassifiedRace};
pub use crate::error::{ErrorKind, PipelineError, PipelineResult};
pub use crate::precincts::aggregate_precincts;
pub use crate::summary::*;
pub use crate::wards::{extract_wards, WardTables};

/// Builds the race of one results document from its extracted tables.
///
/// Arguments:
/// * `grids` all the tables of the document, in document order
/// * `truncation` the trailing tables to ignore for this document
/// * `district` the office of the race
/// * `url` the location of the document
pub fn build_race(
    grids: Vec<RawGrid>,
    truncation: Truncation,
    district: District,
    url: &str,
) -> PipelineResult<Race> {
    info!(
        "build_race: {}: {} tables, district {}",
        url,
        grids.len(),
        district
    );
    let WardTables { wards, tables } = extract_wards(grids, truncation)?;
    let results = aggregate_precincts(&wards, tables)?;
    info!("build_race: {}: {} precincts", url, results.len());
    Ok(Race {
        district,
        url: url.to_string(),
        results,
    })
}
