use chrono::Datelike;
use log::{debug, info};
use snafu::ensure;
use std::collections::BTreeMap;

use crate::config::{District, Election, ElectionKey, Race};
use crate::error::*;

/// A race together with the election it was classified into.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ClassifiedRace {
    pub key: ElectionKey,
    pub race: Race,
}

/// Groups the races into elections.
///
/// Races with the same date, preliminary and special flags belong to the same election.
/// Elections are returned most recent first.
pub fn group_elections(
    races: Vec<ClassifiedRace>,
    geometry: &str,
) -> PipelineResult<Vec<Election>> {
    let grouped: BTreeMap<ElectionKey, Vec<Race>> =
        races
            .into_iter()
            .fold(BTreeMap::new(), |mut acc: BTreeMap<ElectionKey, Vec<Race>>, cr| {
                acc.entry(cr.key).or_default().push(cr.race);
                acc
            });
    debug!("group_elections: keys: {:?}", grouped.keys().collect::<Vec<_>>());

    let mut elections: Vec<Election> = Vec::new();
    for (key, races) in grouped {
        elections.push(to_election(key, races, geometry)?);
    }
    elections.sort_by(|a, b| b.date.cmp(&a.date));
    info!("group_elections: {} elections", elections.len());
    Ok(elections)
}

fn to_election(key: ElectionKey, mut races: Vec<Race>, geometry: &str) -> PipelineResult<Election> {
    // Mayor, then at-large, then the districts by number.
    races.sort_by_key(|r| r.district);
    let districts: Vec<District> = races.iter().map(|r| r.district).collect();
    let title = election_title(&key, &districts)?;
    info!("to_election: {} ({} races)", title, races.len());
    Ok(Election {
        date: key.date,
        title,
        geometry: geometry.to_string(),
        special: key.special,
        preliminary: key.preliminary,
        races,
    })
}

/// The display title of an election.
///
/// A special election is expected to hold a single race, which names it.
pub fn election_title(key: &ElectionKey, districts: &[District]) -> PipelineResult<String> {
    let year = key.date.year();
    if !key.special {
        let kind = if key.preliminary {
            "Preliminary"
        } else {
            "General"
        };
        return Ok(format!("{} {} Election", year, kind));
    }
    ensure!(
        districts.len() == 1,
        SpecialElectionRacesSnafu {
            date: key.date,
            races: districts.len(),
        }
    );
    let primary = if key.preliminary { " Primary" } else { "" };
    Ok(match districts[0] {
        District::Mayor => format!("{} Special Mayoral Election{}", year, primary),
        District::AtLarge => format!("{} At-Large Special Election{}", year, primary),
        District::Number(n) => format!("{} Special Election{} (District {})", year, primary, n),
    })
}
