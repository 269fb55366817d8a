use crate::scrape::*;

use chrono::NaiveDate;
use serde::Serialize;

pub const ALL_ELECTIONS_FILE: &str = "all_elections.json";
pub const LIST_ELECTIONS_FILE: &str = "list_elections.json";

/// The file of the details of one race, for example `2013-11-05-mayor.json`.
pub fn race_file_name(date: &NaiveDate, district: District) -> String {
    format!("{}-{}.json", date.format("%Y-%m-%d"), district)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> ScrapeResult<()> {
    let path_s = path.display().to_string();
    let contents = serde_json::to_string(value).context(SerializingJsonSnafu { what: &path_s })?;
    fs::write(path, contents).context(WritingOutputSnafu { path: &path_s })?;
    debug!("write_json: {}", path_s);
    Ok(())
}

/// Writes the whole dataset, the listing of the elections and one file per race.
pub fn write_outputs(out_dir: &Path, elections: &[Election], index_geometry: &str) -> ScrapeResult<()> {
    fs::create_dir_all(out_dir).context(WritingOutputSnafu {
        path: out_dir.display().to_string(),
    })?;
    write_json(&out_dir.join(ALL_ELECTIONS_FILE), &elections)?;
    write_json(
        &out_dir.join(LIST_ELECTIONS_FILE),
        &list_elections(elections, index_geometry),
    )?;
    let mut count = 0;
    for election in elections.iter() {
        for (district, detail) in project_election(election) {
            write_json(&out_dir.join(race_file_name(&election.date, district)), &detail)?;
            count += 1;
        }
    }
    info!(
        "write_outputs: {} elections, {} races in {}",
        elections.len(),
        count,
        out_dir.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn precinct(ward: u32, anna: u64, bob: u64) -> PrecinctResult {
        PrecinctResult {
            ward,
            precinct: PrecinctLabel::Number(1),
            ballots_cast: anna + bob + 1,
            votes_cast: anna + bob,
            blanks: 1,
            all_others: 0,
            candidates: vec![
                CandidateVotes {
                    name: "ANNA SMITH".to_string(),
                    votes: anna,
                },
                CandidateVotes {
                    name: "BOB JONES".to_string(),
                    votes: bob,
                },
            ],
        }
    }

    fn election() -> Election {
        Election {
            date: NaiveDate::from_ymd_opt(2013, 11, 5).unwrap(),
            title: "2013 General Election".to_string(),
            geometry: String::new(),
            special: false,
            preliminary: false,
            races: vec![
                Race {
                    district: District::Mayor,
                    url: "https://x.org/mayor.pdf".to_string(),
                    results: vec![precinct(1, 3, 5), precinct(2, 4, 1)],
                },
                Race {
                    district: District::Number(4),
                    url: "https://x.org/d4.pdf".to_string(),
                    results: vec![precinct(4, 2, 2)],
                },
            ],
        }
    }

    #[test]
    fn file_names() {
        let date = NaiveDate::from_ymd_opt(2011, 9, 27).unwrap();
        assert_eq!(race_file_name(&date, District::Mayor), "2011-09-27-mayor.json");
        assert_eq!(
            race_file_name(&date, District::AtLarge),
            "2011-09-27-at_large.json"
        );
        assert_eq!(race_file_name(&date, District::Number(7)), "2011-09-27-7.json");
    }

    #[test]
    fn written_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("data");
        write_outputs(&out, &[election()], "/data/2012_precincts.geojson").unwrap();

        let mut names: Vec<String> = fs::read_dir(&out)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "2013-11-05-4.json",
                "2013-11-05-mayor.json",
                "all_elections.json",
                "list_elections.json"
            ]
        );

        let listing: JSValue =
            serde_json::from_str(&fs::read_to_string(out.join(LIST_ELECTIONS_FILE)).unwrap())
                .unwrap();
        assert_eq!(listing[0]["date"], "2013-11-05");
        assert_eq!(listing[0]["geometry"], "/data/2012_precincts.geojson");
        assert_eq!(listing[0]["races"][1]["title"], "District 4");

        let mayor: JSValue = serde_json::from_str(
            &fs::read_to_string(out.join("2013-11-05-mayor.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(mayor["summary"][0]["name"], "Anna Smith");
        assert_eq!(mayor["summary"][0]["votes"], 7);
        assert_eq!(mayor["summary"][1]["votes"], 6);
    }
}
