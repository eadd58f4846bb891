use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Run, SubjectId, Task};
use crate::error::EyenetError;

/// Static reference table mapping (subject, run) to the remote resource.
const CATALOG_CSV: &str = include_str!("eegeyenet_urls.csv");

pub const DATASET_NAME: &str = "EEGEYENET";

#[derive(Debug, Clone, Deserialize)]
struct CatalogRow {
    subject: String,
    run: u32,
    task: Task,
    url: String,
    hash: String,
}

/// Everything needed to perform one download. Derived per request from the
/// catalog; never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchParams {
    pub url: String,
    pub archive_name: String,
    pub folder_name: String,
    pub hash: String,
    pub dataset_name: &'static str,
}

fn load_rows() -> Result<Vec<CatalogRow>, EyenetError> {
    let mut reader = csv::Reader::from_reader(CATALOG_CSV.as_bytes());
    reader
        .deserialize()
        .collect::<Result<Vec<CatalogRow>, _>>()
        .map_err(|err| EyenetError::CatalogParse(err.to_string()))
}

/// Map each subject of `task` to its available run numbers, in catalog order.
///
/// A pure view over the catalog, recomputed on each call.
pub fn subjects_and_runs(task: Task) -> Result<BTreeMap<String, Vec<u32>>, EyenetError> {
    let mut index = BTreeMap::<String, Vec<u32>>::new();
    for row in load_rows()? {
        if row.task == task {
            index.entry(row.subject).or_default().push(row.run);
        }
    }
    Ok(index)
}

/// Resolve the fetch parameters for one (subject, run) pair.
///
/// Exactly one catalog row must match; zero or multiple matches is a data
/// error and is surfaced as such rather than tolerated.
pub fn fetch_parameters(subject: &SubjectId, run: Run) -> Result<FetchParams, EyenetError> {
    let matches: Vec<CatalogRow> = load_rows()?
        .into_iter()
        .filter(|row| row.subject == subject.as_str() && row.run == run.number())
        .collect();

    if matches.len() > 1 {
        return Err(EyenetError::CatalogAmbiguous {
            subject: subject.to_string(),
            run: run.number(),
            count: matches.len(),
        });
    }
    let Some(row) = matches.into_iter().next() else {
        return Err(EyenetError::CatalogEntryNotFound {
            subject: subject.to_string(),
            run: run.number(),
        });
    };

    Ok(FetchParams {
        archive_name: format!("{subject}_{}{run}_EEG.mat", row.task),
        folder_name: format!("EEGEYENET-Data/{}/{subject}", row.task),
        url: row.url,
        hash: row.hash,
        dataset_name: DATASET_NAME,
    })
}
