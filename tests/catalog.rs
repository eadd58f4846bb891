use assert_matches::assert_matches;

use eegeyenet_fetcher::catalog::{fetch_parameters, subjects_and_runs};
use eegeyenet_fetcher::domain::{Run, SubjectId, Task};
use eegeyenet_fetcher::error::EyenetError;

#[test]
fn every_listed_pair_resolves_to_one_set_of_parameters() {
    for task in [Task::Dots, Task::Antisaccade] {
        let index = subjects_and_runs(task).unwrap();
        assert!(!index.is_empty());
        for (subject, runs) in index {
            let subject: SubjectId = subject.parse().unwrap();
            for run in runs {
                let params = fetch_parameters(&subject, Run::from(run)).unwrap();
                assert_eq!(
                    params.archive_name,
                    format!("{subject}_{}{run}_EEG.mat", task.label())
                );
                assert_eq!(
                    params.folder_name,
                    format!("EEGEYENET-Data/{}/{subject}", task.label())
                );
                assert!(params.url.starts_with("https://"));
                assert!(params.hash.starts_with("sha256:"));
            }
        }
    }
}

#[test]
fn subject_match_is_case_insensitive() {
    let lower: SubjectId = "ep10".parse().unwrap();
    let upper: SubjectId = "EP10".parse().unwrap();
    assert_eq!(
        fetch_parameters(&lower, Run::from(1)).unwrap(),
        fetch_parameters(&upper, Run::from(1)).unwrap()
    );
}

#[test]
fn unknown_pair_is_not_found() {
    let subject: SubjectId = "EP10".parse().unwrap();
    assert_matches!(
        fetch_parameters(&subject, Run::from(42)).unwrap_err(),
        EyenetError::CatalogEntryNotFound { run: 42, .. }
    );

    let subject: SubjectId = "EP99".parse().unwrap();
    assert_matches!(
        fetch_parameters(&subject, Run::from(1)).unwrap_err(),
        EyenetError::CatalogEntryNotFound { .. }
    );
}

#[test]
fn tasks_partition_the_catalog() {
    let dots = subjects_and_runs(Task::Dots).unwrap();
    let anti = subjects_and_runs(Task::Antisaccade).unwrap();

    assert!(dots.keys().all(|subject| !anti.contains_key(subject)));
    assert!(dots.contains_key("EP10"));
    assert!(anti.contains_key("BZ4"));
}
