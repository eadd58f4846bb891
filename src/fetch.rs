use std::collections::BTreeMap;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;

use crate::catalog::{self, FetchParams};
use crate::domain::{Run, SubjectId, Task};
use crate::error::EyenetError;
use crate::store::{Metadata, Store};

/// Consumed interface of the generic dataset-fetch collaborator.
///
/// Given the fetch parameters and a destination folder, downloads and
/// verifies the resource and returns the destination folder. Its caching
/// policy is keyed on destination-folder existence, not per-file existence;
/// [`App::fetch`] compensates for that.
pub trait DatasetFetcher: Send + Sync {
    fn fetch_dataset(
        &self,
        params: &FetchParams,
        destination: &Utf8Path,
        force_update: bool,
    ) -> Result<Utf8PathBuf, EyenetError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    pub force_update: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchResult {
    pub subject: String,
    pub run: u32,
    pub task: String,
    pub action: String,
    pub path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunsResult {
    pub task: String,
    pub subjects: BTreeMap<String, Vec<u32>>,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Clone)]
pub struct App<F: DatasetFetcher> {
    store: Store,
    fetcher: F,
}

impl<F: DatasetFetcher> App<F> {
    pub fn new(store: Store, fetcher: F) -> Self {
        Self { store, fetcher }
    }

    /// List available subjects and their runs for one task.
    pub fn subjects_and_runs(&self, task: Task) -> Result<RunsResult, EyenetError> {
        Ok(RunsResult {
            task: task.to_string(),
            subjects: catalog::subjects_and_runs(task)?,
        })
    }

    /// Fetch the archive for one (subject, run), returning its local path.
    ///
    /// Derives the task from the subject id, validates the pair against the
    /// catalog, delegates the download and compensates for the collaborator's
    /// folder-keyed caching. The returned path exists on success.
    pub fn fetch(
        &self,
        subject: &SubjectId,
        run: Run,
        options: FetchOptions,
        sink: &dyn ProgressSink,
    ) -> Result<Utf8PathBuf, EyenetError> {
        let task = Task::for_subject(subject)?;
        sink.event(ProgressEvent {
            message: format!("phase=Resolve; subject {subject} run {run} task {task}"),
            elapsed: None,
        });

        let runs = catalog::subjects_and_runs(task)?;
        let available = runs
            .get(subject.as_str())
            .map(|runs| runs.contains(&run.number()))
            .unwrap_or(false);
        if !available {
            return Err(EyenetError::RunUnavailable {
                subject: subject.to_string(),
                run: run.number(),
            });
        }

        let params = catalog::fetch_parameters(subject, run)?;
        let destination = self.store.dataset_dir(&params);
        let archive = self.store.archive_path(&params);
        self.store.ensure_root()?;

        sink.event(ProgressEvent {
            message: format!("phase=Fetch; {}", params.archive_name),
            elapsed: None,
        });
        let start = std::time::Instant::now();
        self.fetcher
            .fetch_dataset(&params, &destination, options.force_update)?;

        // The collaborator skips the download when the subject folder already
        // exists, even if this run's file is not in it. Detect that and
        // reissue once with a forced refresh.
        if !self.store.exists(&archive) {
            sink.event(ProgressEvent {
                message: "phase=Fetch; archive missing after fetch, forcing refresh".to_string(),
                elapsed: Some(start.elapsed()),
            });
            self.fetcher.fetch_dataset(&params, &destination, true)?;
            if !self.store.exists(&archive) {
                return Err(EyenetError::MissingAfterRefresh(archive));
            }
        }

        sink.event(ProgressEvent {
            message: format!("phase=Store; {archive}"),
            elapsed: Some(start.elapsed()),
        });
        Store::write_metadata(
            &self.store.metadata_path(&params),
            &self.build_metadata(subject, run, task, &params),
        )?;

        Ok(archive)
    }

    fn build_metadata(
        &self,
        subject: &SubjectId,
        run: Run,
        task: Task,
        params: &FetchParams,
    ) -> Metadata {
        Metadata {
            dataset: params.dataset_name.to_string(),
            subject: subject.to_string(),
            run: run.number(),
            task: task.to_string(),
            source_url: params.url.clone(),
            hash: params.hash.clone(),
            downloaded_at: chrono::Utc::now().to_rfc3339(),
            tool: format!("eyenet-fetch/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use assert_matches::assert_matches;

    use super::*;
    use crate::output::JsonOutput;

    /// Records each call's force flag; writes the archive file according to
    /// the configured behavior.
    struct MockFetcher {
        calls: Mutex<Vec<bool>>,
        skip_unforced: bool,
    }

    impl MockFetcher {
        fn new(skip_unforced: bool) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                skip_unforced,
            }
        }

        fn force_flags(&self) -> Vec<bool> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl DatasetFetcher for MockFetcher {
        fn fetch_dataset(
            &self,
            params: &FetchParams,
            destination: &Utf8Path,
            force_update: bool,
        ) -> Result<Utf8PathBuf, EyenetError> {
            self.calls.lock().unwrap().push(force_update);
            let folder_cached = destination.as_std_path().exists();
            std::fs::create_dir_all(destination.as_std_path())
                .map_err(|err| EyenetError::Filesystem(err.to_string()))?;
            if force_update || !(self.skip_unforced && folder_cached) {
                std::fs::write(
                    destination.join(&params.archive_name).as_std_path(),
                    b"eeg",
                )
                .map_err(|err| EyenetError::Filesystem(err.to_string()))?;
            }
            Ok(destination.to_path_buf())
        }
    }

    fn test_app(skip_unforced: bool) -> (tempfile::TempDir, App<MockFetcher>) {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        let app = App::new(Store::new_with_root(root), MockFetcher::new(skip_unforced));
        (temp, app)
    }

    #[test]
    fn fetch_dots_subject() {
        let (_temp, app) = test_app(false);
        let subject: SubjectId = "EP10".parse().unwrap();

        let path = app
            .fetch(&subject, Run::from(1), FetchOptions::default(), &JsonOutput)
            .unwrap();

        assert!(path.as_std_path().exists());
        assert_eq!(path.file_name(), Some("EP10_DOTS1_EEG.mat"));
        assert_eq!(app.fetcher.force_flags(), vec![false]);
    }

    #[test]
    fn fetch_antisaccade_subject() {
        let (_temp, app) = test_app(false);
        let subject: SubjectId = "BZ4".parse().unwrap();

        let path = app
            .fetch(&subject, Run::from(1), FetchOptions::default(), &JsonOutput)
            .unwrap();

        assert!(path.as_std_path().exists());
        assert_eq!(path.file_name(), Some("BZ4_AS1_EEG.mat"));
    }

    #[test]
    fn unknown_prefix_fails_before_fetch() {
        let (_temp, app) = test_app(false);
        let subject: SubjectId = "ZZ9".parse().unwrap();

        let err = app
            .fetch(&subject, Run::from(1), FetchOptions::default(), &JsonOutput)
            .unwrap_err();

        assert_matches!(err, EyenetError::UnknownTaskPrefix(_));
        assert!(app.fetcher.force_flags().is_empty());
    }

    #[test]
    fn unlisted_run_fails_before_fetch() {
        let (_temp, app) = test_app(false);
        let subject: SubjectId = "EP10".parse().unwrap();

        let err = app
            .fetch(&subject, Run::from(99), FetchOptions::default(), &JsonOutput)
            .unwrap_err();

        assert_matches!(err, EyenetError::RunUnavailable { run: 99, .. });
        assert!(app.fetcher.force_flags().is_empty());
    }

    #[test]
    fn stale_subject_folder_triggers_forced_refresh() {
        let (_temp, app) = test_app(true);
        let subject: SubjectId = "EP10".parse().unwrap();

        // First run populates the subject folder.
        app.fetch(&subject, Run::from(1), FetchOptions::default(), &JsonOutput)
            .unwrap();
        // Second run hits the folder-existence cache and must be forced.
        let path = app
            .fetch(&subject, Run::from(2), FetchOptions::default(), &JsonOutput)
            .unwrap();

        assert!(path.as_std_path().exists());
        assert_eq!(path.file_name(), Some("EP10_DOTS2_EEG.mat"));
        assert_eq!(app.fetcher.force_flags(), vec![false, false, true]);
    }

    #[test]
    fn refetch_of_existing_run_is_not_forced() {
        let (_temp, app) = test_app(true);
        let subject: SubjectId = "BZ4".parse().unwrap();

        let first = app
            .fetch(&subject, Run::from(1), FetchOptions::default(), &JsonOutput)
            .unwrap();
        let second = app
            .fetch(&subject, Run::from(1), FetchOptions::default(), &JsonOutput)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(app.fetcher.force_flags(), vec![false, false]);
    }

    #[test]
    fn missing_after_refresh_is_fatal() {
        struct NeverWrites;
        impl DatasetFetcher for NeverWrites {
            fn fetch_dataset(
                &self,
                _params: &FetchParams,
                destination: &Utf8Path,
                _force_update: bool,
            ) -> Result<Utf8PathBuf, EyenetError> {
                Ok(destination.to_path_buf())
            }
        }

        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        let app = App::new(Store::new_with_root(root), NeverWrites);
        let subject: SubjectId = "EP10".parse().unwrap();

        let err = app
            .fetch(&subject, Run::from(1), FetchOptions::default(), &JsonOutput)
            .unwrap_err();
        assert_matches!(err, EyenetError::MissingAfterRefresh(_));
    }
}
