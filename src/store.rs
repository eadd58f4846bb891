use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::catalog::FetchParams;
use crate::error::EyenetError;

/// Local data root holding the downloaded dataset tree
/// (`EEGEYENET-Data/{task}/{subject}/{archive}`).
#[derive(Debug, Clone)]
pub struct Store {
    data_root: Utf8PathBuf,
}

impl Store {
    pub fn new() -> Result<Self, EyenetError> {
        let data_root = BaseDirs::new()
            .and_then(|dirs| {
                Utf8PathBuf::from_path_buf(
                    dirs.home_dir().join(".cache").join("eegeyenet-fetcher"),
                )
                .ok()
            })
            .ok_or_else(|| {
                EyenetError::Filesystem("unable to resolve data directory".to_string())
            })?;
        Ok(Self { data_root })
    }

    pub fn new_with_root(data_root: Utf8PathBuf) -> Self {
        Self { data_root }
    }

    pub fn data_root(&self) -> &Utf8Path {
        &self.data_root
    }

    /// Destination folder for one (subject, run) download.
    pub fn dataset_dir(&self, params: &FetchParams) -> Utf8PathBuf {
        self.data_root.join(&params.folder_name)
    }

    /// Expected location of the archive file after a successful fetch.
    pub fn archive_path(&self, params: &FetchParams) -> Utf8PathBuf {
        self.dataset_dir(params).join(&params.archive_name)
    }

    pub fn metadata_path(&self, params: &FetchParams) -> Utf8PathBuf {
        self.dataset_dir(params)
            .join(format!("{}.json", params.archive_name))
    }

    pub fn ensure_root(&self) -> Result<(), EyenetError> {
        fs::create_dir_all(self.data_root.as_std_path())
            .map_err(|err| EyenetError::Filesystem(err.to_string()))
    }

    pub fn exists(&self, path: &Utf8Path) -> bool {
        path.as_std_path().exists()
    }

    pub fn write_metadata(path: &Utf8Path, metadata: &Metadata) -> Result<(), EyenetError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent.as_std_path())
                .map_err(|err| EyenetError::Filesystem(err.to_string()))?;
        }
        let tmp_path = path.with_extension("json.tmp");
        let content = serde_json::to_vec_pretty(metadata)
            .map_err(|err| EyenetError::Filesystem(err.to_string()))?;
        fs::write(tmp_path.as_std_path(), &content)
            .map_err(|err| EyenetError::Filesystem(err.to_string()))?;
        fs::rename(tmp_path.as_std_path(), path.as_std_path())
            .map_err(|err| EyenetError::Filesystem(err.to_string()))?;
        Ok(())
    }
}

/// Sidecar written next to each downloaded archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    pub dataset: String,
    pub subject: String,
    pub run: u32,
    pub task: String,
    pub source_url: String,
    pub hash: String,
    pub downloaded_at: String,
    pub tool: String,
}
