use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum EyenetError {
    #[error("invalid subject id: {0}")]
    InvalidSubjectId(String),

    #[error("invalid run number: {0}")]
    InvalidRun(String),

    #[error("invalid task: {0} (expected DOTS or AS)")]
    InvalidTask(String),

    #[error("can't determine task for subject {0}: not an EP*, A* or B* id")]
    UnknownTaskPrefix(String),

    #[error(
        "subject {subject} and run {run} not available; \
         see subjects_and_runs() for available subjects and runs"
    )]
    RunUnavailable { subject: String, run: u32 },

    #[error("failed to parse catalog: {0}")]
    CatalogParse(String),

    #[error("no catalog entry for subject {subject} run {run}")]
    CatalogEntryNotFound { subject: String, run: u32 },

    #[error("catalog holds {count} entries for subject {subject} run {run}, expected exactly one")]
    CatalogAmbiguous {
        subject: String,
        run: u32,
        count: usize,
    },

    #[error("download request failed: {0}")]
    DownloadHttp(String),

    #[error("download returned status {status}: {message}")]
    DownloadStatus { status: u16, message: String },

    #[error("hash mismatch for {path}: expected {expected}, got {actual}")]
    HashMismatch {
        path: Utf8PathBuf,
        expected: String,
        actual: String,
    },

    #[error("archive still missing after forced refresh: {0}")]
    MissingAfterRefresh(Utf8PathBuf),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
