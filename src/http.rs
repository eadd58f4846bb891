use std::fs::{self, File};
use std::io::Read;
use std::thread;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use sha2::{Digest, Sha256};

use crate::catalog::FetchParams;
use crate::error::EyenetError;
use crate::fetch::DatasetFetcher;

/// Blocking HTTP implementation of the dataset-fetch collaborator.
///
/// Skips the download when the destination folder already exists and no
/// forced refresh was requested; the orchestrator owns the compensation for
/// the per-run files this policy misses.
#[derive(Clone)]
pub struct HttpDatasetFetcher {
    client: Client,
}

impl HttpDatasetFetcher {
    pub fn new() -> Result<Self, EyenetError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("eyenet-fetch/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| EyenetError::Filesystem(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| EyenetError::DownloadHttp(err.to_string()))?;
        Ok(Self { client })
    }

    fn send_with_retries(&self, url: &str) -> Result<reqwest::blocking::Response, EyenetError> {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 200;
        let mut attempt = 0usize;
        loop {
            let response = self.client.get(url).send();
            match response {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Err(EyenetError::DownloadHttp(err.to_string()));
                }
            }
        }
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, EyenetError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "download request failed".to_string());
        Err(EyenetError::DownloadStatus { status, message })
    }
}

impl DatasetFetcher for HttpDatasetFetcher {
    fn fetch_dataset(
        &self,
        params: &FetchParams,
        destination: &Utf8Path,
        force_update: bool,
    ) -> Result<Utf8PathBuf, EyenetError> {
        if destination.as_std_path().exists() && !force_update {
            tracing::debug!(folder = %destination, "destination folder present, skipping download");
            return Ok(destination.to_path_buf());
        }
        fs::create_dir_all(destination.as_std_path())
            .map_err(|err| EyenetError::Filesystem(err.to_string()))?;

        let archive_path = destination.join(&params.archive_name);
        tracing::debug!(url = %params.url, archive = %params.archive_name, "downloading");

        let response = self.send_with_retries(&params.url)?;
        let mut response = Self::handle_status(response)?;

        let mut temp = tempfile::Builder::new()
            .prefix("eyenet-fetch")
            .tempfile_in(destination.as_std_path())
            .map_err(|err| EyenetError::Filesystem(err.to_string()))?;
        std::io::copy(&mut response, &mut temp)
            .map_err(|err| EyenetError::Filesystem(err.to_string()))?;

        let actual = sha256_file(temp.path())?;
        let expected = params
            .hash
            .strip_prefix("sha256:")
            .unwrap_or(params.hash.as_str());
        if actual != expected {
            return Err(EyenetError::HashMismatch {
                path: archive_path,
                expected: expected.to_string(),
                actual,
            });
        }

        temp.persist(archive_path.as_std_path())
            .map_err(|err| EyenetError::Filesystem(err.to_string()))?;
        Ok(destination.to_path_buf())
    }
}

/// SHA-256 of a file as lowercase hex, read in bounded chunks.
fn sha256_file(path: &std::path::Path) -> Result<String, EyenetError> {
    const BUF_SIZE: usize = 64 * 1024;
    let mut file = File::open(path).map_err(|err| EyenetError::Filesystem(err.to_string()))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; BUF_SIZE];
    loop {
        let n = file
            .read(&mut buf)
            .map_err(|err| EyenetError::Filesystem(err.to_string()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
