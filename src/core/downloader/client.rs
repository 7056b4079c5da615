use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::core::error::{ManagerError, ManagerResult};
use crate::core::step::{StepFailure, StepResult};

use super::extract::extract_archive;

/// Fetches bundle archives and unpacks them.
pub struct Downloader {
    client: Client,
}

impl Downloader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    // ── Download ────────────────────────────────────────

    /// Download `url` into the file `dest`, streaming the body to disk.
    ///
    /// A non-success status fails the step with the status in the log.
    pub async fn download(&self, url: &str, dest: &Path) -> StepResult {
        let log = vec![format!("Downloading {url}")];
        match self.stream_to_file(url, dest).await {
            Ok(bytes) => {
                info!("Downloaded {} ({} bytes)", url, bytes);
                let mut log = log;
                log.push(format!("Downloaded {bytes} bytes to {}", dest.display()));
                Ok(log)
            }
            Err(e) => Err(StepFailure::new(log, e)),
        }
    }

    async fn stream_to_file(&self, url: &str, dest: &Path) -> ManagerResult<u64> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ManagerError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut written = 0_u64;
        // Scope the handle so it is closed before extraction opens the file (Windows OS Error 32).
        {
            let mut file = tokio::fs::File::create(dest)
                .await
                .map_err(|source| ManagerError::io(dest, source))?;

            let mut stream = response.bytes_stream();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                file.write_all(&chunk)
                    .await
                    .map_err(|source| ManagerError::io(dest, source))?;
                written = written.saturating_add(chunk.len() as u64);
            }

            file.flush()
                .await
                .map_err(|source| ManagerError::io(dest, source))?;
        }

        debug!("Downloaded: {} -> {:?}", url, dest);
        Ok(written)
    }

    // ── Extraction ──────────────────────────────────────

    /// Extract `archive` into the existing directory `dest` on the blocking pool.
    pub async fn extract(&self, archive: &Path, dest: &Path) -> StepResult {
        let archive: PathBuf = archive.to_path_buf();
        let dest: PathBuf = dest.to_path_buf();
        let log = vec![format!(
            "Extracting {} to {}",
            archive.display(),
            dest.display()
        )];

        let joined = tokio::task::spawn_blocking(move || extract_archive(&archive, &dest)).await;
        match joined {
            Ok(Ok(lines)) => Ok(log.into_iter().chain(lines).collect()),
            Ok(Err(mut failure)) => {
                let mut full = log;
                full.append(&mut failure.log);
                failure.log = full;
                Err(failure)
            }
            Err(e) => Err(StepFailure::new(
                log,
                ManagerError::Other(format!("Task join error: {e}")),
            )),
        }
    }
}
