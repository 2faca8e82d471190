//! Streaming file downloader

use crate::download::progress::Progress;
use crate::error::SnapError;
use crate::platform::HttpClient;
use crate::utils::generate_unique_filename;
use futures_util::StreamExt;
use reqwest::Method;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Callback invoked after every received chunk
pub type ProgressCallback = Arc<dyn Fn(&Progress) + Send + Sync>;

/// Downloads media URLs to disk through a temporary file
#[derive(Clone)]
pub struct FileDownloader {
    http: HttpClient,
    progress_callback: Option<ProgressCallback>,
}

impl FileDownloader {
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            progress_callback: None,
        }
    }

    /// Set progress callback
    pub fn with_progress_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Progress) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    /// Save `url` under `dir`, numbering the name if it is taken
    pub async fn download_to_dir(
        &self,
        url: &str,
        dir: &Path,
        filename: &str,
    ) -> Result<PathBuf, SnapError> {
        tokio::fs::create_dir_all(dir).await?;
        let filename = generate_unique_filename(dir, filename)?;
        let output_path = dir.join(filename);
        self.download(url, &output_path).await?;
        Ok(output_path)
    }

    /// Stream `url` into `output_path` and return the byte count.
    ///
    /// Data lands in a `.tmp` sibling first and is renamed into place only
    /// after the body has been read completely.
    pub async fn download(&self, url: &str, output_path: &Path) -> Result<u64, SnapError> {
        info!("Starting download from URL: {}", url);
        let tmp_path = output_path.with_extension("tmp");
        let mut file = File::create(&tmp_path).await?;

        match self.stream_to(url, &mut file).await {
            Ok(bytes) => {
                file.flush().await?;
                drop(file);
                tokio::fs::rename(&tmp_path, output_path).await?;
                info!("Saved {} bytes to {}", bytes, output_path.display());
                Ok(bytes)
            }
            Err(e) => {
                warn!("Download failed: {}, cleaning up temp file", e);
                drop(file);
                let _ = tokio::fs::remove_file(&tmp_path).await;
                Err(e)
            }
        }
    }

    async fn stream_to(&self, url: &str, file: &mut File) -> Result<u64, SnapError> {
        let response = self
            .http
            .browser_request(Method::GET, url)
            .header("Accept", "*/*")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SnapError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let mut progress = Progress::new(response.content_length());
        let mut stream = response.bytes_stream();
        let mut downloaded = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;

            progress.update(downloaded);
            if let Some(callback) = &self.progress_callback {
                callback(&progress);
            }
        }
        file.sync_all().await?;

        if downloaded == 0 {
            return Err(SnapError::Generic("Empty download (0 bytes)".to_string()));
        }
        if progress.total.is_some() && !progress.is_complete() {
            return Err(SnapError::Generic(format!(
                "Incomplete download: {}",
                progress.summary()
            )));
        }
        debug!("Stream finished: {}", progress.summary());
        Ok(downloaded)
    }
}
