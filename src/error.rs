//! Error types for snapdl

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for snapdl operations
#[derive(Debug, Error)]
pub enum SnapError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The expected JavaScript marker was not found in a page
    #[error("Extraction error: {0}")]
    ExtractionError(String),

    /// The obfuscated payload was found but its tokens are malformed
    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("Blank data")]
    BlankData,

    #[error("No download links found")]
    NoDownloadLinks,

    #[error("No photos found. This might be a video-only post.")]
    NoPhotos,

    #[error("No media found to download.")]
    NoMedia,

    #[error("YouTube error: {0}")]
    YouTubeError(String),

    #[error("HTTP status {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Regex error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

impl SnapError {
    /// Check if error came out of the payload decoder
    pub fn is_decoder_error(&self) -> bool {
        matches!(
            self,
            SnapError::ExtractionError(_) | SnapError::DecodeError(_)
        )
    }

    /// Message shown to end users.
    ///
    /// Scraper internals never leak: decoder, HTTP and parse failures all
    /// collapse into one generic message.
    pub fn user_message(&self) -> String {
        match self {
            SnapError::InvalidUrl(_) => "Invalid URL".to_string(),
            SnapError::BlankData => "Blank data".to_string(),
            SnapError::NoDownloadLinks | SnapError::NoPhotos | SnapError::NoMedia => {
                self.to_string()
            }
            SnapError::YouTubeError(msg) => format!("YouTube download failed: {}", msg),
            _ => "Something went wrong".to_string(),
        }
    }
}

/// `{success, message, data}` envelope used for JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

impl<T> From<Result<T, SnapError>> for ApiResponse<T> {
    fn from(result: Result<T, SnapError>) -> Self {
        match result {
            Ok(data) => ApiResponse::ok(data),
            Err(e) => ApiResponse::failure(e.user_message()),
        }
    }
}
