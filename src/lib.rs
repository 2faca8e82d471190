//! # snapdl - social media link resolver
//!
//! Turns a post URL from Facebook, Instagram, TikTok, Twitter/X or YouTube
//! into direct media links by scraping public download front-ends.
//!
//! ## Features
//!
//! - Decoder for the obfuscated scripts returned by snapsave and snaptik
//! - Quality ranking of every link a post offers
//! - Photo and mixed-media listings for carousels
//! - Cached lookups and batch resolution
//! - Streaming downloads with progress reporting
//!
//! ## Example
//!
//! ```rust,no_run
//! use snapdl::Downloader;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = Downloader::new()?;
//!
//!     let media = downloader
//!         .enhanced_download("https://www.tiktok.com/@user/video/123")
//!         .await?;
//!     println!("{}: {}", media.title, media.download_url);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod core;
pub mod download;
pub mod error;
pub mod platform;
pub mod utils;

// Re-export main types
pub use core::{DownloadOptions, Downloader, EnhancedMedia, Media, MediaData, MediaKind};
pub use error::{ApiResponse, SnapError};
pub use utils::Platform;

/// Result type alias for snapdl operations
pub type Result<T> = std::result::Result<T, SnapError>;
