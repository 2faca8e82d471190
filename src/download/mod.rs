//! Saving resolved media to disk

pub mod downloader;
pub mod progress;

pub use downloader::*;
pub use progress::*;
