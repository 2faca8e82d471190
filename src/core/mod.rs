//! Core functionality for snapdl

pub mod downloader;
pub mod media;
pub mod metadata;
pub mod quality;

pub use downloader::*;
pub use media::*;
