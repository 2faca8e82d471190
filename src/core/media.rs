//! Media descriptions returned by the extractors and the downloader facade

use crate::core::quality::quality_label;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a downloadable item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Video,
    Image,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Image => "image",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One downloadable item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    /// Link must be rendered server-side before it downloads
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub should_render: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub quality: u32,
    pub quality_label: String,
}

impl Media {
    pub fn new(url: Option<String>, kind: MediaKind) -> Self {
        Self {
            url,
            kind,
            quality_label: quality_label(0).to_string(),
            ..Default::default()
        }
    }

    /// Set the quality score and its label
    pub fn with_quality(mut self, quality: u32) -> Self {
        self.quality = quality;
        self.quality_label = quality_label(quality).to_string();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.quality_label = label.into();
        self
    }

    /// Copy title, duration, author and thumbnail from the page metadata
    pub fn with_metadata(mut self, data: &MediaData) -> Self {
        self.title = data.title.clone();
        self.duration = data.duration.clone();
        self.author = data.author.clone();
        self.thumbnail = data.thumbnail.clone();
        self
    }

    /// Check if the URL can be fetched directly
    pub fn has_http_url(&self) -> bool {
        self.url
            .as_deref()
            .map_or(false, |url| url.starts_with("http"))
    }
}

/// Everything an extractor found for one source URL
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub media: Vec<Media>,
}

impl MediaData {
    /// Highest quality item, preferring videos over images
    pub fn best_media(&self) -> Option<&Media> {
        let mut sorted: Vec<&Media> = self.media.iter().collect();
        sorted.sort_by(|a, b| b.quality.cmp(&a.quality));

        sorted
            .iter()
            .find(|m| m.kind == MediaKind::Video)
            .or_else(|| sorted.first())
            .copied()
    }

    pub fn images(&self) -> impl Iterator<Item = &Media> {
        self.media.iter().filter(|m| m.kind == MediaKind::Image)
    }

    pub fn videos(&self) -> impl Iterator<Item = &Media> {
        self.media.iter().filter(|m| m.kind == MediaKind::Video)
    }
}

/// Best item of a source plus the metadata needed to save it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedMedia {
    pub title: String,
    pub description: String,
    pub duration: String,
    pub author: String,
    pub thumbnail: String,
    pub preview: String,
    pub download_url: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub quality: u32,
    pub quality_label: String,
    pub filename: String,
    pub platform: String,
}

/// Photo entry of a bulk listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoItem {
    pub url: String,
    pub filename: String,
    /// 1-based position among the photos
    pub index: usize,
    pub quality: u32,
    pub thumbnail: String,
}

/// Video entry of a bulk listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoItem {
    pub url: String,
    pub filename: String,
    pub index: usize,
    pub quality: u32,
    pub thumbnail: String,
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoCollection {
    pub title: String,
    pub description: String,
    pub author: String,
    pub total_photos: usize,
    pub photos: Vec<PhotoItem>,
    pub zip_filename: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaCollection {
    pub title: String,
    pub description: String,
    pub author: String,
    pub total_items: usize,
    pub photos: Vec<PhotoItem>,
    pub videos: Vec<VideoItem>,
    pub zip_filename: String,
}

/// Outcome of a batch of enhanced downloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub successful: Vec<EnhancedMedia>,
    pub failed: usize,
}

impl BatchResult {
    /// Summary line, present only when something failed
    pub fn message(&self) -> Option<String> {
        (self.failed > 0).then(|| format!("{} downloads failed", self.failed))
    }
}
