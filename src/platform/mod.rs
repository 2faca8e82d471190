//! Site scrapers and the plumbing they share

pub mod client;
pub mod decoder;
pub mod dom;
pub mod snapsave;
pub mod snaptik;
pub mod twitter;
pub mod youtube;

pub use client::*;
pub use decoder::{decrypt_snapsave, decrypt_snaptik, FragmentMarker};
pub use snapsave::SnapsaveExtractor;
pub use snaptik::SnaptikExtractor;
pub use twitter::TwitterExtractor;
pub use youtube::{VideoFormat, YouTubeExtractor, YouTubeVideoInfo};

use crate::core::metadata::{extract_author, extract_duration, non_empty};
use crate::core::MediaData;
use crate::error::SnapError;
use crate::utils::Platform;
use dom::Document;

/// Source of media descriptions for one or more platforms
#[async_trait::async_trait]
pub trait Extractor: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    fn supports(&self, platform: Platform) -> bool;

    /// Resolve a post URL into its downloadable media
    async fn extract(&self, url: &str, platform: Platform) -> Result<MediaData, SnapError>;
}

/// Base URLs of the scraped front-ends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub snapsave: String,
    pub snaptik: String,
    pub twitter: String,
    pub youtube: String,
    pub y2mate: String,
    pub snapany: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            snapsave: "https://snapsave.app".to_string(),
            snaptik: "https://snaptik.app".to_string(),
            twitter: "https://twitterdownloader.snapsave.app".to_string(),
            youtube: "https://www.youtube.com".to_string(),
            y2mate: "https://www.y2mate.com".to_string(),
            snapany: "https://snapany.com".to_string(),
        }
    }
}

impl Endpoints {
    /// Point every front-end at one host
    pub fn all_at(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            snapsave: base.clone(),
            snaptik: base.clone(),
            twitter: base.clone(),
            youtube: base.clone(),
            y2mate: base.clone(),
            snapany: base,
        }
    }
}

/// Value of the hidden `token` input of a front-end's home page
pub(crate) fn form_token(html: &str) -> Option<String> {
    Document::parse(html).attr("input[name='token']", "value")
}

/// Duration and author from the usual `.duration` / `.author` blocks
pub(crate) fn byline(doc: &Document) -> (Option<String>, Option<String>) {
    let duration = dom::first_non_empty(vec![doc.text(".video-duration"), doc.text(".duration")])
        .map(|text| extract_duration(&text))
        .and_then(non_empty);
    let author = dom::first_non_empty(vec![doc.text(".author"), doc.text(".username")])
        .map(|text| extract_author(&text))
        .and_then(non_empty);
    (duration, author)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_token() {
        let html = r#"<form><input type="hidden" name="token" value="tok123"><input name="url"></form>"#;
        assert_eq!(form_token(html).as_deref(), Some("tok123"));
        assert_eq!(form_token("<form></form>"), None);
    }

    #[test]
    fn test_byline() {
        let doc = Document::parse(
            r#"<span class="duration">Length 1:05</span><div class="username">@clipper</div>"#,
        );
        assert_eq!(
            byline(&doc),
            (Some("1:05".to_string()), Some("clipper".to_string()))
        );
        assert_eq!(byline(&Document::parse("<p></p>")), (None, None));
    }

    #[test]
    fn test_endpoints() {
        let endpoints = Endpoints::default();
        assert_eq!(endpoints.snapsave, "https://snapsave.app");

        let local = Endpoints::all_at("http://127.0.0.1:1234/");
        assert_eq!(local.snaptik, "http://127.0.0.1:1234");
        assert_eq!(local.youtube, "http://127.0.0.1:1234");
    }
}
