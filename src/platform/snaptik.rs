//! TikTok through snaptik.app

use crate::core::metadata::{clean_description, clean_title};
use crate::core::quality::{is_photo_label, tiktok_link_quality};
use crate::core::{Media, MediaData, MediaKind};
use crate::error::SnapError;
use crate::platform::decoder::decrypt_snaptik;
use crate::platform::dom::{first_non_empty, Document};
use crate::platform::{byline, form_token, Extractor, HttpClient};
use crate::utils::{normalize_url, Platform};
use tracing::{debug, info};

const DEFAULT_TITLE: &str = "TikTok Video";

/// Extractor backed by snaptik.app
pub struct SnaptikExtractor {
    http: HttpClient,
    base_url: String,
}

impl SnaptikExtractor {
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Anti-bot token from the home page form, if it has one
    async fn fetch_token(&self) -> Result<Option<String>, SnapError> {
        let home = format!("{}/", self.base_url);
        let html = self.http.get_html(&home, None).await?;
        let token = form_token(&html);
        debug!("snaptik token present: {}", token.is_some());
        Ok(token)
    }
}

#[async_trait::async_trait]
impl Extractor for SnaptikExtractor {
    fn name(&self) -> &'static str {
        "snaptik"
    }

    fn supports(&self, platform: Platform) -> bool {
        platform == Platform::TikTok
    }

    async fn extract(&self, url: &str, _platform: Platform) -> Result<MediaData, SnapError> {
        info!("Resolving TikTok post through snaptik");
        let token = self.fetch_token().await?;

        let normalized = normalize_url(url);
        let mut form = vec![("url", normalized.as_str())];
        if let Some(token) = token.as_deref() {
            form.push(("token", token));
        }

        let endpoint = format!("{}/abc2.php", self.base_url);
        let page = self.http.post_form(&endpoint, &form, &self.base_url).await?;
        let html = decrypt_snaptik(&page)?;
        Ok(parse_download_page(&html))
    }
}

/// Build the single TikTok item from a decoded snaptik page.
///
/// The item is returned even when no anchor qualifies; its URL is then
/// `None` and its quality 0.
pub fn parse_download_page(html: &str) -> MediaData {
    let doc = Document::parse(html);

    let mut links: Vec<(String, u32, MediaKind)> = doc
        .select("a")
        .iter()
        .filter_map(|anchor| {
            let href = anchor.attr("href")?;
            let wanted = href.contains("snaptik")
                || href.contains("tikmate")
                || href.contains("download")
                || anchor.has_class("download-file");
            if !wanted {
                return None;
            }

            let label = anchor.text();
            let kind = if is_photo_label(&label) {
                MediaKind::Image
            } else {
                MediaKind::Video
            };
            Some((href.to_string(), tiktok_link_quality(&label), kind))
        })
        .collect();
    links.sort_by(|a, b| b.1.cmp(&a.1));
    debug!("snaptik offered {} links", links.len());

    let description = first_non_empty(vec![
        doc.text(".video-title"),
        doc.text(".video-des"),
        doc.first_text("h3"),
        doc.text(".desc"),
        doc.text(".video-description"),
        doc.first_text("p"),
        doc.text(".title"),
    ])
    .unwrap_or_default();

    let title = clean_title(&description, Platform::TikTok);
    let (duration, author) = byline(&doc);
    let title = if title.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        title
    };
    let description = clean_description(&description, Platform::TikTok);
    let description = if description.chars().count() < 3 {
        DEFAULT_TITLE.to_string()
    } else {
        description
    };

    let preview = doc
        .attr("#thumbnail", "src")
        .or_else(|| doc.attr("img[src*='tiktok']", "src"))
        .or_else(|| doc.attr(".video-thumb img", "src"))
        .or_else(|| doc.attr("img", "src"));

    let (url, quality, kind) = match links.into_iter().next() {
        Some((href, quality, kind)) => (Some(href), quality, kind),
        None => (None, 0, MediaKind::Video),
    };

    let mut item = Media::new(url, kind).with_quality(quality);
    item.title = Some(title.clone());
    item.duration = duration.clone();
    item.author = author.clone();
    item.thumbnail = preview.clone();

    MediaData {
        title: Some(title),
        description: Some(description),
        preview: preview.clone(),
        duration,
        author,
        thumbnail: preview,
        media: vec![item],
    }
}
