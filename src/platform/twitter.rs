//! Twitter/X through twitterdownloader.snapsave.app
//!
//! Unlike its sibling sites this front-end answers with plain JSON
//! carrying the result HTML, so no payload decoding is involved.

use crate::core::metadata::{clean_description, clean_title};
use crate::core::quality::{is_photo_label, twitter_link_quality};
use crate::core::{Media, MediaData, MediaKind};
use crate::error::SnapError;
use crate::platform::dom::{first_non_empty, Document};
use crate::platform::{byline, form_token, Extractor, HttpClient};
use crate::utils::{normalize_url, Platform};
use serde::Deserialize;
use tracing::{debug, info};

const DEFAULT_TITLE: &str = "Twitter/X Post";

#[derive(Debug, Deserialize)]
struct ActionReply {
    #[serde(default)]
    data: Option<String>,
}

/// Extractor backed by the snapsave Twitter front-end
pub struct TwitterExtractor {
    http: HttpClient,
    base_url: String,
}

impl TwitterExtractor {
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait::async_trait]
impl Extractor for TwitterExtractor {
    fn name(&self) -> &'static str {
        "twitter"
    }

    fn supports(&self, platform: Platform) -> bool {
        platform == Platform::Twitter
    }

    async fn extract(&self, url: &str, _platform: Platform) -> Result<MediaData, SnapError> {
        info!("Resolving Twitter/X post");
        let home = self
            .http
            .get_html(&format!("{}/", self.base_url), None)
            .await?;
        let token = form_token(&home);

        let normalized = normalize_url(url);
        let mut form = vec![("url", normalized.as_str())];
        if let Some(token) = token.as_deref() {
            form.push(("token", token));
        }

        let endpoint = format!("{}/action.php", self.base_url);
        let reply: ActionReply = self
            .http
            .post_form_json(&endpoint, &form, &self.base_url)
            .await?;
        Ok(parse_result_html(reply.data.as_deref().unwrap_or_default()))
    }
}

/// Build the single Twitter/X item from the result HTML
pub fn parse_result_html(html: &str) -> MediaData {
    let doc = Document::parse(html);

    let mut links: Vec<(String, u32, MediaKind)> = doc
        .select("a")
        .iter()
        .filter_map(|anchor| {
            let href = anchor.attr("href")?;
            if !(href.contains("download") || href.contains("rapidcdn") || href.contains("snapsave"))
            {
                return None;
            }

            let label = anchor.text();
            let kind = if is_photo_label(&label) {
                MediaKind::Image
            } else {
                MediaKind::Video
            };
            Some((href.to_string(), twitter_link_quality(&label, href), kind))
        })
        .collect();
    links.sort_by(|a, b| b.1.cmp(&a.1));
    debug!("twitter front-end offered {} links", links.len());

    let description = first_non_empty(vec![
        doc.text(".videotikmate-middle > p > span"),
        doc.text(".video-title"),
        doc.first_text("p"),
        doc.text(".desc"),
        doc.text("h3"),
    ])
    .unwrap_or_default();

    let title = clean_title(&description, Platform::Twitter);
    let title = if title.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        title
    };
    let description = clean_description(&description, Platform::Twitter);
    let description = if description.chars().count() < 3 {
        DEFAULT_TITLE.to_string()
    } else {
        description
    };
    let (duration, author) = byline(&doc);

    let preview = doc
        .attr(".videotikmate-left > img", "src")
        .or_else(|| doc.attr("img[src*='pbs.twimg']", "src"))
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
