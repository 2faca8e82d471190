//! Facebook and Instagram through snapsave.app
//!
//! The `action.php` reply is an obfuscated script (see [`decoder`]) whose
//! payload is one of several HTML layouts: a resolution table, a grid of
//! cards (Instagram carousels), a bare figure with links, or a list of
//! `download-items`.
//!
//! [`decoder`]: crate::platform::decoder

use crate::core::metadata::{capitalize, clean_description, clean_title, fallback_title};
use crate::core::quality::{card_quality, download_item_quality, is_photo_label, quality_score};
use crate::core::{Media, MediaData, MediaKind};
use crate::error::SnapError;
use crate::platform::decoder::decrypt_snapsave;
use crate::platform::dom::{first_non_empty, Document};
use crate::platform::{byline, Extractor, HttpClient};
use crate::utils::{fix_thumbnail, normalize_url, Platform};
use regex::Regex;
use tracing::{debug, info};

/// Extractor backed by snapsave.app
pub struct SnapsaveExtractor {
    http: HttpClient,
    base_url: String,
}

impl SnapsaveExtractor {
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait::async_trait]
impl Extractor for SnapsaveExtractor {
    fn name(&self) -> &'static str {
        "snapsave"
    }

    fn supports(&self, platform: Platform) -> bool {
        matches!(platform, Platform::Facebook | Platform::Instagram)
    }

    async fn extract(&self, url: &str, platform: Platform) -> Result<MediaData, SnapError> {
        let endpoint = format!("{}/action.php?lang=en", self.base_url);
        let normalized = normalize_url(url);
        info!("Resolving {} post through snapsave", platform);

        let page = self
            .http
            .post_form(&endpoint, &[("url", normalized.as_str())], &self.base_url)
            .await?;
        let html = decrypt_snapsave(&page)?;
        parse_download_section(&html, platform, &self.base_url)
    }
}

/// Turn a decoded snapsave download section into media.
///
/// Instagram keeps every item; Facebook keeps only the best one.
pub fn parse_download_section(
    html: &str,
    platform: Platform,
    base_url: &str,
) -> Result<MediaData, SnapError> {
    let doc = Document::parse(html);
    let keep_all = platform == Platform::Instagram;
    let mut data = MediaData::default();

    let media = if doc.exists("table.table") || doc.exists("article.media > figure") {
        if keep_all && doc.count("div.card") > 1 {
            let items = carousel_items(&doc, base_url);
            if !items.is_empty() {
                debug!("Instagram carousel with {} items", items.len());
                return Ok(MediaData {
                    media: items,
                    ..Default::default()
                });
            }
        }

        fill_metadata(&doc, platform, &mut data);

        if doc.exists("table.table") {
            select_items(table_items(&doc, platform, &data, base_url), keep_all)
        } else if doc.exists("div.card") {
            select_items(card_items(&doc, &data), keep_all)
        } else {
            vec![fallback_item(&doc)]
        }
    } else if doc.exists("div.download-items") {
        select_items(download_items(&doc, &data), keep_all)
    } else {
        Vec::new()
    };

    if media.is_empty() {
        return Err(SnapError::BlankData);
    }

    data.media = media;
    Ok(data)
}

fn fill_metadata(doc: &Document, platform: Platform, data: &mut MediaData) {
    let description = first_non_empty(vec![
        doc.text("span.video-des"),
        doc.text(".video-title"),
        doc.first_text("h1"),
        doc.first_text("h2"),
        doc.first_text("h3"),
        doc.text(".title"),
        doc.text(".desc"),
        doc.text(".video-description"),
        doc.first_text("p"),
        doc.attr("meta[property='og:title']", "content")
            .unwrap_or_default(),
        doc.text("title"),
    ])
    .unwrap_or_default();

    let title = clean_title(&description, platform);
    let (duration, author) = byline(doc);
    let description = clean_description(&description, platform);

    let preview = doc
        .attr("article.media > figure img", "src")
        .or_else(|| doc.attr("img[src*='fbcdn']", "src"))
        .or_else(|| doc.attr("img[src*='instagram']", "src"))
        .or_else(|| doc.attr(".video-preview img", "src"))
        .or_else(|| doc.attr("img", "src"));

    data.title = Some(if title.is_empty() {
        fallback_title(platform)
    } else {
        title
    });
    data.description = Some(if description.chars().count() >= 3 {
        description
    } else {
        format!("{} Video", capitalize(platform.key()))
    });
    data.duration = duration;
    data.author = author;
    data.preview = preview.clone();
    data.thumbnail = preview;
}

fn table_items(doc: &Document, platform: Platform, data: &MediaData, base_url: &str) -> Vec<Media> {
    doc.select("tbody > tr")
        .iter()
        .map(|row| {
            let cells = row.find_all("td");
            let resolution = cells.first().map(|cell| cell.text()).unwrap_or_default();

            let mut link = cells.get(2).and_then(|cell| {
                cell.find("a")
                    .and_then(|a| a.attr("href"))
                    .or_else(|| cell.find("button").and_then(|b| b.attr("onclick")))
                    .map(str::to_string)
            });

            let should_render = link
                .as_deref()
                .map_or(false, |l| l.to_lowercase().contains("get_progressapi"));
            if should_render {
                if let Some(rewritten) = link.as_deref().and_then(|l| progress_api_url(l, base_url))
                {
                    link = Some(rewritten);
                }
            }

            let kind = if platform == Platform::Instagram {
                let row_text = row.text().to_lowercase();
                if row_text.contains("photo") || row_text.contains("image") || resolution.is_empty()
                {
                    MediaKind::Image
                } else {
                    MediaKind::Video
                }
            } else if resolution.is_empty() {
                MediaKind::Image
            } else {
                MediaKind::Video
            };

            let mut item = Media::new(link.map(|l| collapse_dl(&l)), kind)
                .with_quality(quality_score(&resolution))
                .with_metadata(data);
            item.resolution = Some(resolution);
            item.should_render = should_render;
            item
        })
        .collect()
}

fn card_items(doc: &Document, data: &MediaData) -> Vec<Media> {
    doc.select("div.card")
        .iter()
        .map(|card| {
            let label = card.find_text("div.card-body a");
            let link = card
                .find("div.card-body a")
                .and_then(|a| a.attr("href"))
                .map(collapse_dl);
            let kind = if label.contains("Photo") {
                MediaKind::Image
            } else {
                MediaKind::Video
            };

            Media::new(link, kind)
                .with_quality(card_quality(&label, 360))
                .with_metadata(data)
        })
        .collect()
}

fn carousel_items(doc: &Document, base_url: &str) -> Vec<Media> {
    doc.select("div.card")
        .iter()
        .filter_map(|card| {
            let label = card.find_text("div.card-body a");
            let mut link = card
                .find("div.card-body a")
                .and_then(|a| a.attr("href"))?
                .to_string();

            if link.contains("get_progressApi") {
                if let Some(rewritten) = progress_api_url(&link, base_url) {
                    link = rewritten;
                }
            }
            if !link.starts_with("http") {
                return None;
            }

            let kind = if label.contains("Photo") {
                MediaKind::Image
            } else {
                MediaKind::Video
            };
            let mut item = Media::new(Some(link), kind).with_quality(card_quality(&label, 500));
            item.title = Some("Instagram Photo".to_string());
            Some(item)
        })
        .collect()
}

fn download_items(doc: &Document, data: &MediaData) -> Vec<Media> {
    doc.select("div.download-items")
        .iter()
        .map(|entry| {
            let thumbnail = entry
                .find("div.download-items__thumb > img")
                .and_then(|img| img.attr("src"));
            let label = entry.find_text("div.download-items__btn span");
            let link = entry
                .find("div.download-items__btn a")
                .and_then(|a| a.attr("href"))
                .map(collapse_dl);
            let kind = if label.contains("Photo") {
                MediaKind::Image
            } else {
                MediaKind::Video
            };

            let quality = download_item_quality(&label, link.as_deref());
            let mut item = Media::new(link, kind).with_quality(quality);
            item.title = data.title.clone();
            item.duration = data.duration.clone();
            item.author = data.author.clone();
            if kind == MediaKind::Video {
                item.thumbnail = thumbnail.map(fix_thumbnail);
            }
            item
        })
        .collect()
}

fn fallback_item(doc: &Document) -> Media {
    let link = doc
        .attr("a[href*='download']", "href")
        .or_else(|| doc.attr("a", "href"))
        .or_else(|| doc.attr("button", "onclick"))
        .or_else(|| {
            doc.select("a")
                .iter()
                .filter_map(|a| a.attr("href"))
                .find(|href| {
                    href.contains("download") || href.contains("snapsave") || href.contains("rapidcdn")
                })
                .map(str::to_string)
        });

    let label = first_non_empty(vec![doc.text("a"), doc.text("button")]).unwrap_or_default();
    let kind = if is_photo_label(&label) {
        MediaKind::Image
    } else {
        MediaKind::Video
    };
    Media::new(link, kind)
}

fn select_items(mut items: Vec<Media>, keep_all: bool) -> Vec<Media> {
    items.sort_by(|a, b| b.quality.cmp(&a.quality));
    if !keep_all {
        items.truncate(1);
    }
    items
}

/// Resolve a `get_progressApi('/path')` handler onto the snapsave host
fn progress_api_url(handler: &str, base_url: &str) -> Option<String> {
    let re = Regex::new(r"get_progressApi\('(.*?)'\)").ok()?;
    let path = re.captures(handler)?.get(1)?.as_str();
    Some(format!("{}{}", base_url, path))
}

fn collapse_dl(link: &str) -> String {
    link.replacen("&dl=1&dl=1", "&dl=1", 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::decoder::test_support::obfuscated_page;
    use crate::platform::decoder::FragmentMarker;
    use mockito::Matcher;

    const BASE: &str = "https://snapsave.app";

    const TABLE_PAGE: &str = r#"
        <article class="media"><figure><img src="https://scontent.fbcdn.net/thumb.jpg"></figure></article>
        <span class="video-des">Facebook:   Birthday party</span>
        <table class="table"><tbody>
          <tr><td>720p (HD)</td><td>yes</td><td><a href="https://d.rapidcdn.app/v?token=a&dl=1&dl=1">Download</a></td></tr>
          <tr><td>1080p</td><td>no</td><td><button onclick="get_progressApi('/render.php?token=b')">Render</button></td></tr>
          <tr><td>360p (SD)</td><td>yes</td><td><a href="https://d.rapidcdn.app/v?token=c">Download</a></td></tr>
        </tbody></table>
    "#;

    #[test]
    fn test_facebook_table_keeps_best() {
        let data = parse_download_section(TABLE_PAGE, Platform::Facebook, BASE).unwrap();

        assert_eq!(data.title.as_deref(), Some("Birthday party"));
        assert_eq!(data.description.as_deref(), Some("Birthday party"));
        assert_eq!(
            data.thumbnail.as_deref(),
            Some("https://scontent.fbcdn.net/thumb.jpg")
        );
        assert_eq!(data.media.len(), 1);

        let best = &data.media[0];
        // "720p (HD)" scores as 1080 because of the HD marker, ahead of 1080p by order
        assert_eq!(best.quality, 1080);
        assert_eq!(best.kind, MediaKind::Video);
        assert_eq!(best.url.as_deref(), Some("https://d.rapidcdn.app/v?token=a&dl=1"));
        assert_eq!(best.title.as_deref(), Some("Birthday party"));
    }

    #[test]
    fn test_instagram_table_keeps_all_sorted() {
        let data = parse_download_section(TABLE_PAGE, Platform::Instagram, BASE).unwrap();
        assert_eq!(data.media.len(), 3);

        let rendered = data.media.iter().find(|m| m.should_render).unwrap();
        assert_eq!(
            rendered.url.as_deref(),
            Some("https://snapsave.app/render.php?token=b")
        );
        assert_eq!(rendered.resolution.as_deref(), Some("1080p"));

        let qualities: Vec<u32> = data.media.iter().map(|m| m.quality).collect();
        assert_eq!(qualities, vec![1080, 1080, 480]);
    }

    #[test]
    fn test_instagram_carousel() {
        let page = r#"
            <article class="media"><figure><img src="https://x/p.jpg"></figure></article>
            <div class="card"><div class="card-body"><a href="https://cdn.snapsave.app/1.jpg">Download Photo</a></div></div>
            <div class="card"><div class="card-body"><a href="get_progressApi('/render.php?id=2')">Download HD</a></div></div>
            <div class="card"><div class="card-body"><a href="javascript:void(0)">Broken</a></div></div>
        "#;

        let data = parse_download_section(page, Platform::Instagram, BASE).unwrap();
        assert_eq!(data.media.len(), 2);
        assert_eq!(data.media[0].kind, MediaKind::Image);
        assert_eq!(data.media[0].quality, 500);
        assert_eq!(data.media[0].title.as_deref(), Some("Instagram Photo"));
        assert_eq!(
            data.media[1].url.as_deref(),
            Some("https://snapsave.app/render.php?id=2")
        );
        assert_eq!(data.media[1].quality, 1000);
        assert!(data.title.is_none());
    }

    #[test]
    fn test_cards_on_facebook() {
        let page = r#"
            <article class="media"><figure><img src="https://x/p.jpg"></figure></article>
            <h3>Share: Goal of the season</h3>
            <div class="card"><div class="card-body"><a href="https://cdn/sd.mp4">Download 480</a></div></div>
            <div class="card"><div class="card-body"><a href="https://cdn/hd.mp4&dl=1&dl=1">Download 720</a></div></div>
        "#;

        let data = parse_download_section(page, Platform::Facebook, BASE).unwrap();
        assert_eq!(data.title.as_deref(), Some("Goal of the season"));
        assert_eq!(data.media.len(), 1);
        assert_eq!(data.media[0].quality, 720);
        assert_eq!(data.media[0].url.as_deref(), Some("https://cdn/hd.mp4&dl=1"));
    }

    #[test]
    fn test_download_items() {
        let page = r#"
            <div class="download-items">
              <div class="download-items__thumb"><img src="https://snapinsta.app/photo.php?photo=https%3A%2F%2Fcdn%2Ft.jpg"></div>
              <div class="download-items__btn"><a href="https://cdn/v.mp4">x</a><span>Download Video</span></div>
            </div>
            <div class="download-items">
              <div class="download-items__thumb"><img src="https://cdn/p.jpg"></div>
              <div class="download-items__btn"><a href="https://cdn/p.jpg">x</a><span>Download Photo</span></div>
            </div>
        "#;

        let data = parse_download_section(page, Platform::Instagram, BASE).unwrap();
        assert_eq!(data.media.len(), 2);

        let video = data.media.iter().find(|m| m.kind == MediaKind::Video).unwrap();
        assert_eq!(video.thumbnail.as_deref(), Some("https://cdn/t.jpg"));
        assert_eq!(video.quality, 360);

        let photo = data.media.iter().find(|m| m.kind == MediaKind::Image).unwrap();
        assert!(photo.thumbnail.is_none());
    }

    #[test]
    fn test_bare_figure_falls_back_to_first_link() {
        let page = r#"
            <article class="media"><figure><img src="https://x/p.jpg"></figure></article>
            <a href="https://d.rapidcdn.app/download?id=9">Download Photo</a>
        "#;

        let data = parse_download_section(page, Platform::Facebook, BASE).unwrap();
        assert_eq!(data.media.len(), 1);
        assert_eq!(data.media[0].kind, MediaKind::Image);
        assert_eq!(
            data.media[0].url.as_deref(),
            Some("https://d.rapidcdn.app/download?id=9")
        );
        assert_eq!(data.description.as_deref(), Some("Facebook Video"));
    }

    #[test]
    fn test_unknown_layout_is_blank() {
        let err = parse_download_section("<div>Sorry</div>", Platform::Facebook, BASE).unwrap_err();
        assert!(matches!(err, SnapError::BlankData));
        assert_eq!(err.user_message(), "Blank data");
    }

    #[tokio::test]
    async fn test_extract_through_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let body = obfuscated_page(FragmentMarker::DownloadSection.assignment(), TABLE_PAGE);
        let mock = server
            .mock("POST", "/action.php")
            .match_query(Matcher::UrlEncoded("lang".into(), "en".into()))
            .match_body(Matcher::UrlEncoded(
                "url".into(),
                "https://www.facebook.com/watch?v=123456".into(),
            ))
            .with_body(body)
            .create_async()
            .await;

        let extractor = SnapsaveExtractor::new(HttpClient::new().unwrap(), server.url());
        assert!(extractor.supports(Platform::Facebook));
        assert!(!extractor.supports(Platform::TikTok));

        let data = extractor
            .extract("https://facebook.com/watch?v=123456", Platform::Facebook)
            .await
            .unwrap();
        assert_eq!(data.media.len(), 1);
        assert_eq!(data.title.as_deref(), Some("Birthday party"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_extract_rejects_unobfuscated_reply() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/action.php")
            .match_query(Matcher::Any)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let extractor = SnapsaveExtractor::new(HttpClient::new().unwrap(), server.url());
        let err = extractor
            .extract("https://www.instagram.com/p/abc/", Platform::Instagram)
            .await
            .unwrap_err();
        assert!(err.is_decoder_error());
        assert_eq!(err.user_message(), "Something went wrong");
    }
}
