//! YouTube video information
//!
//! Videos are not resolved to stream URLs. The watch page (or, failing
//! that, y2mate and snapany) only supplies title, author and duration; the
//! media list always offers the 720p watch link, the 480p embed link and
//! the max-resolution thumbnail.

use crate::core::metadata::format_duration;
use crate::core::{Media, MediaData, MediaKind};
use crate::error::SnapError;
use crate::platform::{Endpoints, Extractor, HttpClient};
use crate::utils::{extract_youtube_video_id, Platform};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

const CANONICAL_HOST: &str = "https://www.youtube.com";
const DEFAULT_AUTHOR: &str = "YouTube Creator";

/// Stream type of a listed format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    Video,
    Audio,
}

/// One download option found for a video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoFormat {
    pub url: String,
    /// Quality tag such as `720p` or `4K`
    pub quality: String,
    pub resolution: String,
    pub mime_type: String,
    #[serde(rename = "type")]
    pub kind: FormatKind,
}

impl VideoFormat {
    fn video(url: impl Into<String>, quality: &str, resolution: &str) -> Self {
        Self {
            url: url.into(),
            quality: quality.to_string(),
            resolution: resolution.to_string(),
            mime_type: "video/mp4".to_string(),
            kind: FormatKind::Video,
        }
    }

    /// Numeric rank of the quality tag, `4K` counting as 4000
    pub fn rank(&self) -> u32 {
        self.quality
            .replace('p', "")
            .replace('K', "000")
            .parse()
            .unwrap_or(0)
    }
}

/// What the info chain learned about a video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YouTubeVideoInfo {
    pub video_id: String,
    pub title: String,
    pub duration: String,
    pub author: String,
    pub thumbnail: String,
    pub description: String,
    pub formats: Vec<VideoFormat>,
}

impl YouTubeVideoInfo {
    /// Info used when every source failed
    pub fn fallback(video_id: &str) -> Self {
        Self {
            video_id: video_id.to_string(),
            title: format!("YouTube Video {}", video_id),
            duration: String::new(),
            author: DEFAULT_AUTHOR.to_string(),
            thumbnail: thumbnail_url(video_id),
            description: "Video information extraction failed, but thumbnail is available"
                .to_string(),
            formats: Vec::new(),
        }
    }

    /// Highest ranked format; the first one wins ties
    pub fn best_format(&self) -> Option<&VideoFormat> {
        self.formats
            .iter()
            .fold(None, |best: Option<&VideoFormat>, current| match best {
                Some(b) if current.rank() <= b.rank() => Some(b),
                _ => Some(current),
            })
    }

    pub fn watch_url(&self) -> String {
        watch_url(&self.video_id)
    }

    /// Convert into the fixed 720p / 480p / thumbnail listing
    pub fn into_media_data(self) -> MediaData {
        let thumbnail = thumbnail_url(&self.video_id);
        let duration = Some(self.duration.clone()).filter(|d| !d.is_empty());
        let author = Some(self.author.clone());

        let entry = |url: String, kind: MediaKind, suffix: &str, quality: u32, label: &str, resolution: &str, mime: &str| {
            let mut item = Media::new(Some(url), kind)
                .with_quality(quality)
                .with_label(label);
            item.title = Some(format!("{} - {}", self.title, suffix));
            item.duration = duration.clone();
            item.author = author.clone();
            item.thumbnail = Some(thumbnail.clone());
            item.resolution = Some(resolution.to_string());
            item.mime_type = Some(mime.to_string());
            item
        };

        let media = vec![
            entry(
                watch_url(&self.video_id),
                MediaKind::Video,
                "720p HD Quality",
                720,
                "720p HD",
                "1280x720",
                "video/mp4",
            ),
            entry(
                format!("{}/embed/{}", CANONICAL_HOST, self.video_id),
                MediaKind::Video,
                "480p Standard Quality",
                480,
                "480p Standard",
                "854x480",
                "video/mp4",
            ),
            entry(
                thumbnail.clone(),
                MediaKind::Image,
                "High Quality Thumbnail",
                1080,
                "Thumbnail (1080p)",
                "1920x1080",
                "image/jpeg",
            ),
        ];

        MediaData {
            title: Some(self.title.clone()),
            description: Some(
                "YouTube video download - 2 quality options available: 720p HD and 480p Standard. Plus high-quality thumbnail."
                    .to_string(),
            ),
            preview: Some(thumbnail.clone()),
            duration,
            author,
            thumbnail: Some(thumbnail),
            media,
        }
    }
}

/// Download-link aggregator a format list can be scraped from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSource {
    Y2mate,
    Snapany,
}

impl LinkSource {
    fn name(&self) -> &'static str {
        match self {
            LinkSource::Y2mate => "Y2Mate",
            LinkSource::Snapany => "Snapany",
        }
    }

    fn format_for(&self, url: &str, text: &str) -> VideoFormat {
        let mut format = match self {
            LinkSource::Y2mate => {
                if text.contains("4K") || text.contains("2160") {
                    VideoFormat::video(url, "4K", "3840x2160")
                } else if text.contains("1080") {
                    VideoFormat::video(url, "1080p", "1920x1080")
                } else if text.contains("480") {
                    VideoFormat::video(url, "480p", "854x480")
                } else if text.contains("360") {
                    VideoFormat::video(url, "360p", "640x360")
                } else {
                    VideoFormat::video(url, "720p", "1280x720")
                }
            }
            LinkSource::Snapany => {
                if text.contains("HD") || text.contains("1080") {
                    VideoFormat::video(url, "1080p", "1920x1080")
                } else if text.contains("480") {
                    VideoFormat::video(url, "480p", "854x480")
                } else {
                    VideoFormat::video(url, "720p", "1280x720")
                }
            }
        };

        if *self == LinkSource::Y2mate && text.contains("Audio") {
            format.kind = FormatKind::Audio;
            format.mime_type = "audio/mp3".to_string();
        }
        format
    }
}

/// YouTube extractor walking the page / y2mate / snapany chain
pub struct YouTubeExtractor {
    http: HttpClient,
    youtube: String,
    y2mate: String,
    snapany: String,
}

impl YouTubeExtractor {
    pub fn new(http: HttpClient, endpoints: &Endpoints) -> Self {
        Self {
            http,
            youtube: endpoints.youtube.trim_end_matches('/').to_string(),
            y2mate: endpoints.y2mate.trim_end_matches('/').to_string(),
            snapany: endpoints.snapany.trim_end_matches('/').to_string(),
        }
    }

    /// Gather video information, falling back source by source.
    ///
    /// Only an unparseable URL is an error; if every source fails the
    /// thumbnail-only [`YouTubeVideoInfo::fallback`] is returned.
    pub async fn video_info(&self, url: &str) -> Result<YouTubeVideoInfo, SnapError> {
        let video_id = extract_youtube_video_id(url)
            .map_err(|_| SnapError::YouTubeError("Invalid YouTube URL".to_string()))?;
        info!("Extracting info for YouTube video: {}", video_id);

        match self.from_watch_page(&video_id).await {
            Ok(info) => return Ok(info),
            Err(e) => warn!("YouTube page extraction failed: {}", e),
        }

        for source in [LinkSource::Y2mate, LinkSource::Snapany] {
            match self.from_link_source(&video_id, source).await {
                Ok(info) => return Ok(info),
                Err(e) => warn!("{} extraction failed: {}", source.name(), e),
            }
        }

        debug!("All YouTube sources failed, using thumbnail-only info");
        Ok(YouTubeVideoInfo::fallback(&video_id))
    }

    async fn from_watch_page(&self, video_id: &str) -> Result<YouTubeVideoInfo, SnapError> {
        let url = format!("{}/watch?v={}", self.youtube, video_id);
        let html = self.http.get_html(&url, None).await?;
        Ok(parse_watch_page(video_id, &html))
    }

    async fn from_link_source(
        &self,
        video_id: &str,
        source: LinkSource,
    ) -> Result<YouTubeVideoInfo, SnapError> {
        let html = match source {
            LinkSource::Y2mate => {
                let url = format!("{}/youtube/{}", self.y2mate, video_id);
                self.http.get_html(&url, None).await?
            }
            LinkSource::Snapany => {
                let url = format!("{}/youtube", self.snapany);
                let watch = watch_url(video_id);
                self.http
                    .post_form(&url, &[("url", watch.as_str())], &self.snapany)
                    .await?
            }
        };
        parse_link_page(video_id, &html, source)
    }
}

#[async_trait::async_trait]
impl Extractor for YouTubeExtractor {
    fn name(&self) -> &'static str {
        "youtube"
    }

    fn supports(&self, platform: Platform) -> bool {
        platform == Platform::YouTube
    }

    async fn extract(&self, url: &str, _platform: Platform) -> Result<MediaData, SnapError> {
        Ok(self.video_info(url).await?.into_media_data())
    }
}

/// Read title, duration, author and description out of a watch page
pub fn parse_watch_page(video_id: &str, html: &str) -> YouTubeVideoInfo {
    let title = capture(r"<title>([^<]+)</title>", html)
        .map(|t| t.replacen(" - YouTube", "", 1))
        .unwrap_or_else(|| format!("YouTube Video {}", video_id));
    let duration = capture(r#""lengthSeconds":"(\d+)""#, html)
        .and_then(|secs| secs.parse::<u64>().ok())
        .map(format_duration)
        .unwrap_or_default();
    let author =
        capture(r#""author":"([^"]+)""#, html).unwrap_or_else(|| DEFAULT_AUTHOR.to_string());
    let description = capture(r#""shortDescription":"([^"]+)""#, html)
        .unwrap_or_else(|| "Video description not available".to_string());

    YouTubeVideoInfo {
        video_id: video_id.to_string(),
        title,
        duration,
        author,
        thumbnail: thumbnail_url(video_id),
        description,
        formats: vec![
            VideoFormat::video(watch_url(video_id), "720p", "1280x720"),
            VideoFormat::video(
                format!("{}/embed/{}", CANONICAL_HOST, video_id),
                "480p",
                "854x480",
            ),
        ],
    }
}

/// Scrape `Download` anchors from an aggregator page
pub fn parse_link_page(
    video_id: &str,
    html: &str,
    source: LinkSource,
) -> Result<YouTubeVideoInfo, SnapError> {
    let link_re = RegexBuilder::new(r#"href="([^"]*download[^"]*)"[^>]*>([^<]*Download[^<]*)<"#)
        .case_insensitive(true)
        .build()?;

    let formats: Vec<VideoFormat> = link_re
        .captures_iter(html)
        .map(|caps| source.format_for(&caps[1], &caps[2]))
        .collect();

    if formats.is_empty() {
        return Err(SnapError::YouTubeError(format!(
            "No download links found on {}",
            source.name()
        )));
    }

    let title = match source {
        LinkSource::Y2mate => capture(r"<title>([^<]+)</title>", html)
            .map(|t| t.replacen(" - Y2mate.com", "", 1)),
        LinkSource::Snapany => None,
    }
    .unwrap_or_else(|| format!("YouTube Video {}", video_id));

    Ok(YouTubeVideoInfo {
        video_id: video_id.to_string(),
        title,
        duration: String::new(),
        author: DEFAULT_AUTHOR.to_string(),
        thumbnail: thumbnail_url(video_id),
        description: format!("Video download links extracted from {}", source.name()),
        formats,
    })
}

pub fn thumbnail_url(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{}/maxresdefault.jpg", video_id)
}

fn watch_url(video_id: &str) -> String {
    format!("{}/watch?v={}", CANONICAL_HOST, video_id)
}

fn capture(pattern: &str, text: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    Some(re.captures(text)?.get(1)?.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const VIDEO_ID: &str = "dQw4w9WgXcQ";

    const WATCH_PAGE: &str = r#"<html><head><title>Never Gonna Give You Up - YouTube</title></head>
        <script>var ytInitialPlayerResponse = {"videoDetails":{"videoId":"dQw4w9WgXcQ","lengthSeconds":"213","author":"Rick Astley","shortDescription":"The official video"}};</script>
        </html>"#;

    const Y2MATE_PAGE: &str = r#"<title>Some Clip - Y2mate.com</title>
        <a class="btn" href="https://dl.y2mate.com/download?f=720">Download 720p</a>
        <a class="btn" href="https://dl.y2mate.com/download?f=4k">Download 4K</a>
        <a class="btn" href="https://dl.y2mate.com/download?f=mp3">Download Audio</a>"#;

    #[test]
    fn test_parse_watch_page() {
        let info = parse_watch_page(VIDEO_ID, WATCH_PAGE);
        assert_eq!(info.title, "Never Gonna Give You Up");
        assert_eq!(info.duration, "3:33");
        assert_eq!(info.author, "Rick Astley");
        assert_eq!(info.description, "The official video");
        assert_eq!(info.formats.len(), 2);
        assert_eq!(info.best_format().unwrap().quality, "720p");
    }

    #[test]
    fn test_parse_watch_page_defaults() {
        let info = parse_watch_page(VIDEO_ID, "<html></html>");
        assert_eq!(info.title, "YouTube Video dQw4w9WgXcQ");
        assert_eq!(info.duration, "");
        assert_eq!(info.author, "YouTube Creator");
        assert_eq!(info.description, "Video description not available");
    }

    #[test]
    fn test_parse_y2mate_links() {
        let info = parse_link_page(VIDEO_ID, Y2MATE_PAGE, LinkSource::Y2mate).unwrap();
        assert_eq!(info.title, "Some Clip");
        assert_eq!(info.formats.len(), 3);

        let best = info.best_format().unwrap();
        assert_eq!(best.quality, "4K");
        assert_eq!(best.resolution, "3840x2160");

        let audio = &info.formats[2];
        assert_eq!(audio.kind, FormatKind::Audio);
        assert_eq!(audio.mime_type, "audio/mp3");
        assert_eq!(audio.quality, "720p");
    }

    #[test]
    fn test_parse_snapany_links() {
        let page = r#"<a href="/download/1">Download HD</a><a href="/download/2">download 480</a>"#;
        let info = parse_link_page(VIDEO_ID, page, LinkSource::Snapany).unwrap();
        assert_eq!(info.title, "YouTube Video dQw4w9WgXcQ");
        assert_eq!(info.formats[0].quality, "1080p");
        assert_eq!(info.formats[1].quality, "480p");

        let err = parse_link_page(VIDEO_ID, "<p>none</p>", LinkSource::Snapany).unwrap_err();
        assert_eq!(
            err.user_message(),
            "YouTube download failed: No download links found on Snapany"
        );
    }

    #[test]
    fn test_into_media_data() {
        let data = parse_watch_page(VIDEO_ID, WATCH_PAGE).into_media_data();

        assert_eq!(data.title.as_deref(), Some("Never Gonna Give You Up"));
        assert_eq!(
            data.thumbnail.as_deref(),
            Some("https://img.youtube.com/vi/dQw4w9WgXcQ/maxresdefault.jpg")
        );
        assert_eq!(data.media.len(), 3);

        let hd = &data.media[0];
        assert_eq!(hd.url.as_deref(), Some("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert_eq!(hd.quality_label, "720p HD");
        assert_eq!(hd.title.as_deref(), Some("Never Gonna Give You Up - 720p HD Quality"));
        assert_eq!(hd.resolution.as_deref(), Some("1280x720"));

        assert_eq!(
            data.media[1].url.as_deref(),
            Some("https://www.youtube.com/embed/dQw4w9WgXcQ")
        );

        let thumb = &data.media[2];
        assert_eq!(thumb.kind, MediaKind::Image);
        assert_eq!(thumb.quality, 1080);
        assert_eq!(thumb.mime_type.as_deref(), Some("image/jpeg"));

        // videos win over the higher-scored thumbnail
        assert_eq!(data.best_media().unwrap().quality, 720);
    }

    #[tokio::test]
    async fn test_chain_falls_through_to_y2mate() {
        let mut server = mockito::Server::new_async().await;
        let _watch = server
            .mock("GET", "/watch")
            .match_query(Matcher::UrlEncoded("v".into(), VIDEO_ID.into()))
            .with_status(429)
            .create_async()
            .await;
        let y2mate = server
            .mock("GET", "/youtube/dQw4w9WgXcQ")
            .with_body(Y2MATE_PAGE)
            .create_async()
            .await;

        let extractor =
            YouTubeExtractor::new(HttpClient::new().unwrap(), &Endpoints::all_at(&server.url()));
        let info = extractor
            .video_info("https://youtu.be/dQw4w9WgXcQ")
            .await
            .unwrap();
        assert_eq!(info.title, "Some Clip");
        y2mate.assert_async().await;
    }

    #[tokio::test]
    async fn test_chain_ends_in_fallback() {
        let mut server = mockito::Server::new_async().await;
        let _any = server
            .mock("GET", Matcher::Any)
            .with_status(500)
            .create_async()
            .await;
        let snapany = server
            .mock("POST", "/youtube")
            .match_body(Matcher::UrlEncoded(
                "url".into(),
                "https://www.youtube.com/watch?v=dQw4w9WgXcQ".into(),
            ))
            .with_body("<p>nothing</p>")
            .create_async()
            .await;

        let extractor =
            YouTubeExtractor::new(HttpClient::new().unwrap(), &Endpoints::all_at(&server.url()));
        let data = extractor
            .extract("https://www.youtube.com/watch?v=dQw4w9WgXcQ", Platform::YouTube)
            .await
            .unwrap();

        assert_eq!(data.title.as_deref(), Some("YouTube Video dQw4w9WgXcQ"));
        assert_eq!(data.author.as_deref(), Some("YouTube Creator"));
        assert_eq!(data.media.len(), 3);
        snapany.assert_async().await;
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let extractor = YouTubeExtractor::new(HttpClient::new().unwrap(), &Endpoints::default());
        let err = extractor
            .video_info("https://www.youtube.com/watch")
            .await
            .unwrap_err();
        assert!(matches!(err, SnapError::YouTubeError(_)));
        assert_eq!(err.user_message(), "YouTube download failed: Invalid YouTube URL");
    }
}
