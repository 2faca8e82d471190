//! URL classification and normalisation for the supported platforms

use crate::error::SnapError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

const FACEBOOK_PATTERN: &str = r"^https?://(?:www\.|web\.|m\.)?facebook\.com/(watch(\?v=|/\?v=)[0-9]+|reel/[0-9]+|[a-zA-Z0-9.\-_]+/(videos|posts)/[0-9]+|[0-9]+/(videos|posts)/[0-9]+|[a-zA-Z0-9]+/(videos|posts)/[0-9]+|share/(v|r)/[a-zA-Z0-9]+/?)([^/?#&]+).*$|^https://fb\.watch/[a-zA-Z0-9]+$";
const INSTAGRAM_PATTERN: &str =
    r"^https?://(?:www\.)?instagram\.com/(?:p|reel|reels|tv|stories|share)/([^/?#&]+).*";
const TIKTOK_PATTERN: &str =
    r"^https?://(?:www\.|m\.|vm\.|vt\.)?tiktok\.com/(?:@[^/]+/(?:video|photo)/\d+|v/\d+|t/\w+|\w+)/?";
const TWITTER_PATTERN: &str =
    r"^https://(?:x|twitter)\.com(?:/(?:i/web|[^/]+)/status/(\d+)(?:.*)?)?$";
const YOUTUBE_PATTERN: &str =
    r"^https?://(?:(?:www|m|music)\.)?(?:youtube\.com/(?:watch\?|shorts/|embed/|live/)|youtu\.be/)\S+";

/// Image proxy some snapsave mirrors wrap thumbnails in
const THUMBNAIL_PROXY: &str = "https://snapinsta.app/photo.php?photo=";

/// Supported source platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Facebook,
    Instagram,
    TikTok,
    Twitter,
    YouTube,
    Unknown,
}

impl Platform {
    /// Classify a URL with the strict per-platform patterns.
    ///
    /// Returns `None` for anything no pattern accepts.
    pub fn detect(url: &str) -> Option<Platform> {
        [
            Platform::Twitter,
            Platform::TikTok,
            Platform::YouTube,
            Platform::Instagram,
            Platform::Facebook,
        ]
        .into_iter()
        .find(|platform| platform.matches(url))
    }

    /// Classify by substring, used for labels only
    pub fn from_url_loose(url: &str) -> Platform {
        if url.contains("tiktok") {
            Platform::TikTok
        } else if url.contains("twitter") || url.contains("x.com") {
            Platform::Twitter
        } else if url.contains("facebook") {
            Platform::Facebook
        } else if url.contains("instagram") {
            Platform::Instagram
        } else if url.contains("youtube") || url.contains("youtu.be") {
            Platform::YouTube
        } else {
            Platform::Unknown
        }
    }

    /// Check `url` against this platform's pattern
    pub fn matches(&self, url: &str) -> bool {
        let pattern = match self {
            Platform::Facebook => FACEBOOK_PATTERN,
            Platform::Instagram => INSTAGRAM_PATTERN,
            Platform::TikTok => TIKTOK_PATTERN,
            Platform::Twitter => TWITTER_PATTERN,
            Platform::YouTube => YOUTUBE_PATTERN,
            Platform::Unknown => return false,
        };
        Regex::new(pattern).map(|re| re.is_match(url)).unwrap_or(false)
    }

    /// Lowercase key used in titles and placeholder filenames
    pub fn key(&self) -> &'static str {
        match self {
            Platform::Facebook => "facebook",
            Platform::Instagram => "instagram",
            Platform::TikTok => "tiktok",
            Platform::Twitter => "twitter",
            Platform::YouTube => "youtube",
            Platform::Unknown => "unknown",
        }
    }

    /// Display name as shown to users
    pub fn name(&self) -> &'static str {
        match self {
            Platform::Facebook => "Facebook",
            Platform::Instagram => "Instagram",
            Platform::TikTok => "Tiktok",
            Platform::Twitter => "Twitter/X",
            Platform::YouTube => "YouTube",
            Platform::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Check if the URL points at a YouTube page rather than a media file.
///
/// Image hosts such as `img.youtube.com` and `i.ytimg.com` are not pages.
pub fn is_youtube_page(url: &str) -> bool {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => return false,
    };
    matches!(
        parsed.host_str(),
        Some("youtube.com" | "www.youtube.com" | "m.youtube.com" | "music.youtube.com" | "youtu.be")
    )
}

/// Insert `www.` into bare two-label hosts.
///
/// Twitter/X URLs are passed through untouched.
pub fn normalize_url(url: &str) -> String {
    if Platform::Twitter.matches(url) {
        return url.to_string();
    }

    let lower = url.to_lowercase();
    let rest = match ["https://", "http://"]
        .iter()
        .find(|scheme| lower.starts_with(*scheme))
    {
        Some(scheme) => &lower[scheme.len()..],
        None => return url.to_string(),
    };

    if rest.starts_with("www.") || !rest.starts_with(|c: char| c.is_ascii_alphanumeric()) {
        return url.to_string();
    }

    match Regex::new(r"^(https?://)([^./]+\.[^./]+)(/.*)?$") {
        Ok(re) => re.replace(url, "${1}www.${2}${3}").into_owned(),
        Err(_) => url.to_string(),
    }
}

/// Unwrap thumbnails served through the snapinsta image proxy
pub fn fix_thumbnail(url: &str) -> String {
    if !url.contains(THUMBNAIL_PROXY) {
        return url.to_string();
    }

    let stripped = url.replacen(THUMBNAIL_PROXY, "", 1);
    match urlencoding::decode(&stripped) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => stripped,
    }
}

/// Extract the video ID from watch, shorts, embed, live and youtu.be URLs
pub fn extract_youtube_video_id(url: &str) -> Result<String, SnapError> {
    let parsed = Url::parse(url)?;

    let id = match parsed.host_str() {
        Some("youtu.be") => parsed
            .path_segments()
            .and_then(|mut segments| segments.next())
            .map(str::to_string),
        Some("youtube.com") | Some("www.youtube.com") | Some("m.youtube.com")
        | Some("music.youtube.com") => {
            let path = parsed.path();
            if path.starts_with("/watch") {
                parsed
                    .query_pairs()
                    .find(|(key, _)| key == "v")
                    .map(|(_, value)| value.to_string())
            } else {
                ["/shorts/", "/embed/", "/live/", "/v/"]
                    .iter()
                    .find(|prefix| path.starts_with(*prefix))
                    .and_then(|prefix| path[prefix.len()..].split('/').next())
                    .map(str::to_string)
            }
        }
        _ => {
            return Err(SnapError::InvalidUrl(
                "Not a YouTube URL".to_string(),
            ))
        }
    };

    id.filter(|id| !id.is_empty())
        .ok_or_else(|| SnapError::InvalidUrl("Missing YouTube video ID".to_string()))
}
