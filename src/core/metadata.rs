//! Title, author and duration heuristics for scraped page text

use crate::utils::Platform;
use regex::{Regex, RegexBuilder};

/// Collapse runs of whitespace into single spaces and trim
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Capitalise the first character
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn non_empty(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Title used when a page yields nothing usable, e.g. `Tiktok Media`
pub fn fallback_title(platform: Platform) -> String {
    format!("{} Media", capitalize(platform.key()))
}

fn title_prefixes(platform: Platform) -> &'static [&'static str] {
    match platform {
        Platform::TikTok => &["TikTok", "Video", "Download", "Share"],
        Platform::Twitter => &["Twitter", "X", "Video", "Download", "Share"],
        Platform::Facebook => &["Facebook", "Video", "Watch", "Share", "Download"],
        Platform::Instagram => &["Instagram", "Video", "Post", "Reel", "Download"],
        Platform::YouTube | Platform::Unknown => &[],
    }
}

/// Turn a scraped description into a title.
///
/// Strips per-platform boilerplate prefixes and `| Site` / `on Site`
/// suffixes. Empty input stays empty; anything that cleans down to nothing
/// becomes the platform fallback title.
pub fn clean_title(text: &str, platform: Platform) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut clean = collapse_whitespace(text);
    for prefix in title_prefixes(platform) {
        let pattern = format!(r"^{}[\s:]*", regex::escape(prefix));
        if let Ok(re) = RegexBuilder::new(&pattern).case_insensitive(true).build() {
            clean = re.replace(&clean, "").trim().to_string();
        }
    }

    clean = replace_trim(&clean, r"\|\s*[^|]+$");
    clean = replace_trim(&clean, r"\s+on\s+[A-Za-z]+$");

    if clean.is_empty() {
        fallback_title(platform)
    } else {
        clean
    }
}

/// Normalise a scraped description before it is shown.
///
/// Prefix stripping is case-sensitive here, unlike [`clean_title`].
pub fn clean_description(text: &str, platform: Platform) -> String {
    let collapsed = collapse_whitespace(text);
    match platform {
        Platform::TikTok => replace_trim(&collapsed, r"^(TikTok|Video|Download|Share)[\s:]*"),
        Platform::Twitter => replace_trim(&collapsed, r"^(Twitter|X|Video|Download|Share)[\s:]*"),
        Platform::Facebook | Platform::Instagram => {
            let clean = replace_trim(
                &collapsed,
                r"^(Facebook|Instagram|Video|Watch|Share|Download)[\s:]*",
            );
            let clean = replace_trim(&clean, r"\|\s*Facebook$");
            replace_trim(&clean, r"on Facebook$")
        }
        Platform::YouTube | Platform::Unknown => collapsed,
    }
}

/// First `m:ss` style duration in the text
pub fn extract_duration(text: &str) -> String {
    Regex::new(r"(\d{1,2}):(\d{2})")
        .ok()
        .and_then(|re| re.captures(text))
        .map(|caps| format!("{}:{}", &caps[1], &caps[2]))
        .unwrap_or_default()
}

/// Author name from `by Name`, `@handle` or a capitalised name pair
pub fn extract_author(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    [r"(?i)by\s+([^,\n]+)", r"@(\w+)", r"([A-Z][a-z]+)\s+[A-Z][a-z]+"]
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .find_map(|re| re.captures(text).map(|caps| caps[1].trim().to_string()))
        .unwrap_or_default()
}

/// Format seconds as `h:mm:ss`, or `m:ss` under an hour
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

fn replace_trim(text: &str, pattern: &str) -> String {
    match Regex::new(pattern) {
        Ok(re) => re.replace(text, "").trim().to_string(),
        Err(_) => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_title_strips_boilerplate() {
        assert_eq!(
            clean_title("TikTok: Video   dancing cat", Platform::TikTok),
            "dancing cat"
        );
        assert_eq!(
            clean_title("Sunset over the lake | Facebook", Platform::Facebook),
            "Sunset over the lake"
        );
        assert_eq!(
            clean_title("Watch: sunset", Platform::Facebook),
            "sunset"
        );
        assert_eq!(
            clean_title("Morning run on Instagram", Platform::Instagram),
            "Morning run"
        );
        assert_eq!(
            clean_title("Facebook: Birthday party", Platform::Facebook),
            "Birthday party"
        );
    }

    #[test]
    fn test_clean_title_fallbacks() {
        assert_eq!(clean_title("", Platform::TikTok), "");
        assert_eq!(clean_title("Download", Platform::TikTok), "Tiktok Media");
        assert_eq!(clean_title("  ", Platform::Twitter), "Twitter Media");
        assert_eq!(fallback_title(Platform::Instagram), "Instagram Media");
    }

    #[test]
    fn test_clean_description() {
        assert_eq!(
            clean_description("Download:  my   clip", Platform::TikTok),
            "my clip"
        );
        assert_eq!(
            clean_description("download my clip", Platform::TikTok),
            "download my clip"
        );
        assert_eq!(
            clean_description("Share: Great goal | Facebook", Platform::Facebook),
            "Great goal"
        );
        assert_eq!(
            clean_description("Great goal on Facebook", Platform::Facebook),
            "Great goal"
        );
    }

    #[test]
    fn test_extract_duration() {
        assert_eq!(extract_duration("Duration 3:07 min"), "3:07");
        assert_eq!(extract_duration("12:45"), "12:45");
        assert_eq!(extract_duration("no time"), "");
    }

    #[test]
    fn test_extract_author() {
        assert_eq!(extract_author("Video by Jane Doe, 2024"), "Jane Doe");
        assert_eq!(extract_author("posted by @someone"), "@someone");
        assert_eq!(extract_author("follow @creator_1 now"), "creator_1");
        assert_eq!(extract_author("Jane Doe"), "Jane");
        assert_eq!(extract_author("nobody here"), "");
        assert_eq!(extract_author(""), "");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(65), "1:05");
        assert_eq!(format_duration(3725), "1:02:05");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("tiktok"), "Tiktok");
        assert_eq!(capitalize(""), "");
    }
}
