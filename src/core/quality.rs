//! Quality scoring for resolution strings and download link labels

use regex::Regex;

/// Score a resolution label such as `1080p`, `1920x1080`, `HD` or `4K`.
///
/// Higher is better. An empty label scores 0 and an unrecognised one 500.
pub fn quality_score(resolution: &str) -> u32 {
    if resolution.is_empty() {
        return 0;
    }

    let res = resolution.to_lowercase();
    let has = |needle: &str| res.contains(needle);

    if has("4k") || has("2160") || has("uhd") {
        return 4000;
    }
    if has("2k") || has("1440") {
        return 2000;
    }
    if has("1080") || has("hd") || has("fullhd") || has("fhd") {
        return 1080;
    }
    if has("720") {
        return 720;
    }
    if has("480") || has("sd") {
        return 480;
    }
    if has("360") {
        return 360;
    }
    if has("240") {
        return 240;
    }

    if let Some(height) = capture_number(&res, r"(\d+)[x×](\d+)", 2) {
        return match height {
            h if h >= 2160 => 4000,
            h if h >= 1440 => 2000,
            h if h >= 1080 => 1080,
            h if h >= 720 => 720,
            h if h >= 480 => 480,
            h if h >= 360 => 360,
            h => h,
        };
    }

    if let Some(height) = capture_number(&res, r"(\d+)p", 1) {
        return height;
    }

    if has("high") || has("best") || has("original") {
        1000
    } else if has("medium") || has("normal") {
        500
    } else if has("low") || has("worst") {
        100
    } else {
        500
    }
}

/// Human-readable label for a quality score
pub fn quality_label(quality: u32) -> &'static str {
    match quality {
        q if q >= 4000 => "4K Ultra HD",
        q if q >= 2000 => "2K HD",
        q if q >= 1080 => "Full HD (1080p)",
        q if q >= 720 => "HD (720p)",
        q if q >= 480 => "SD (480p)",
        q if q >= 360 => "Low (360p)",
        q if q >= 240 => "Very Low (240p)",
        _ => "Standard",
    }
}

/// Quality of a TikTok download anchor from its text
pub fn tiktok_link_quality(text: &str) -> u32 {
    if text.contains("HD") || text.contains("1080") {
        1080
    } else if text.contains("720") {
        720
    } else if text.contains("480") {
        480
    } else if text.contains("360") {
        360
    } else {
        500
    }
}

/// Quality of a Twitter/X download anchor from its text and target
pub fn twitter_link_quality(text: &str, href: &str) -> u32 {
    if text.contains("HD") || href.contains("hd") || text.contains("1080") {
        1080
    } else if text.contains("720") {
        720
    } else if text.contains("480") {
        480
    } else {
        500
    }
}

/// Quality of a snapsave card button, `fallback` when the text names none
pub fn card_quality(text: &str, fallback: u32) -> u32 {
    if text.contains("HD") || text.contains("1080") {
        1000
    } else if text.contains("720") {
        720
    } else if text.contains("480") {
        480
    } else {
        fallback
    }
}

/// Quality of a snapsave download-items button
pub fn download_item_quality(text: &str, url: Option<&str>) -> u32 {
    if text.contains("HD") || url.map_or(false, |u| u.contains("hd")) {
        1000
    } else if text.contains("720") {
        720
    } else {
        360
    }
}

/// Check if a link label names a photo
pub fn is_photo_label(text: &str) -> bool {
    text.contains("photo") || text.contains("Photo")
}

fn capture_number(text: &str, pattern: &str, group: usize) -> Option<u32> {
    let re = Regex::new(pattern).ok()?;
    re.captures(text)?.get(group)?.as_str().parse().ok()
}
