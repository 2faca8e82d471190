//! Safe filename generation utilities

use chrono::Utc;
use regex::Regex;
use std::path::Path;

/// Longest title kept in a generated filename
const MAX_TITLE_CHARS: usize = 100;

/// Build a download filename from a media title.
///
/// `kind` is `video`, `image` or `zip` and picks the default extension when
/// `extension` is not given. Titles that clean down to nothing fall back to a
/// timestamped `video_...` name.
pub fn generate_clean_filename(title: &str, kind: &str, extension: Option<&str>) -> String {
    let clean = clean_title(title);
    if clean.is_empty() {
        return timestamped_filename(extension.unwrap_or(kind));
    }

    let ext = extension.unwrap_or_else(|| default_extension(kind));
    format!("{}.{}", clean, ext)
}

/// Default extension for a media kind
pub fn default_extension(kind: &str) -> &'static str {
    match kind {
        "image" => "jpg",
        "zip" => "zip",
        _ => "mp4",
    }
}

fn clean_title(title: &str) -> String {
    let stripped = strip(title, r#"[<>:"/\\|?*]"#);
    let stripped = strip(&stripped, r"[^A-Za-z0-9_\s-]");
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(MAX_TITLE_CHARS).collect::<String>()
}

fn strip(text: &str, pattern: &str) -> String {
    match Regex::new(pattern) {
        Ok(re) => re.replace_all(text, "").into_owned(),
        Err(_) => text.to_string(),
    }
}

fn timestamped_filename(extension: &str) -> String {
    format!(
        "video_{}.{}",
        Utc::now().format("%Y-%m-%dT%H-%M-%S"),
        extension
    )
}

/// Generate a unique filename by appending a number if the file already exists
pub fn generate_unique_filename(base_path: &Path, filename: &str) -> std::io::Result<String> {
    let mut counter = 1;
    let mut final_filename = filename.to_string();

    let path = Path::new(filename);
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    while base_path.join(&final_filename).exists() {
        final_filename = format!("{} ({}){}", stem, counter, extension);
        counter += 1;

        if counter > 10000 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "Too many files with similar names",
            ));
        }
    }

    Ok(final_filename)
}
