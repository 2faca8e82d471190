//! Output formatting and progress display

use crate::cli::args::VerbosityLevel;
use crate::core::{BatchResult, EnhancedMedia, MediaCollection, PhotoCollection};
use crate::download::{format_bytes, format_speed, Progress};
use crate::error::{ApiResponse, SnapError};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta}) {msg}";

/// Output formatter for snapdl
pub struct OutputFormatter {
    verbosity: VerbosityLevel,
    progress_bar: Option<ProgressBar>,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            progress_bar: None,
        }
    }

    /// Create a progress bar for downloads.
    ///
    /// The length starts at zero and is filled in once the server announces one.
    pub fn create_progress_bar(&mut self) -> Option<ProgressBar> {
        if self.verbosity == VerbosityLevel::Quiet {
            return None;
        }

        let style = ProgressStyle::default_bar()
            .template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");

        let progress_bar = ProgressBar::new(0);
        progress_bar.set_style(style);
        progress_bar.set_message("Downloading...");

        self.progress_bar = Some(progress_bar.clone());
        Some(progress_bar)
    }

    /// Update progress bar
    pub fn update_progress(&self, progress: &Progress) {
        if let Some(progress_bar) = &self.progress_bar {
            apply_progress(progress_bar, progress);
        }
    }

    /// Finish progress bar
    pub fn finish_progress(&self, message: &str) {
        if let Some(progress_bar) = &self.progress_bar {
            progress_bar.finish_with_message(message.to_string());
        }
    }

    /// Print info message
    pub fn info(&self, message: &str) {
        if self.verbosity != VerbosityLevel::Quiet {
            println!("{} {}", "ℹ".blue(), message);
        }
    }

    /// Print success message
    pub fn success(&self, message: &str) {
        if self.verbosity != VerbosityLevel::Quiet {
            println!("{} {}", "✔".green(), message);
        }
    }

    /// Print warning message
    pub fn warning(&self, message: &str) {
        if self.verbosity != VerbosityLevel::Quiet {
            eprintln!("{} {}", "⚠".yellow(), message);
        }
    }

    /// Print error message
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✖".red().bold(), message);
    }

    /// Print a resolved media record
    pub fn print_media(&self, media: &EnhancedMedia) {
        if self.verbosity != VerbosityLevel::Quiet {
            println!("{}", render_media(media));
        }
    }

    pub fn print_photos(&self, photos: &PhotoCollection) {
        if self.verbosity != VerbosityLevel::Quiet {
            println!("{}", render_photos(photos));
        }
    }

    pub fn print_collection(&self, collection: &MediaCollection) {
        if self.verbosity != VerbosityLevel::Quiet {
            println!("{}", render_collection(collection));
        }
    }

    /// Print batch results followed by the failure summary, if any
    pub fn print_batch(&self, batch: &BatchResult) {
        if self.verbosity == VerbosityLevel::Quiet {
            return;
        }
        for (index, media) in batch.successful.iter().enumerate() {
            println!(
                "{} {}",
                format!("[{}/{}]", index + 1, batch.successful.len()).dimmed(),
                render_media(media)
            );
        }
        if let Some(message) = batch.message() {
            self.warning(&message);
        }
    }

    /// Print download complete message
    pub fn print_download_complete(&self, path: &Path, bytes: u64, elapsed: Duration) {
        if self.verbosity == VerbosityLevel::Quiet {
            return;
        }
        println!();
        self.success(&format!(
            "Saved {} to {} in {}",
            format_bytes(bytes),
            path.display(),
            humantime::format_duration(Duration::from_secs(elapsed.as_secs()))
        ));
    }

    /// Print an `ApiResponse` envelope as pretty JSON; errors are always shown
    pub fn print_json<T: Serialize>(&self, response: &ApiResponse<T>) -> Result<(), SnapError> {
        println!("{}", serde_json::to_string_pretty(response)?);
        Ok(())
    }
}

/// Create a progress callback for the downloader
pub fn create_progress_callback(
    formatter: Arc<OutputFormatter>,
) -> impl Fn(&Progress) + Send + Sync + 'static {
    move |progress: &Progress| {
        formatter.update_progress(progress);
    }
}

fn apply_progress(progress_bar: &ProgressBar, progress: &Progress) {
    if let Some(total) = progress.total {
        progress_bar.set_length(total);
    }
    progress_bar.set_position(progress.downloaded);
    if let Some(speed) = progress.speed {
        progress_bar.set_message(format_speed(speed));
    }
}

fn field(label: &str, value: &str) -> Option<String> {
    (!value.is_empty()).then(|| format!("  {:<10} {}", format!("{}:", label).dimmed(), value))
}

/// Multi-line description of one resolved item
pub fn render_media(media: &EnhancedMedia) -> String {
    let mut lines = vec![format!(
        "{} {}",
        media.title.bold(),
        format!("({})", media.platform).cyan()
    )];

    lines.extend(
        [
            field("Author", &media.author),
            field("Duration", &media.duration),
            field(
                "Quality",
                &format!("{} [{}]", media.quality_label, media.kind.as_str()),
            ),
            field("File", &media.filename),
            field("URL", &media.download_url),
            field("Thumbnail", &media.thumbnail),
        ]
        .into_iter()
        .flatten(),
    );
    lines.join("\n")
}

pub fn render_photos(photos: &PhotoCollection) -> String {
    let mut lines = vec![format!(
        "{} {}",
        photos.title.bold(),
        format!("({} photos)", photos.total_photos).cyan()
    )];
    lines.extend(field("Author", &photos.author));
    for photo in &photos.photos {
        lines.push(format!(
            "  {:>3}. {} {}",
            photo.index,
            photo.filename,
            photo.url.dimmed()
        ));
    }
    lines.push(format!("  {} {}", "Archive:".dimmed(), photos.zip_filename));
    lines.join("\n")
}

pub fn render_collection(collection: &MediaCollection) -> String {
    let mut lines = vec![format!(
        "{} {}",
        collection.title.bold(),
        format!(
            "({} items: {} photos, {} videos)",
            collection.total_items,
            collection.photos.len(),
            collection.videos.len()
        )
        .cyan()
    )];
    lines.extend(field("Author", &collection.author));
    for photo in &collection.photos {
        lines.push(format!(
            "  {} {:>3}. {} {}",
            "photo".magenta(),
            photo.index,
            photo.filename,
            photo.url.dimmed()
        ));
    }
    for video in &collection.videos {
        lines.push(format!(
            "  {} {:>3}. {} {}",
            "video".green(),
            video.index,
            video.filename,
            video.url.dimmed()
        ));
    }
    lines.push(format!("  {} {}", "Archive:".dimmed(), collection.zip_filename));
    lines.join("\n")
}
