//! Main entry point for the snapdl CLI

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use snapdl::cli::{create_progress_callback, Args, Command, OutputFormatter};
use snapdl::{ApiResponse, Downloader, EnhancedMedia, SnapError};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Saved file as reported in JSON mode
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SavedMedia {
    #[serde(flatten)]
    media: EnhancedMedia,
    path: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.log_level())?;

    debug!("Starting snapdl with args: {:?}", args);

    let command = args.command();
    let mut formatter = OutputFormatter::new(args.verbosity_level());
    let show_progress = !args.no_progress && !args.json && matches!(command, Command::Save(_));
    if show_progress {
        formatter.create_progress_bar();
    }
    let formatter = Arc::new(formatter);

    let mut downloader =
        Downloader::with_options(args.download_options()).context("failed to build HTTP client")?;
    if show_progress {
        downloader = downloader.with_progress(create_progress_callback(formatter.clone()));
    }

    let url = args.urls.first().context("no URL given")?.as_str();
    let succeeded = match command {
        Command::Batch => {
            let batch = downloader.batch_download(&args.urls).await;
            info!(
                "Batch finished: {} resolved, {} failed",
                batch.successful.len(),
                batch.failed
            );
            if args.json {
                formatter.print_json(&ApiResponse {
                    success: true,
                    message: batch.message(),
                    data: Some(&batch),
                })?;
            } else {
                formatter.print_batch(&batch);
            }
            batch.failed == 0
        }
        Command::Info => {
            let media = downloader.get_download_info(url);
            emit(&formatter, args.json, Ok(media), OutputFormatter::print_media)?
        }
        Command::Photos => {
            let result = downloader.download_all_photos(url).await;
            emit(&formatter, args.json, result, OutputFormatter::print_photos)?
        }
        Command::All => {
            let result = downloader.download_all_media(url).await;
            emit(&formatter, args.json, result, OutputFormatter::print_collection)?
        }
        Command::Save(dir) => {
            if !args.json {
                formatter.info(&format!("Saving {} into {}", url, dir.display()));
            }
            let started = Instant::now();
            let result = downloader
                .download_to(url, &dir)
                .await
                .map(|(media, path)| SavedMedia { media, path });

            if let Ok(saved) = &result {
                formatter.finish_progress("Done");
                let bytes = tokio::fs::metadata(&saved.path)
                    .await
                    .map(|m| m.len())
                    .unwrap_or(0);
                if !args.json {
                    formatter.print_download_complete(&saved.path, bytes, started.elapsed());
                }
            }
            emit(&formatter, args.json, result, |formatter, saved| {
                formatter.print_media(&saved.media)
            })?
        }
        Command::Show => {
            let result = downloader.enhanced_download(url).await;
            emit(&formatter, args.json, result, OutputFormatter::print_media)?
        }
    };

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Print a result either as a JSON envelope or through `print`; returns whether it succeeded
fn emit<T, F>(
    formatter: &OutputFormatter,
    json: bool,
    result: Result<T, SnapError>,
    print: F,
) -> anyhow::Result<bool>
where
    T: Serialize,
    F: FnOnce(&OutputFormatter, &T),
{
    let succeeded = result.is_ok();
    if json {
        formatter.print_json(&ApiResponse::from(result))?;
        return Ok(succeeded);
    }

    match result {
        Ok(value) => print(formatter, &value),
        Err(e) => {
            debug!("Request failed: {:?}", e);
            formatter.error(&e.user_message());
        }
    }
    Ok(succeeded)
}

/// Initialize logging system
fn init_logging(default_level: &str) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .try_init()?;

    Ok(())
}
