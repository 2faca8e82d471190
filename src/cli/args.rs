//! Command line argument parsing

use crate::core::DownloadOptions;
use crate::platform::ClientType;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// snapdl - Resolve direct media links from social media posts
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Post URLs (Facebook, Instagram, TikTok, Twitter/X, YouTube)
    #[arg(required = true, value_name = "URL")]
    pub urls: Vec<String>,

    /// Print the result as a JSON envelope
    #[arg(long)]
    pub json: bool,

    /// Download the best media into this directory
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// List every photo and video of the post
    #[arg(long, conflicts_with = "photos")]
    pub all: bool,

    /// List every photo of the post
    #[arg(long)]
    pub photos: bool,

    /// Print a placeholder record without waiting for the network
    #[arg(long)]
    pub info: bool,

    /// Disable progress output
    #[arg(long)]
    pub no_progress: bool,

    /// HTTP timeout (e.g., 30s, 1m)
    #[arg(long, value_name = "DURATION", default_value = "30s")]
    pub timeout: humantime::Duration,

    /// How long resolved posts stay cached
    #[arg(long, value_name = "DURATION", default_value = "1m")]
    pub cache_ttl: humantime::Duration,

    /// Browser profile to impersonate
    #[arg(long, value_enum, default_value = "chrome")]
    pub client: ClientType,

    /// Override User-Agent header
    #[arg(long, value_name = "USER_AGENT")]
    pub user_agent: Option<String>,

    /// Proxy URL (http/https/socks)
    #[arg(long, value_name = "URL")]
    pub proxy: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet output (only errors)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// What the binary should do with the given URLs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Batch,
    Info,
    Photos,
    All,
    Save(PathBuf),
    Show,
}

impl Args {
    /// Get HTTP timeout as Duration
    pub fn timeout_duration(&self) -> Duration {
        self.timeout.into()
    }

    pub fn cache_ttl_duration(&self) -> Duration {
        self.cache_ttl.into()
    }

    /// Build downloader options from the flags
    pub fn download_options(&self) -> DownloadOptions {
        let mut options = DownloadOptions::default()
            .with_timeout(self.timeout_duration())
            .with_cache_ttl(self.cache_ttl_duration())
            .with_client_type(self.client);

        if let Some(user_agent) = &self.user_agent {
            options = options.with_user_agent(user_agent.clone());
        }
        if let Some(proxy) = &self.proxy {
            options = options.with_proxy(proxy.clone());
        }
        options
    }

    /// Several URLs always run as a batch; otherwise the first mode flag wins
    pub fn command(&self) -> Command {
        if self.urls.len() > 1 {
            Command::Batch
        } else if self.info {
            Command::Info
        } else if self.photos {
            Command::Photos
        } else if self.all {
            Command::All
        } else if let Some(dir) = &self.output {
            Command::Save(dir.clone())
        } else {
            Command::Show
        }
    }

    /// Get output verbosity level
    pub fn verbosity_level(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else if self.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }

    /// Default tracing filter when `RUST_LOG` is unset
    pub fn log_level(&self) -> &'static str {
        match self.verbosity_level() {
            VerbosityLevel::Quiet => "error",
            VerbosityLevel::Normal => "info",
            VerbosityLevel::Verbose => "debug",
        }
    }
}

/// Output verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbosityLevel {
    /// Quiet (only errors)
    Quiet,
    /// Normal
    Normal,
    /// Verbose (debug info)
    Verbose,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("snapdl").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_args_default_values() {
        let args = parse(&["https://www.tiktok.com/@a/video/1"]);
        assert_eq!(args.urls.len(), 1);
        assert!(!args.json);
        assert_eq!(args.output, None);
        assert_eq!(args.timeout_duration(), Duration::from_secs(30));
        assert_eq!(args.cache_ttl_duration(), Duration::from_secs(60));
        assert_eq!(args.client, ClientType::Chrome);
        assert_eq!(args.verbosity_level(), VerbosityLevel::Normal);
        assert_eq!(args.command(), Command::Show);
    }

    #[test]
    fn test_args_require_a_url() {
        assert!(Args::try_parse_from(["snapdl"]).is_err());
    }

    #[test]
    fn test_quiet_and_verbose_conflict() {
        assert!(Args::try_parse_from(["snapdl", "-q", "-v", "https://x.com/a/status/1"]).is_err());
    }

    #[test]
    fn test_command_selection() {
        let args = parse(&["https://a.example", "https://b.example", "--info"]);
        assert_eq!(args.command(), Command::Batch);

        let args = parse(&["https://a.example", "--info", "--photos"]);
        assert_eq!(args.command(), Command::Info);

        let args = parse(&["https://a.example", "--photos", "-o", "out"]);
        assert_eq!(args.command(), Command::Photos);

        let args = parse(&["https://a.example", "--all"]);
        assert_eq!(args.command(), Command::All);

        let args = parse(&["https://a.example", "--output", "downloads"]);
        assert_eq!(args.command(), Command::Save(PathBuf::from("downloads")));
    }

    #[test]
    fn test_download_options_from_flags() {
        let args = parse(&[
            "https://a.example",
            "--timeout",
            "1m",
            "--cache-ttl",
            "5m",
            "--client",
            "firefox",
            "--user-agent",
            "custom/1.0",
            "--proxy",
            "socks5://127.0.0.1:9050",
        ]);

        let options = args.download_options();
        assert_eq!(options.timeout, Duration::from_secs(60));
        assert_eq!(options.cache_ttl, Duration::from_secs(300));
        assert_eq!(options.client_type, ClientType::Firefox);
        assert_eq!(options.user_agent.as_deref(), Some("custom/1.0"));
        assert_eq!(options.proxy_url.as_deref(), Some("socks5://127.0.0.1:9050"));
    }

    #[test]
    fn test_log_level_follows_verbosity() {
        assert_eq!(parse(&["-q", "https://a.example"]).log_level(), "error");
        assert_eq!(parse(&["https://a.example"]).log_level(), "info");
        assert_eq!(parse(&["-v", "https://a.example"]).log_level(), "debug");
    }
}
