//! Progress tracking for file downloads

use std::time::{Duration, Instant};

/// Snapshot of a running transfer
#[derive(Debug, Clone)]
pub struct Progress {
    /// Size announced by `Content-Length`, if any
    pub total: Option<u64>,
    pub downloaded: u64,
    /// Average speed in bytes per second since the start
    pub speed: Option<f64>,
    pub eta: Option<Duration>,
    started: Instant,
}

impl Progress {
    pub fn new(total: Option<u64>) -> Self {
        Self {
            total: total.filter(|&t| t > 0),
            downloaded: 0,
            speed: None,
            eta: None,
            started: Instant::now(),
        }
    }

    /// Record the running byte count and refresh speed and ETA
    pub fn update(&mut self, downloaded: u64) {
        self.downloaded = downloaded;

        let elapsed = self.started.elapsed().as_secs_f64();
        if elapsed <= 0.0 {
            return;
        }
        let speed = downloaded as f64 / elapsed;
        self.speed = Some(speed);

        self.eta = match self.total {
            Some(total) if speed > 0.0 && total > downloaded => Some(Duration::from_secs(
                ((total - downloaded) as f64 / speed) as u64,
            )),
            _ => None,
        };
    }

    /// Completion in percent, unknown without a total
    pub fn percent(&self) -> Option<f64> {
        self.total
            .map(|total| (self.downloaded as f64 / total as f64 * 100.0).min(100.0))
    }

    pub fn is_complete(&self) -> bool {
        self.total.map_or(false, |total| self.downloaded >= total)
    }

    /// One-line summary like `1.5 MB / 3.0 MB (50.0%) at 512.0 KB/s, 3s left`
    pub fn summary(&self) -> String {
        let mut line = match (self.total, self.percent()) {
            (Some(total), Some(percent)) => format!(
                "{} / {} ({:.1}%)",
                format_bytes(self.downloaded),
                format_bytes(total),
                percent
            ),
            _ => format_bytes(self.downloaded),
        };

        if let Some(speed) = self.speed {
            line.push_str(&format!(" at {}", format_speed(speed)));
        }
        if let Some(eta) = self.eta {
            line.push_str(&format!(", {} left", humantime::format_duration(eta)));
        }
        line
    }
}

/// Format a byte count with binary units
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

pub fn format_speed(bytes_per_second: f64) -> String {
    format!("{}/s", format_bytes(bytes_per_second as u64))
}
