//! Generic marker heuristic for tools that emit a periodic progress token
//! but no usable figure (ffmpeg stream-copy with `-progress pipe:1`).

use std::time::Instant;

use super::{ProgressParser, ProgressUpdate};

/// Each marker-bearing line bumps the percentage by one, capped at 99.
pub struct MarkerParser {
    marker: String,
    percentage: u8,
    started: Instant,
}

impl MarkerParser {
    pub fn new(marker: impl Into<String>) -> Self {
        Self::with_start(marker, Instant::now())
    }

    pub fn with_start(marker: impl Into<String>, started: Instant) -> Self {
        Self {
            marker: marker.into(),
            percentage: 0,
            started,
        }
    }

    pub fn percentage(&self) -> u8 {
        self.percentage
    }
}

impl ProgressParser for MarkerParser {
    fn consume_line(&mut self, line: &str) -> Option<ProgressUpdate> {
        if !line.contains(&self.marker) {
            return None;
        }
        self.percentage = (self.percentage + 1).min(99);

        let elapsed = self.started.elapsed().as_secs();
        let rate = format_rate(self.percentage, elapsed);

        Some(ProgressUpdate {
            percentage: Some(self.percentage),
            rate,
            ..Default::default()
        })
    }
}

/// percentage / elapsed, with the KB-to-MB threshold at 1024.
fn format_rate(percentage: u8, elapsed_secs: u64) -> Option<String> {
    if elapsed_secs == 0 || percentage == 0 {
        return None;
    }
    let kb = f64::from(percentage) / elapsed_secs as f64;
    if kb > 1024.0 {
        Some(format!("{:.1} MB/s", kb / 1024.0))
    } else {
        Some(format!("{:.0} KB/s", kb))
    }
}
