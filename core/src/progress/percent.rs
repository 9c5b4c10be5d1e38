//! Numeric-percentage heuristic for tools that print an explicit percent
//! figure in free text ("下载进度: 77.1%", "downloading... 77%", "77.1%").

use std::time::Instant;

use regex::Regex;

use super::{ProgressParser, ProgressUpdate};

pub struct PercentParser {
    re: Regex,
    last: u8,
    started: Instant,
}

impl PercentParser {
    pub fn new() -> Self {
        Self::with_start(Instant::now())
    }

    pub fn with_start(started: Instant) -> Self {
        Self {
            re: Regex::new(r"(\d+(?:\.\d+)?)%").expect("percent regex"),
            last: 0,
            started,
        }
    }

    pub fn percentage(&self) -> u8 {
        self.last
    }
}

impl Default for PercentParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressParser for PercentParser {
    fn consume_line(&mut self, line: &str) -> Option<ProgressUpdate> {
        let caps = self.re.captures(line)?;
        let value: f64 = caps.get(1)?.as_str().parse().ok()?;

        // Monotonicity guard: accept only a strictly higher figure, and keep
        // live progress below 100 regardless of what the tool claims.
        let pct = (value as u8).min(99);
        if pct <= self.last {
            return None;
        }
        self.last = pct;

        let elapsed = self.started.elapsed().as_secs();
        let rate = if elapsed > 0 {
            Some(format!("{:.1}%/s", f64::from(pct) / elapsed as f64))
        } else {
            None
        };

        Some(ProgressUpdate {
            percentage: Some(pct),
            rate,
            ..Default::default()
        })
    }
}
