//! Two-phase duration-proportional heuristic for transcription tasks.
//!
//! Phase 1 (audio extraction) has no parsable output at all; progress is
//! estimated from the growing mp3's size against an expected size derived
//! from the source duration. Phase 2 parses the segment lines a verbose
//! whisper run prints:
//!
//! ```text
//! [00:30.000 --> 01:00.000] segment text
//! ```
//!
//! The end timestamp maps proportionally into the configured band
//! (16–98 by default); the bare segment text is handed back so the runner
//! can append it to the output artifact as it arrives.

use regex::Regex;

use super::{ProgressParser, ProgressUpdate};

/// Phase-1 estimate: `file_bytes / (duration_minutes * bytes_per_minute)`,
/// scaled into `0..=ceiling`. The extractor offers no structured signal, so
/// the growing file size is the only input.
pub fn extraction_percentage(
    file_bytes: u64,
    duration_secs: f64,
    bytes_per_minute: u64,
    ceiling: u8,
) -> u8 {
    let expected = duration_secs / 60.0 * bytes_per_minute as f64;
    if expected <= 0.0 {
        return 0;
    }
    let pct = (file_bytes as f64 / expected * f64::from(ceiling)) as u8;
    pct.min(ceiling)
}

pub struct TranscriptParser {
    re: Regex,
    duration_secs: f64,
    floor: u8,
    ceiling: u8,
    last: u8,
}

impl TranscriptParser {
    pub fn new(duration_secs: f64, floor: u8, ceiling: u8) -> Self {
        Self {
            re: Regex::new(r"\[(\d{2}):(\d{2})\.(\d{3})\s*-->\s*(\d{2}):(\d{2})\.(\d{3})\]\s*(.*)")
                .expect("timestamp regex"),
            duration_secs,
            floor,
            ceiling: ceiling.min(99),
            last: floor,
        }
    }
}

impl ProgressParser for TranscriptParser {
    fn consume_line(&mut self, line: &str) -> Option<ProgressUpdate> {
        let caps = self.re.captures(line)?;

        let end_min: u32 = caps.get(4)?.as_str().parse().ok()?;
        let end_sec: u32 = caps.get(5)?.as_str().parse().ok()?;
        let end_ms: u32 = caps.get(6)?.as_str().parse().ok()?;
        let end_secs = f64::from(end_min * 60 + end_sec) + f64::from(end_ms) / 1000.0;

        let text = caps
            .get(7)
            .map(|m| m.as_str().trim().to_string())
            .filter(|t| !t.is_empty());

        let mut update = ProgressUpdate {
            text,
            ..Default::default()
        };

        if self.duration_secs > 0.0 {
            let span = f64::from(self.ceiling - self.floor);
            let raw = f64::from(self.floor) + end_secs / self.duration_secs * span;
            let pct = raw.min(f64::from(self.ceiling)) as u8;
            // Raised, never lowered.
            if pct > self.last {
                self.last = pct;
                update.percentage = Some(pct);
                update.stage = Some(format!(
                    "transcribing {:02}:{:02} / {:02}:{:02}",
                    end_min,
                    end_sec,
                    self.duration_secs as u64 / 60,
                    self.duration_secs as u64 % 60,
                ));
            }
        }

        Some(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn extraction_estimate_is_proportional_and_capped() {
        let bpm = 1024 * 1024;
        // 10 minutes of source, half the expected bytes written: 7%.
        assert_eq!(
            extraction_percentage(5 * 1024 * 1024, 600.0, bpm, 15),
            7
        );
        // Oversized intermediate file still caps at the phase ceiling.
        assert_eq!(
            extraction_percentage(100 * 1024 * 1024, 600.0, bpm, 15),
            15
        );
        assert_eq!(extraction_percentage(1024, 0.0, bpm, 15), 0);
    }

    #[test]
    fn timestamps_map_into_the_band() {
        // 120-second source, segments every 30 seconds.
        let mut p = TranscriptParser::new(120.0, 16, 98);

        let upd = p.consume_line("[00:00.000 --> 00:30.000] 第一段").unwrap();
        assert_eq!(upd.percentage, Some(16 + 20)); // 30/120 * 82 = 20.5
        assert_eq!(upd.text.as_deref(), Some("第一段"));

        let upd = p.consume_line("[00:30.000 --> 01:00.000] second").unwrap();
        assert_eq!(upd.percentage, Some(16 + 41));

        let upd = p.consume_line("[01:00.000 --> 01:30.000] third").unwrap();
        assert_eq!(upd.percentage, Some(16 + 61));

        let upd = p.consume_line("[01:30.000 --> 02:00.000] last").unwrap();
        assert_eq!(upd.percentage, Some(98));
    }

    #[test]
    fn band_never_exceeds_ceiling_before_exit() {
        let mut p = TranscriptParser::new(120.0, 16, 98);
        // A tool can report past the nominal duration; the band still caps.
        let upd = p.consume_line("[02:30.000 --> 03:00.000] overrun").unwrap();
        assert_eq!(upd.percentage, Some(98));
        assert_eq!(upd.stage.as_deref(), Some("transcribing 03:00 / 02:00"));
    }

    #[test]
    fn text_is_delivered_even_when_percentage_holds() {
        let mut p = TranscriptParser::new(120.0, 16, 98);
        p.consume_line("[00:00.000 --> 01:00.000] a").unwrap();
        // An out-of-order earlier segment: no percentage, but text survives.
        let upd = p.consume_line("[00:00.000 --> 00:30.000] b").unwrap();
        assert_eq!(upd.percentage, None);
        assert_eq!(upd.text.as_deref(), Some("b"));
    }

    #[test]
    fn percentage_is_monotonic_over_a_synthetic_run() {
        let mut p = TranscriptParser::new(300.0, 16, 98);
        let mut last = 0u8;
        for i in 1..=20 {
            let sec = i * 15;
            let line = format!(
                "[{:02}:{:02}.000 --> {:02}:{:02}.000] seg",
                (sec - 15) / 60,
                (sec - 15) % 60,
                sec / 60,
                sec % 60
            );
            if let Some(p) = p.consume_line(&line).and_then(|u| u.percentage) {
                assert!(p >= last, "regressed from {last} to {p}");
                assert!(p <= 98);
                last = p;
            }
        }
        assert_eq!(last, 98);
    }

    #[test]
    fn non_segment_lines_are_ignored() {
        let mut p = TranscriptParser::new(120.0, 16, 98);
        assert!(p.consume_line("Detecting language...").is_none());
        assert!(p.consume_line("[info] model loaded").is_none());
    }

    #[test]
    fn segment_without_text_reports_progress_only() {
        let mut p = TranscriptParser::new(120.0, 16, 98);
        let upd = p.consume_line("[00:00.000 --> 00:30.000]   ").unwrap();
        assert!(upd.text.is_none());
        assert_eq!(upd.percentage, Some(36));
    }
}
