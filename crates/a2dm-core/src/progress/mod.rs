//! Progress telemetry from the engine's stdout readout.
//!
//! The engine prints a bracketed readout line about once a second; `parse`
//! turns one line into a [`ReadoutLine`] and [`ProgressFeed`] folds those into
//! the latest [`ProgressSnapshot`] for a task. Snapshots are advisory: they
//! drive display and history notes, never completion or failure decisions.

mod parse;

pub use parse::{parse_eta, parse_readout, parse_size, ReadoutLine};

use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Non-readout engine output retained per run for the task history.
const OUTPUT_BUFFER_LINES: usize = 200;

/// Latest known progress of one engine run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    /// Bytes downloaded so far, including bytes recovered from a checkpoint.
    pub bytes_done: u64,
    /// Total size if the engine knows it (None until the first sized readout).
    pub total_bytes: Option<u64>,
    /// Current download rate in bytes per second.
    pub bytes_per_sec: u64,
    /// Engine's remaining-time estimate in seconds.
    pub eta_secs: Option<u64>,
    /// Active connections.
    pub connections: u32,
    /// Unix timestamp of the readout this snapshot came from.
    pub updated_at: i64,
}

impl ProgressSnapshot {
    /// Fraction complete in [0.0, 1.0]; None while the total is unknown.
    pub fn fraction(&self) -> Option<f64> {
        match self.total_bytes {
            Some(total) if total > 0 => {
                Some((self.bytes_done as f64 / total as f64).min(1.0))
            }
            _ => None,
        }
    }
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.total_bytes {
            Some(total) => write!(
                f,
                "{} / {} ({:.1}%)",
                format_bytes(self.bytes_done),
                format_bytes(total),
                self.fraction().unwrap_or(0.0) * 100.0
            )?,
            None => write!(f, "{} / ?", format_bytes(self.bytes_done))?,
        }
        write!(f, " {}/s", format_bytes(self.bytes_per_sec))?;
        match self.eta_secs {
            Some(eta) => write!(f, " ETA {}", format_eta(eta)),
            None => write!(f, " ETA ?"),
        }
    }
}

/// Human-readable byte count with binary units.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Compact h/m/s rendering of a duration in seconds.
pub fn format_eta(secs: u64) -> String {
    if secs >= 3600 {
        format!("{}h{}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m{}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}

/// Shared sink the engine output readers write into and the monitor samples.
///
/// One feed belongs to exactly one engine run; a respawned task gets a fresh
/// feed, so `bytes_done` is monotonic within a run by construction here and
/// across runs because the engine resumes counting from its checkpoint.
#[derive(Debug)]
pub struct ProgressFeed {
    latest: Mutex<Option<ProgressSnapshot>>,
    output: Mutex<VecDeque<String>>,
}

impl ProgressFeed {
    pub fn new() -> Self {
        Self {
            latest: Mutex::new(None),
            output: Mutex::new(VecDeque::new()),
        }
    }

    /// Folds one parsed readout into the latest snapshot.
    pub(crate) fn record_readout(&self, line: ReadoutLine) {
        let mut latest = self.latest.lock().unwrap();
        let prev = latest.as_ref();
        let snap = ProgressSnapshot {
            bytes_done: line
                .bytes_done
                .max(prev.map(|s| s.bytes_done).unwrap_or(0)),
            total_bytes: line
                .total_bytes
                .or_else(|| prev.and_then(|s| s.total_bytes)),
            bytes_per_sec: line.bytes_per_sec.unwrap_or(0),
            eta_secs: line.eta_secs,
            connections: line.connections.unwrap_or(0),
            updated_at: now_unix(),
        };
        *latest = Some(snap);
    }

    /// Buffers one non-readout output line, dropping the oldest at capacity.
    pub(crate) fn record_output(&self, line: String) {
        let mut output = self.output.lock().unwrap();
        if output.len() == OUTPUT_BUFFER_LINES {
            output.pop_front();
        }
        output.push_back(line);
    }

    /// Copy of the latest snapshot, if any readout parsed yet.
    pub fn sample(&self) -> Option<ProgressSnapshot> {
        self.latest.lock().unwrap().clone()
    }

    /// Takes all buffered output lines in arrival order.
    pub fn drain_output(&self) -> Vec<String> {
        self.output.lock().unwrap().drain(..).collect()
    }
}

impl Default for ProgressFeed {
    fn default() -> Self {
        Self::new()
    }
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn readout(bytes_done: u64, total: Option<u64>) -> ReadoutLine {
        ReadoutLine {
            gid: "deadbeef".to_string(),
            bytes_done,
            total_bytes: total,
            percent: None,
            connections: Some(4),
            bytes_per_sec: Some(1024),
            eta_secs: Some(10),
        }
    }

    #[test]
    fn feed_keeps_latest_snapshot() {
        let feed = ProgressFeed::new();
        assert!(feed.sample().is_none());
        feed.record_readout(readout(100, Some(1000)));
        feed.record_readout(readout(400, Some(1000)));
        let snap = feed.sample().unwrap();
        assert_eq!(snap.bytes_done, 400);
        assert_eq!(snap.total_bytes, Some(1000));
    }

    #[test]
    fn bytes_done_never_regresses_within_a_run() {
        let feed = ProgressFeed::new();
        feed.record_readout(readout(600, Some(1000)));
        feed.record_readout(readout(550, Some(1000)));
        assert_eq!(feed.sample().unwrap().bytes_done, 600);
    }

    #[test]
    fn total_survives_a_sizeless_readout() {
        let feed = ProgressFeed::new();
        feed.record_readout(readout(100, Some(1000)));
        feed.record_readout(readout(200, None));
        assert_eq!(feed.sample().unwrap().total_bytes, Some(1000));
    }

    #[test]
    fn output_buffer_drains_in_order() {
        let feed = ProgressFeed::new();
        feed.record_output("first".to_string());
        feed.record_output("second".to_string());
        assert_eq!(feed.drain_output(), vec!["first", "second"]);
        assert!(feed.drain_output().is_empty());
    }

    #[test]
    fn output_buffer_drops_oldest_at_capacity() {
        let feed = ProgressFeed::new();
        for i in 0..(OUTPUT_BUFFER_LINES + 5) {
            feed.record_output(format!("line {i}"));
        }
        let lines = feed.drain_output();
        assert_eq!(lines.len(), OUTPUT_BUFFER_LINES);
        assert_eq!(lines[0], "line 5");
    }

    #[test]
    fn fraction_handles_unknown_and_zero_total() {
        let snap = ProgressSnapshot {
            bytes_done: 50,
            total_bytes: None,
            bytes_per_sec: 0,
            eta_secs: None,
            connections: 0,
            updated_at: 0,
        };
        assert!(snap.fraction().is_none());
        let zero = ProgressSnapshot {
            total_bytes: Some(0),
            ..snap
        };
        assert!(zero.fraction().is_none());
    }

    #[test]
    fn display_formats_sized_and_unsized() {
        let snap = ProgressSnapshot {
            bytes_done: 512 * 1024,
            total_bytes: Some(2 * 1024 * 1024),
            bytes_per_sec: 1024 * 1024,
            eta_secs: Some(95),
            connections: 4,
            updated_at: 0,
        };
        assert_eq!(snap.to_string(), "512.0 KiB / 2.0 MiB (25.0%) 1.0 MiB/s ETA 1m35s");
        let unsized_snap = ProgressSnapshot {
            total_bytes: None,
            eta_secs: None,
            ..snap
        };
        assert_eq!(unsized_snap.to_string(), "512.0 KiB / ? 1.0 MiB/s ETA ?");
    }

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(999), "999 B");
        assert_eq!(format_bytes(1024), "1.0 KiB");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.0 GiB");
    }
}
