//! Parsing of the engine's bracketed console readout.
//!
//! A readout line looks like
//! `[#2089b0 400.0KiB/33.2MiB(1%) CN:1 DL:115.7KiB ETA:4m51s]`.
//! The CN/DL/ETA fields disappear at zero speed, so they are optional here.

use regex::Regex;
use std::sync::OnceLock;

fn readout_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\[#(?P<gid>[0-9a-f]+)\s+(?P<done>[0-9.]+[a-z]*)/(?P<total>[0-9.]+[a-z]*)\((?P<pct>\d+)%\)(?:\s+CN:(?P<cn>\d+))?(?:\s+DL:(?P<dl>[0-9.]+[a-z]*))?(?:\s+ETA:(?P<eta>[^\]\s]+))?\]",
        )
        .expect("valid readout pattern")
    })
}

/// One parsed readout line, fields as printed by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadoutLine {
    pub gid: String,
    pub bytes_done: u64,
    /// None while the engine reports 0 (size not known yet).
    pub total_bytes: Option<u64>,
    pub percent: Option<u32>,
    pub connections: Option<u32>,
    pub bytes_per_sec: Option<u64>,
    pub eta_secs: Option<u64>,
}

/// Parses a single engine output line; None for anything that is not a
/// readout or whose byte count cannot be read.
pub fn parse_readout(line: &str) -> Option<ReadoutLine> {
    let caps = readout_re().captures(line)?;
    let bytes_done = parse_size(caps.name("done")?.as_str())?;
    let total_bytes = parse_size(caps.name("total")?.as_str()).filter(|b| *b > 0);
    Some(ReadoutLine {
        gid: caps.name("gid")?.as_str().to_string(),
        bytes_done,
        total_bytes,
        percent: caps.name("pct").and_then(|m| m.as_str().parse().ok()),
        connections: caps.name("cn").and_then(|m| m.as_str().parse().ok()),
        bytes_per_sec: caps.name("dl").and_then(|m| parse_size(m.as_str())),
        eta_secs: caps.name("eta").and_then(|m| parse_eta(m.as_str())),
    })
}

fn size_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(?P<num>[0-9]+(?:\.[0-9]+)?)\s*(?P<unit>[kmgt]?i?b)?\s*$")
            .expect("valid size pattern")
    })
}

/// Parses an engine-formatted size such as "400.0KiB", "33.2MiB" or "0B"
/// into bytes. Units are binary (KiB = 1024).
pub fn parse_size(s: &str) -> Option<u64> {
    let caps = size_re().captures(s)?;
    let value: f64 = caps.name("num")?.as_str().parse().ok()?;
    let mult = match caps
        .name("unit")
        .and_then(|m| m.as_str().chars().next())
        .map(|c| c.to_ascii_lowercase())
    {
        Some('k') => 1024.0,
        Some('m') => 1024.0 * 1024.0,
        Some('g') => 1024.0 * 1024.0 * 1024.0,
        Some('t') => 1024.0 * 1024.0 * 1024.0 * 1024.0,
        _ => 1.0,
    };
    Some((value * mult).round() as u64)
}

/// Parses an engine ETA such as "4m51s", "2h", "1d3h" or a bare number of
/// seconds into seconds.
pub fn parse_eta(s: &str) -> Option<u64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let mut total: u64 = 0;
    let mut num: u64 = 0;
    let mut have_digits = false;
    for c in s.chars() {
        if let Some(d) = c.to_digit(10) {
            num = num.saturating_mul(10).saturating_add(u64::from(d));
            have_digits = true;
            continue;
        }
        if !have_digits {
            return None;
        }
        let mult = match c.to_ascii_lowercase() {
            'd' => 86_400,
            'h' => 3_600,
            'm' => 60,
            's' => 1,
            _ => return None,
        };
        total = total.saturating_add(num.saturating_mul(mult));
        num = 0;
        have_digits = false;
    }
    if have_digits {
        total = total.saturating_add(num);
    }
    Some(total)
}
