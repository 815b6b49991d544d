//! Duration text parsing and formatting
//!
//! Accepts a sequence of decimal numbers with unit suffixes such as `300ms`,
//! `1.5h` or `2h45m`. Formats back to the compact `1h2m3.5s` form.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Write;
use std::time::Duration;

/// Whole-string shape check; components are extracted by [`COMPONENT`].
static DURATION_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?:\d+(?:\.\d*)?|\.\d+)(?:ns|us|µs|μs|ms|s|m|h))+$").unwrap()
});

static COMPONENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d*)?|\.\d+)(ns|us|µs|μs|ms|s|m|h)").unwrap());

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;

fn unit_nanos(unit: &str) -> Option<u128> {
    let nanos = match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => NANOS_PER_MICRO,
        "ms" => NANOS_PER_MILLI,
        "s" => NANOS_PER_SEC,
        "m" => 60 * NANOS_PER_SEC,
        "h" => 3_600 * NANOS_PER_SEC,
        _ => return None,
    };
    Some(nanos)
}

/// Parse a duration such as `1h30m` or `250ms`.
///
/// Returns `None` for malformed text, for values that overflow, and for
/// negative durations other than zero.
pub fn parse_duration(text: &str) -> Option<Duration> {
    let (negative, body) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    if body == "0" {
        return Some(Duration::ZERO);
    }
    if !DURATION_SHAPE.is_match(body) {
        return None;
    }

    let mut total: u128 = 0;
    for caps in COMPONENT.captures_iter(body) {
        let unit = unit_nanos(&caps[2])?;
        let (whole, frac) = match caps[1].split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (&caps[1], ""),
        };

        let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
        let mut nanos = whole.checked_mul(unit)?;

        if !frac.is_empty() {
            // Beyond 18 digits the fraction cannot change a nanosecond count.
            let digits = &frac[..frac.len().min(18)];
            let scale = 10u128.pow(digits.len() as u32);
            let value: u128 = digits.parse().ok()?;
            nanos = nanos.checked_add(value * unit / scale)?;
        }

        total = total.checked_add(nanos)?;
    }

    if negative && total != 0 {
        return None;
    }

    let nanos = u64::try_from(total).ok()?;
    Some(Duration::from_nanos(nanos))
}

/// Render a duration in the compact form accepted by [`parse_duration`].
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < NANOS_PER_MICRO {
        return format!("{nanos}ns");
    }
    if nanos < NANOS_PER_MILLI {
        return format!("{}µs", decimal(nanos, NANOS_PER_MICRO));
    }
    if nanos < NANOS_PER_SEC {
        return format!("{}ms", decimal(nanos, NANOS_PER_MILLI));
    }

    let total_secs = nanos / NANOS_PER_SEC;
    let hours = total_secs / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let secs_nanos = (total_secs % 60) * NANOS_PER_SEC + nanos % NANOS_PER_SEC;

    let mut out = String::new();
    if hours > 0 {
        let _ = write!(out, "{hours}h");
    }
    if hours > 0 || minutes > 0 {
        let _ = write!(out, "{minutes}m");
    }
    let _ = write!(out, "{}s", decimal(secs_nanos, NANOS_PER_SEC));
    out
}

/// `value / unit` as a decimal with trailing zeros trimmed.
fn decimal(value: u128, unit: u128) -> String {
    let whole = value / unit;
    let rem = value % unit;
    if rem == 0 {
        return whole.to_string();
    }
    let width = unit.to_string().len() - 1;
    let frac = format!("{rem:0width$}");
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}
