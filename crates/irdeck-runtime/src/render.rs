//! Display helpers for CLI output: timestamps, flags, and simple tables.

use chrono::{DateTime, Utc};

/// Format epoch seconds (fractional) as a local-agnostic UTC timestamp.
/// Out-of-range values fall back to the raw number.
pub fn format_epoch(secs: f64) -> String {
    let millis = (secs * 1000.0) as i64;
    match DateTime::<Utc>::from_timestamp_millis(millis) {
        Some(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => format!("{secs}"),
    }
}

pub fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

/// Option display with a `-` placeholder.
pub fn dash<T: std::fmt::Display>(value: Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "-".to_owned(),
    }
}

/// Left-pad-free fixed-width column join for plain table output.
pub fn row(cells: &[(&str, usize)]) -> String {
    let mut out = String::new();
    let last = cells.len().saturating_sub(1);
    for (i, (cell, width)) in cells.iter().enumerate() {
        if i == last {
            out.push_str(cell);
        } else {
            out.push_str(&format!("{cell:<width$}  "));
        }
    }
    out.trim_end().to_owned()
}

pub fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(_) => println!("{value}"),
    }
}

// ─── Tests ────────────────────────────────────────────────────────
