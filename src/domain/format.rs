//! Display formatting shared by the CLI tables and exports.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Shown for missing names, customers and timestamps.
pub const PLACEHOLDER: &str = "—";

/// Indonesian rupiah without decimals, e.g. `Rp 1.234.567`.
pub fn format_idr(amount: f64) -> String {
    if !amount.is_finite() {
        return format!("Rp {amount}");
    }
    let rounded = amount.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{sign}Rp {}", group_thousands(rounded.abs() as u64, '.'))
}

/// `05 Mar 2026`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d %b %Y").to_string()
}

/// `05 Mar 2026, 14:30`
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%d %b %Y, %H:%M").to_string()
}

pub fn format_optional_timestamp(ts: Option<DateTime<Utc>>) -> String {
    ts.map(format_timestamp)
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Reads a stored timestamp. Accepts RFC 3339, the PostgreSQL text form
/// (`2026-03-05 14:30:00.123+00`), a naive `YYYY-MM-DD HH:MM:SS` taken as UTC,
/// or a bare date at midnight UTC. Blank input is `None`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(ts.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn group_thousands(n: u64, sep: char) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(ch);
    }
    out
}
