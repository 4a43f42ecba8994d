//! Date fields of a challenge code.
//!
//! Users write `day/month/year`, `month/day/year` or ISO dates. Everything valid
//! is written back as ISO; the `DD/MM/YYYY` placeholder is left as is.

use chrono::NaiveDate;

pub const PLACEHOLDER: &str = "DD/MM/YYYY";

pub fn is_placeholder(value: &str) -> bool {
    value.contains("DD")
}

/// Normalize to `YYYY-MM-DD`. `None` when the value is neither a placeholder nor a date.
pub fn normalize(value: &str) -> Option<String> {
    let value = value.trim();
    if is_placeholder(value) {
        return Some(value.to_string());
    }
    parse(value).map(|d| d.format("%Y-%m-%d").to_string())
}

/// Like [`normalize`] but keeps unreadable input; used when writing.
pub fn normalize_or_keep(value: &str) -> String {
    normalize(value).unwrap_or_else(|| value.trim().to_string())
}

fn parse(value: &str) -> Option<NaiveDate> {
    if value.contains('-') {
        return NaiveDate::parse_from_str(value, "%Y-%m-%d").ok();
    }

    let mut parts = value.split('/');
    let a: u32 = parts.next()?.parse().ok()?;
    let b: u32 = parts.next()?.parse().ok()?;
    let year_part = parts.next()?;
    if parts.next().is_some() || year_part.len() != 4 {
        return None;
    }
    let year: i32 = year_part.parse().ok()?;

    let (day, month) = if a > 12 {
        (a, b)
    } else if b > 12 {
        (b, a)
    } else {
        (a, b)
    };
    NaiveDate::from_ymd_opt(year, month, day)
}
