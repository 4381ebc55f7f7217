//! Shared helper functions for CLI commands

use console::{style, StyledObject};

/// Format a value with `digits` significant digits; NaN prints as "n/a"
pub fn format_sig(value: f64, digits: usize) -> String {
    if value.is_nan() {
        return "n/a".to_string();
    }
    if value == 0.0 || !value.is_finite() {
        return format!("{}", value);
    }
    let magnitude = value.abs().log10().floor() as i32;
    if !(-4..=9).contains(&magnitude) {
        return format!("{:.*e}", digits.saturating_sub(1), value);
    }
    let decimals = (digits as i32 - 1 - magnitude).max(0) as usize;
    format!("{:.*}", decimals, value)
}

/// Four significant digits, the default for result tables
pub fn format_value(value: f64) -> String {
    format_sig(value, 4)
}

/// Percentage with two decimals
pub fn format_percent(value: f64) -> String {
    if value.is_nan() {
        "n/a".to_string()
    } else {
        format!("{:.2}%", value)
    }
}

/// Share of variance colored by size, as in the sensitivity listing
pub fn styled_share(pct: f64) -> StyledObject<String> {
    let text = format!("{:5.1}%", pct);
    if pct >= 50.0 {
        style(text).red().bold()
    } else if pct >= 25.0 {
        style(text).yellow()
    } else {
        style(text).dim()
    }
}

/// Bar of up to 30 blocks for a percentage
pub fn share_bar(pct: f64) -> String {
    if !pct.is_finite() {
        return String::new();
    }
    let len = ((pct.clamp(0.0, 100.0) / 100.0) * 30.0).round() as usize;
    "█".repeat(len)
}
