//! Text rendering of the ticker strip, the active table and the detail pane.
use std::fmt::Write;

use chrono::Local;
use livequote_store::{Quote, ViewTab};

/// Formats a number with thousands separators and a fixed number of
/// decimals. Absent or non-finite values render as `-`.
pub fn format_number(value: Option<f64>, decimals: usize) -> String {
    let Some(value) = value.filter(|v| v.is_finite()) else {
        return "-".to_string();
    };
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    let is_zero = fixed.bytes().all(|b| b == b'0' || b == b'.');
    if value < 0.0 && !is_zero {
        grouped.push('-');
    }
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if let Some(frac_part) = frac_part {
        grouped.push('.');
        grouped.push_str(frac_part);
    }
    grouped
}

/// Formats a ratio as a percentage with two decimals.
pub fn format_percent(ratio: Option<f64>) -> String {
    match ratio.filter(|r| r.is_finite()) {
        Some(r) => format!("{}%", format_number(Some(r * 100.0), 2)),
        None => "-".to_string(),
    }
}

fn arrow(quote: &Quote) -> &'static str {
    match quote.is_rising() {
        Some(true) => "▲",
        Some(false) => "▼",
        None => " ",
    }
}

fn label(quote: &Quote) -> &str {
    quote.title().unwrap_or(quote.id().as_str())
}

/// One line per ticker quote: `title last arrow change%`.
pub fn ticker_line(quotes: &[Quote]) -> String {
    quotes
        .iter()
        .map(|q| {
            let digits = q.precision() as usize;
            format!(
                "{} {} {}{}",
                label(q),
                format_number(q.fields().last, digits),
                arrow(q),
                format_percent(q.change_ratio())
            )
        })
        .collect::<Vec<_>>()
        .join("  |  ")
}

/// The active tab's table. `is_favorite` decides the star column.
pub fn table(tab: ViewTab, quotes: &[Quote], is_favorite: impl Fn(&Quote) -> bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[{}] {} rows, updated {}", tab, quotes.len(), Local::now().format("%H:%M:%S"));
    let _ = writeln!(
        out,
        "{:<2}{:<24}{:>14}{:>10}{:>12}{:>14}{:>14}{:>14}{:>14}",
        "", "Symbol", "End", "Diff %", "Diff", "Buying", "Selling", "D. High", "D. Low"
    );
    for quote in quotes {
        let digits = quote.precision() as usize;
        let fields = quote.fields();
        let _ = writeln!(
            out,
            "{:<2}{:<24}{:>14}{:>10}{:>12}{:>14}{:>14}{:>14}{:>14}",
            if is_favorite(quote) { "*" } else { "" },
            label(quote),
            format_number(fields.last, digits),
            format!("{}{}", arrow(quote), format_percent(quote.change_ratio())),
            format_number(fields.change, digits),
            format_number(fields.bid, digits),
            format_number(fields.ask, digits),
            format_number(fields.day_high, digits),
            format_number(fields.day_low, digits),
        );
    }
    out
}

/// Detail pane with the period aggregates.
pub fn detail(quote: &Quote) -> String {
    let digits = quote.precision() as usize;
    let f = quote.fields();
    let mut out = String::new();
    let _ = writeln!(out, "== {} ({}) ==", label(quote), quote.id());
    if let Some(def) = quote.definition() {
        let _ = writeln!(
            out,
            "code {}  currency {}  legacy {}",
            def.code.as_deref().unwrap_or("-"),
            def.currency.as_deref().unwrap_or("-"),
            def.legacy_code.as_deref().unwrap_or("-")
        );
    }
    let _ = writeln!(
        out,
        "last {}  bid {}  ask {}  prev close {}",
        format_number(f.last, digits),
        format_number(f.bid, digits),
        format_number(f.ask, digits),
        format_number(f.close, digits)
    );
    for (name, high, low, percent) in [
        ("day", f.day_high, f.day_low, quote.change_ratio().map(|r| r * 100.0)),
        ("week", f.week_high, f.week_low, f.week_percent),
        ("month", f.month_high, f.month_low, f.month_percent),
        ("year", f.year_high, f.year_low, f.year_percent),
    ] {
        let _ = writeln!(
            out,
            "{:<6} high {:>14} low {:>14} change {:>8}%",
            name,
            format_number(high, digits),
            format_number(low, digits),
            format_number(percent, 2)
        );
    }
    if let Some(time) = &f.event_time {
        let _ = writeln!(out, "as of {}", time);
    }
    out
}
