//! Date, currency, and CSV formatting helpers.

use chrono::{DateTime, Utc};

/// `YYYY-MM-DD`, the row-level date format used in CSV and table output.
pub fn date_ymd(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}

/// `MM/DD/YYYY`, the campaign-summary date format.
pub fn date_mdy(ts: DateTime<Utc>) -> String {
    ts.format("%m/%d/%Y").to_string()
}

/// Round to cents.
pub fn currency(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Ratio to percentage with two decimals (`0.0345` becomes `3.45`).
pub fn percent(ratio: f64) -> f64 {
    (ratio * 10_000.0).round() / 100.0
}

/// Join cells into one CRLF-terminated CSV line.
pub fn csv_line<I>(cells: I) -> String
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut line = String::new();
    for (i, cell) in cells.into_iter().enumerate() {
        if i > 0 {
            line.push(',');
        }
        line.push_str(cell.as_ref());
    }
    line.push_str("\r\n");
    line
}
