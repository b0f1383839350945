//! Fixed-width field formatting primitives.
//!
//! All CWR fields reduce to a few encodings:
//!
//! - alphanumeric: left-justified, space-padded, truncated, uppercased
//! - numeric: right-justified, zero-padded
//! - share: a fraction in `[0, 1]` scaled by 10000, rounded half-up,
//!   printed as five zero-padded digits (`0.3333` -> `"03333"`)
//! - date `YYYYMMDD` and time/duration `HHMMSS`, all-zero when absent
//!
//! Missing optional values substitute the filler for their kind (spaces
//! for alpha, zeros for numeric) so column offsets never shift.

use chrono::{NaiveDate, Timelike};

use crate::error::{FieldError, FieldResult};

/// Format an alphanumeric field: uppercase, truncate, left-justify.
pub fn alpha(value: &str, width: usize) -> String {
    let upper = value.to_uppercase();
    let truncated: String = upper.chars().take(width).collect();
    format!("{:<width$}", truncated)
}

/// Format an optional alphanumeric field, blank when absent.
pub fn opt_alpha(value: Option<&str>, width: usize) -> String {
    alpha(value.unwrap_or(""), width)
}

/// Format an unsigned numeric field, zero-padded.
pub fn numeric(value: u64, width: usize) -> String {
    format!("{:0>width$}", value)
}

/// Encode a share fraction in `[0, 1]` as five digits of basis points
/// times ten (`1.0` -> `"10000"`, `0.3333` -> `"03333"`).
pub fn share(fraction: f64) -> String {
    let clamped = fraction.clamp(0.0, 1.0);
    // .round() is half-away-from-zero, which is half-up for non-negatives.
    let scaled = (clamped * 10000.0).round() as u64;
    numeric(scaled, 5)
}

/// Decode a five-digit share field back to a percentage with two
/// decimals (`"05000"` -> `50.0`, `"03333"` -> `33.33`).
pub fn decode_share(field: &str) -> FieldResult<f64> {
    if field.len() != 5 || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FieldError::BadFormat {
            field: "share",
            value: field.to_string(),
        });
    }
    let scaled: u32 = field.parse().expect("all digits");
    Ok(f64::from(scaled) / 100.0)
}

/// Format a date as `YYYYMMDD`, all zeros when absent.
pub fn date(value: Option<NaiveDate>) -> String {
    match value {
        Some(d) => d.format("%Y%m%d").to_string(),
        None => "00000000".into(),
    }
}

/// Format a time of day as `HHMMSS`, all zeros when absent.
pub fn time(value: Option<chrono::NaiveTime>) -> String {
    match value {
        Some(t) => format!("{:02}{:02}{:02}", t.hour(), t.minute(), t.second()),
        None => "000000".into(),
    }
}

/// Format a duration in seconds as `HHMMSS`, all zeros when absent.
pub fn duration(seconds: Option<u32>) -> String {
    match seconds {
        Some(s) => format!("{:02}{:02}{:02}", s / 3600, (s % 3600) / 60, s % 60),
        None => "000000".into(),
    }
}

/// Format a boolean flag: `Y`, `N`, or `U` when unknown.
pub fn flag(value: Option<bool>) -> String {
    match value {
        Some(true) => "Y".into(),
        Some(false) => "N".into(),
        None => "U".into(),
    }
}

/// The 19-character record prefix: type code, transaction sequence and
/// record sequence.
pub fn prefix(record_type: &str, transaction_seq: u32, record_seq: u32) -> String {
    debug_assert_eq!(record_type.len(), 3);
    format!(
        "{}{}{}",
        record_type,
        numeric(u64::from(transaction_seq), 8),
        numeric(u64::from(record_seq), 8)
    )
}

/// Length of the record prefix shared by all transaction records.
pub const PREFIX_LEN: usize = 19;
