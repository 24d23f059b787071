//! Unit Conversions
//!
//! Scaling rules for displaying on-chain integers. These must stay
//! bit-for-bit identical to what the published C3 readers print, so every
//! conversion is a single integer-to-float cast followed by one division.

use chrono::{DateTime, Utc};

use crate::constants::units::*;
use crate::errors::{FeedError, FeedResult};

/// 6-decimal fixed point to display units (1_500_000 -> 1.5)
pub fn fixed_point_to_f64(raw: i64) -> f64 {
    raw as f64 / PRICE_PRECISION as f64
}

/// Millisecond duration to minutes, not rounded (90_000 -> 1.5)
pub fn millis_to_minutes(millis: i64) -> f64 {
    millis as f64 / MILLIS_PER_MINUTE as f64
}

/// Percentage stored times 100 to percent (250 -> 2.5)
pub fn basis_points_to_percent(raw: i64) -> f64 {
    raw as f64 / BASIS_POINTS_PER_PERCENT as f64
}

/// Milliseconds since the Unix epoch to UTC calendar time, truncated to
/// whole seconds
pub fn millis_to_datetime(millis: i64) -> FeedResult<DateTime<Utc>> {
    let seconds = millis.div_euclid(MILLIS_PER_SECOND);
    DateTime::from_timestamp(seconds, 0).ok_or_else(|| FeedError::InvalidInput {
        param: "timestamp",
        reason: format!("{millis} ms is outside the representable calendar range"),
    })
}

/// `YYYY-MM-DD HH:MM:SS` rendering of a millisecond timestamp (UTC)
pub fn format_timestamp(millis: i64) -> FeedResult<String> {
    Ok(millis_to_datetime(millis)?.format(TIMESTAMP_FORMAT).to_string())
}
