//! Wall-clock helpers for experiment timestamps.
//!
//! Timestamps are truncated to microseconds, the precision `PostgreSQL`
//! stores, so a value read back from the database equals the value the
//! engine produced and `duration_seconds` is exactly `end - start`.

use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;

/// Decimal places of `duration_seconds`.
pub const DURATION_SCALE: u32 = 6;

/// The current time at microsecond precision.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// `end - start` in seconds with microsecond scale.
///
/// A negative interval (clock stepped backwards) is clamped to zero.
pub fn elapsed_seconds(start: DateTime<Utc>, end: DateTime<Utc>) -> Decimal {
    let micros = end
        .signed_duration_since(start)
        .num_microseconds()
        .unwrap_or(i64::MAX)
        .max(0);
    Decimal::new(micros, DURATION_SCALE)
}
