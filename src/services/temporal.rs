// Fractional-second rounding and instant formatting
//
// Shared by the value codec and the boundary validator so INSERT- and
// CTAS-initiated writes produce the same literal for the same instant.

use crate::models::{CodecKind, EngineValue, TimestampValue, PICOS_PER_DAY, PICOS_PER_SECOND};
use chrono::{DateTime, FixedOffset, Utc};

/// Round an instant to `precision` fractional digits (0..=12), half up on
/// the digit after the kept ones, carrying through seconds, minutes, hours
/// and the date. Returns (epoch seconds, picoseconds of second); the
/// picosecond part is a multiple of the kept unit.
pub fn round_instant(epoch_micros: i64, picos_of_micro: u32, precision: u8) -> (i64, u64) {
    let mut seconds = epoch_micros.div_euclid(1_000_000);
    let micros_of_second = epoch_micros.rem_euclid(1_000_000) as u64;
    let picos = micros_of_second * 1_000_000 + picos_of_micro as u64;
    let unit = 10_u64.pow(12 - precision.min(12) as u32);
    let mut rounded = (picos + unit / 2) / unit * unit;
    if rounded >= PICOS_PER_SECOND {
        seconds += 1;
        rounded -= PICOS_PER_SECOND;
    }
    (seconds, rounded)
}

/// Format a rounded instant as remote wall-clock text,
/// `YYYY-MM-DD HH:MM:SS[.f…]` with exactly `precision` fractional digits.
/// Returns None for instants outside the formattable calendar.
pub fn format_instant(epoch_seconds: i64, picos_of_second: u64, precision: u8) -> Option<String> {
    let datetime = DateTime::<Utc>::from_timestamp(epoch_seconds, 0)?;
    let mut text = datetime.format("%Y-%m-%d %H:%M:%S").to_string();
    if precision > 0 {
        let digits = picos_of_second / 10_u64.pow(12 - precision.min(12) as u32);
        text.push_str(&format!(".{:0width$}", digits, width = precision as usize));
    }
    Some(text)
}

/// Round a time of day the same way; 24:00:00 wraps to 00:00:00.
pub fn round_time(picos_of_day: u64, precision: u8) -> u64 {
    let unit = 10_u64.pow(12 - precision.min(12) as u32);
    ((picos_of_day + unit / 2) / unit * unit) % PICOS_PER_DAY
}

/// Format a rounded time of day as `HH:MM:SS[.f…]`.
pub fn format_time(picos_of_day: u64, precision: u8) -> String {
    let seconds = picos_of_day / PICOS_PER_SECOND;
    let mut text = format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    );
    if precision > 0 {
        let digits = (picos_of_day % PICOS_PER_SECOND) / 10_u64.pow(12 - precision.min(12) as u32);
        text.push_str(&format!(".{:0width$}", digits, width = precision as usize));
    }
    text
}

/// The UTC instant a temporal engine value writes as, given the target
/// column's codec kind. Zone-less values bound for the UTC-normalized remote
/// family are interpreted in the session zone; zoned values are already
/// absolute and only need their presentation zone dropped.
pub fn write_instant(
    codec: CodecKind,
    value: &EngineValue,
    session_offset: FixedOffset,
) -> Option<TimestampValue> {
    match (codec, value) {
        (CodecKind::Timestamp, EngineValue::Timestamp(ts)) => Some(*ts),
        (CodecKind::Timestamp, EngineValue::TimestampWithZone(ts)) => Some(ts.instant()),
        (CodecKind::ZonedTimestamp, EngineValue::TimestampWithZone(ts)) => Some(ts.instant()),
        (CodecKind::ZonedTimestamp, EngineValue::Timestamp(ts)) => Some(TimestampValue::new(
            ts.epoch_micros - session_offset.local_minus_utc() as i64 * 1_000_000,
            ts.picos_of_micro,
        )),
        _ => None,
    }
}
