// Value representations on both sides of the connector boundary
use anyhow::{bail, Context};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A raw value as materialized from the remote result set. Mirrors the
/// shapes the remote wire protocol produces before any engine typing is
/// applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RemoteValue {
    Null,
    Int(i64),
    UInt(u64),
    Float(f32),
    Double(f64),
    Bytes(Vec<u8>),
    Date {
        year: i32,
        month: u32,
        day: u32,
    },
    DateTime {
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
        micro: u32,
    },
    Time {
        negative: bool,
        hour: u32,
        minute: u32,
        second: u32,
        micro: u32,
    },
}

/// A typed engine-side value, one variant per engine type kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineValue {
    Null,
    Boolean(bool),
    TinyInt(i8),
    SmallInt(i16),
    Integer(i32),
    BigInt(i64),
    Decimal(DecimalValue),
    Real(f32),
    Double(f64),
    Varchar(String),
    Varbinary(Vec<u8>),
    Date(NaiveDate),
    Time(TimeValue),
    Timestamp(TimestampValue),
    TimestampWithZone(ZonedTimestampValue),
    Json(serde_json::Value),
}

impl EngineValue {
    /// The value as an exact integer, when it has one. Zero-scale decimals
    /// count: the widened form of the remote unsigned 64-bit type is a
    /// decimal carrying an integer.
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            EngineValue::TinyInt(v) => Some(*v as i128),
            EngineValue::SmallInt(v) => Some(*v as i128),
            EngineValue::Integer(v) => Some(*v as i128),
            EngineValue::BigInt(v) => Some(*v as i128),
            EngineValue::Decimal(decimal) if decimal.scale == 0 => Some(decimal.unscaled),
            _ => None,
        }
    }
}

impl fmt::Display for EngineValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineValue::Null => write!(f, "NULL"),
            EngineValue::Boolean(v) => write!(f, "{}", v),
            EngineValue::TinyInt(v) => write!(f, "{}", v),
            EngineValue::SmallInt(v) => write!(f, "{}", v),
            EngineValue::Integer(v) => write!(f, "{}", v),
            EngineValue::BigInt(v) => write!(f, "{}", v),
            EngineValue::Decimal(v) => write!(f, "{}", v),
            EngineValue::Real(v) => write!(f, "{}", v),
            EngineValue::Double(v) => write!(f, "{}", v),
            EngineValue::Varchar(v) => write!(f, "'{}'", v),
            EngineValue::Varbinary(v) => {
                for byte in v {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            EngineValue::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            EngineValue::Time(v) => write!(f, "{}", v),
            EngineValue::Timestamp(v) => write!(f, "{}", v),
            EngineValue::TimestampWithZone(v) => write!(f, "{}", v),
            EngineValue::Json(v) => write!(f, "{}", v),
        }
    }
}

/// An exact decimal: unscaled value with precision and scale. The same
/// 128-bit unscaled form covers the full decimal(38) domain and the
/// unsigned 64-bit maximum without loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecimalValue {
    pub unscaled: i128,
    pub precision: u8,
    pub scale: u8,
}

impl DecimalValue {
    pub fn new(unscaled: i128, precision: u8, scale: u8) -> Self {
        Self { unscaled, precision, scale }
    }

    /// Parse decimal text into an exact value at the given scale, rounding
    /// half up when the text carries more fractional digits than the scale.
    pub fn parse_with_scale(text: &str, precision: u8, scale: u8) -> anyhow::Result<Self> {
        let trimmed = text.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (int_part, frac_part) = match digits.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (digits, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            bail!("invalid decimal text '{}'", text);
        }
        if !int_part.chars().all(|c| c.is_ascii_digit())
            || !frac_part.chars().all(|c| c.is_ascii_digit())
        {
            bail!("invalid decimal text '{}'", text);
        }

        let mut unscaled: i128 = 0;
        let push_digit = |value: &mut i128, digit: u32| -> anyhow::Result<()> {
            *value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(digit as i128))
                .with_context(|| format!("decimal text '{}' overflows 128 bits", text))?;
            Ok(())
        };
        for c in int_part.chars() {
            push_digit(&mut unscaled, c.to_digit(10).unwrap_or(0))?;
        }
        let mut frac_digits = frac_part.chars();
        for _ in 0..scale {
            let digit = frac_digits
                .next()
                .and_then(|c| c.to_digit(10))
                .unwrap_or(0);
            push_digit(&mut unscaled, digit)?;
        }
        if let Some(next) = frac_digits.next() {
            if next.to_digit(10).unwrap_or(0) >= 5 {
                unscaled = unscaled
                    .checked_add(1)
                    .with_context(|| format!("decimal text '{}' overflows 128 bits", text))?;
            }
        }
        if negative {
            unscaled = -unscaled;
        }
        Ok(Self { unscaled, precision, scale })
    }

    /// Change the scale, rounding half up (away from zero) when digits are
    /// dropped. Returns None when the widened value would not fit 128 bits.
    pub fn rescale(&self, scale: u8) -> Option<Self> {
        if scale == self.scale {
            return Some(*self);
        }
        let unscaled = if scale > self.scale {
            let factor = 10_i128.checked_pow((scale - self.scale) as u32)?;
            self.unscaled.checked_mul(factor)?
        } else {
            let factor = 10_i128.pow((self.scale - scale) as u32);
            let quotient = self.unscaled / factor;
            let remainder = self.unscaled % factor;
            if remainder.abs() * 2 >= factor {
                quotient + self.unscaled.signum()
            } else {
                quotient
            }
        };
        Some(Self { unscaled, precision: self.precision, scale })
    }
}

impl fmt::Display for DecimalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abs = self.unscaled.unsigned_abs();
        let sign = if self.unscaled < 0 { "-" } else { "" };
        if self.scale == 0 {
            write!(f, "{}{}", sign, abs)
        } else {
            let divisor = 10_u128.pow(self.scale as u32);
            write!(
                f,
                "{}{}.{:0width$}",
                sign,
                abs / divisor,
                abs % divisor,
                width = self.scale as usize
            )
        }
    }
}

/// A time of day carried at picosecond resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeValue {
    pub picos_of_day: u64,
}

pub const PICOS_PER_SECOND: u64 = 1_000_000_000_000;
pub const PICOS_PER_DAY: u64 = 86_400 * PICOS_PER_SECOND;

impl TimeValue {
    pub fn from_hms_picos(hour: u32, minute: u32, second: u32, picos_of_second: u64) -> Option<Self> {
        if hour >= 24 || minute >= 60 || second >= 60 || picos_of_second >= PICOS_PER_SECOND {
            return None;
        }
        let seconds = (hour * 3600 + minute * 60 + second) as u64;
        Some(Self { picos_of_day: seconds * PICOS_PER_SECOND + picos_of_second })
    }

    pub fn from_hms_micro(hour: u32, minute: u32, second: u32, micro: u32) -> Option<Self> {
        Self::from_hms_picos(hour, minute, second, micro as u64 * 1_000_000)
    }
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seconds = self.picos_of_day / PICOS_PER_SECOND;
        let picos = self.picos_of_day % PICOS_PER_SECOND;
        write!(
            f,
            "{:02}:{:02}:{:02}",
            seconds / 3600,
            (seconds % 3600) / 60,
            seconds % 60
        )?;
        if picos > 0 {
            let digits = format!("{:012}", picos);
            write!(f, ".{}", digits.trim_end_matches('0'))?;
        }
        Ok(())
    }
}

/// A zone-less timestamp: microseconds since the epoch plus picoseconds of
/// the current microsecond, for up to twelve fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampValue {
    pub epoch_micros: i64,
    pub picos_of_micro: u32,
}

impl TimestampValue {
    pub fn new(epoch_micros: i64, picos_of_micro: u32) -> Self {
        Self { epoch_micros, picos_of_micro }
    }

    pub fn from_datetime(datetime: NaiveDateTime) -> Self {
        let epoch_micros =
            datetime.and_utc().timestamp() * 1_000_000 + (datetime.nanosecond() / 1_000) as i64;
        Self {
            epoch_micros,
            picos_of_micro: (datetime.nanosecond() % 1_000) * 1_000,
        }
    }

    pub fn from_parts(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
        micro: u32,
    ) -> Option<Self> {
        let datetime = NaiveDate::from_ymd_opt(year, month, day)?
            .and_hms_micro_opt(hour, minute, second, micro)?;
        Some(Self::from_datetime(datetime))
    }
}

impl fmt::Display for TimestampValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seconds = self.epoch_micros.div_euclid(1_000_000);
        let micros = self.epoch_micros.rem_euclid(1_000_000);
        match DateTime::<Utc>::from_timestamp(seconds, 0) {
            Some(datetime) => {
                write!(f, "{}", datetime.format("%Y-%m-%d %H:%M:%S"))?;
                if self.picos_of_micro > 0 {
                    write!(f, ".{:06}{:06}", micros, self.picos_of_micro)
                } else if micros > 0 {
                    write!(f, ".{:06}", micros)
                } else {
                    Ok(())
                }
            }
            None => write!(f, "epoch_micros={}", self.epoch_micros),
        }
    }
}

/// A zoned timestamp. `epoch_micros` is the absolute instant; the offset
/// only records the zone the value was expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZonedTimestampValue {
    pub epoch_micros: i64,
    pub picos_of_micro: u32,
    pub offset_minutes: i32,
}

impl ZonedTimestampValue {
    pub fn from_utc(epoch_micros: i64, picos_of_micro: u32) -> Self {
        Self { epoch_micros, picos_of_micro, offset_minutes: 0 }
    }

    /// Interpret a wall-clock reading in the given zone.
    pub fn from_local(wall: NaiveDateTime, offset: FixedOffset) -> Self {
        let as_utc = TimestampValue::from_datetime(wall);
        Self {
            epoch_micros: as_utc.epoch_micros - offset.local_minus_utc() as i64 * 1_000_000,
            picos_of_micro: as_utc.picos_of_micro,
            offset_minutes: offset.local_minus_utc() / 60,
        }
    }

    /// The absolute instant, dropping the presentation zone.
    pub fn instant(&self) -> TimestampValue {
        TimestampValue::new(self.epoch_micros, self.picos_of_micro)
    }
}

impl fmt::Display for ZonedTimestampValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} UTC", self.instant())
    }
}

/// A literal fragment ready to embed in remote SQL text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlLiteral(pub String);

impl SqlLiteral {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SqlLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
