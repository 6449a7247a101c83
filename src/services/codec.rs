// Value codec
//
// Converts raw remote values into typed engine values (read path) and
// engine values into remote SQL literals (write path). The write path runs
// the boundary validator before rendering, so a literal is only ever
// produced for values the remote domain accepts.

use crate::error::ConnectorError;
use crate::models::{
    CodecKind, ColumnMapping, DecimalValue, EngineType, EngineValue, RemoteValue, SqlLiteral,
    TimeValue, TimestampValue, ZonedTimestampValue,
};
use crate::services::temporal;
use crate::services::validator::BoundaryValidator;
use chrono::{FixedOffset, NaiveDate, Offset, Utc};

pub struct ValueCodec {
    session_offset: FixedOffset,
    validator: BoundaryValidator,
}

impl ValueCodec {
    /// A codec bound to the session's effective zone. The zone only matters
    /// when zone-less engine values are written to the UTC-normalized
    /// remote timestamp family.
    pub fn new(session_offset: FixedOffset) -> Self {
        Self {
            session_offset,
            validator: BoundaryValidator::new(session_offset),
        }
    }

    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }

    /// Read direction. Never fails for a value of the mapped type; a raw
    /// value inconsistent with the mapping is a contract violation.
    pub fn decode(
        &self,
        mapping: &ColumnMapping,
        raw: RemoteValue,
    ) -> Result<EngineValue, ConnectorError> {
        if !mapping.supported {
            return Err(mismatch(mapping, "decode on a hidden column"));
        }
        if matches!(raw, RemoteValue::Null) {
            return Ok(EngineValue::Null);
        }
        match mapping.codec {
            CodecKind::Boolean => match signed_of(&raw) {
                Some(value) => Ok(EngineValue::Boolean(value != 0)),
                None => Err(mismatch(mapping, "expected an integer for boolean")),
            },
            CodecKind::TinyInt => {
                let value = signed_of(&raw)
                    .and_then(|v| i8::try_from(v).ok())
                    .ok_or_else(|| mismatch(mapping, "expected an 8-bit integer"))?;
                Ok(EngineValue::TinyInt(value))
            }
            CodecKind::SmallInt => {
                let value = signed_of(&raw)
                    .and_then(|v| i16::try_from(v).ok())
                    .ok_or_else(|| mismatch(mapping, "expected a 16-bit integer"))?;
                Ok(EngineValue::SmallInt(value))
            }
            CodecKind::Integer => {
                let value = signed_of(&raw)
                    .and_then(|v| i32::try_from(v).ok())
                    .ok_or_else(|| mismatch(mapping, "expected a 32-bit integer"))?;
                Ok(EngineValue::Integer(value))
            }
            CodecKind::BigInt => {
                let value =
                    signed_of(&raw).ok_or_else(|| mismatch(mapping, "expected a 64-bit integer"))?;
                Ok(EngineValue::BigInt(value))
            }
            // unsigned widths widen into the next wider signed kind, so no
            // remote value can lose its sign
            CodecKind::UnsignedTinyInt => {
                let value = unsigned_of(&raw)
                    .and_then(|v| u8::try_from(v).ok())
                    .ok_or_else(|| mismatch(mapping, "expected an unsigned 8-bit integer"))?;
                Ok(EngineValue::SmallInt(value as i16))
            }
            CodecKind::UnsignedSmallInt => {
                let value = unsigned_of(&raw)
                    .and_then(|v| u16::try_from(v).ok())
                    .ok_or_else(|| mismatch(mapping, "expected an unsigned 16-bit integer"))?;
                Ok(EngineValue::Integer(value as i32))
            }
            CodecKind::UnsignedInteger => {
                let value = unsigned_of(&raw)
                    .and_then(|v| u32::try_from(v).ok())
                    .ok_or_else(|| mismatch(mapping, "expected an unsigned 32-bit integer"))?;
                Ok(EngineValue::BigInt(value as i64))
            }
            CodecKind::UnsignedBigInt => {
                let value = unsigned_of(&raw)
                    .ok_or_else(|| mismatch(mapping, "expected an unsigned 64-bit integer"))?;
                Ok(EngineValue::Decimal(DecimalValue::new(value as i128, 20, 0)))
            }
            CodecKind::Decimal => {
                let (precision, scale) = decimal_parameters(mapping)?;
                let decimal = match &raw {
                    RemoteValue::Bytes(bytes) => {
                        let text = std::str::from_utf8(bytes)
                            .map_err(|_| mismatch(mapping, "decimal text is not UTF-8"))?;
                        DecimalValue::parse_with_scale(text, precision, scale)
                            .map_err(|e| mismatch(mapping, e.to_string()))?
                    }
                    _ => signed_of(&raw)
                        .map(|v| DecimalValue::new(v as i128, precision, 0))
                        .and_then(|d| d.rescale(scale))
                        .ok_or_else(|| mismatch(mapping, "expected decimal text"))?,
                };
                Ok(EngineValue::Decimal(decimal))
            }
            CodecKind::Real => match raw {
                RemoteValue::Float(value) => Ok(EngineValue::Real(value)),
                _ => Err(mismatch(mapping, "expected a 32-bit float")),
            },
            CodecKind::Double => match raw {
                RemoteValue::Double(value) => Ok(EngineValue::Double(value)),
                RemoteValue::Float(value) => Ok(EngineValue::Double(value as f64)),
                _ => Err(mismatch(mapping, "expected a 64-bit float")),
            },
            CodecKind::Varchar => match raw {
                RemoteValue::Bytes(bytes) => {
                    let text = String::from_utf8(bytes)
                        .map_err(|_| mismatch(mapping, "varchar bytes are not UTF-8"))?;
                    Ok(EngineValue::Varchar(text))
                }
                _ => Err(mismatch(mapping, "expected string bytes")),
            },
            CodecKind::Varbinary => match raw {
                RemoteValue::Bytes(bytes) => Ok(EngineValue::Varbinary(bytes)),
                _ => Err(mismatch(mapping, "expected binary bytes")),
            },
            CodecKind::Date => match raw {
                RemoteValue::Date { year, month, day } => {
                    let date = NaiveDate::from_ymd_opt(year, month, day)
                        .ok_or_else(|| mismatch(mapping, "invalid date parts"))?;
                    Ok(EngineValue::Date(date))
                }
                _ => Err(mismatch(mapping, "expected a date")),
            },
            CodecKind::Time => match raw {
                RemoteValue::Time { negative: false, hour, minute, second, micro } => {
                    let time = TimeValue::from_hms_micro(hour, minute, second, micro)
                        .ok_or_else(|| mismatch(mapping, "invalid time parts"))?;
                    Ok(EngineValue::Time(time))
                }
                _ => Err(mismatch(mapping, "expected a time of day")),
            },
            CodecKind::Timestamp => Ok(EngineValue::Timestamp(datetime_of(mapping, &raw)?)),
            CodecKind::ZonedTimestamp => {
                // stored values are already UTC-normalized by the remote
                // engine, so the instant surfaces in the UTC zone
                let instant = datetime_of(mapping, &raw)?;
                Ok(EngineValue::TimestampWithZone(ZonedTimestampValue::from_utc(
                    instant.epoch_micros,
                    instant.picos_of_micro,
                )))
            }
            CodecKind::Json => match raw {
                RemoteValue::Bytes(bytes) => {
                    let value = serde_json::from_slice(&bytes)
                        .map_err(|e| mismatch(mapping, format!("invalid JSON text: {}", e)))?;
                    Ok(EngineValue::Json(value))
                }
                _ => Err(mismatch(mapping, "expected JSON bytes")),
            },
        }
    }

    /// Write direction: validate, then render a literal for the remote SQL
    /// dialect. INSERT- and CTAS-initiated writes go through this same path
    /// and therefore round identically.
    pub fn encode(
        &self,
        mapping: &ColumnMapping,
        value: &EngineValue,
    ) -> Result<SqlLiteral, ConnectorError> {
        if !mapping.supported {
            return Err(mismatch(mapping, "encode on a hidden column"));
        }
        self.validator.validate(mapping, value)?;
        if matches!(value, EngineValue::Null) {
            return Ok(SqlLiteral("NULL".to_string()));
        }
        let text = match mapping.codec {
            CodecKind::Boolean => match value {
                EngineValue::Boolean(v) => if *v { "true" } else { "false" }.to_string(),
                _ => match value.as_integer() {
                    Some(v) => if v != 0 { "true" } else { "false" }.to_string(),
                    None => return Err(mismatch(mapping, "expected a boolean value")),
                },
            },
            CodecKind::TinyInt
            | CodecKind::SmallInt
            | CodecKind::Integer
            | CodecKind::BigInt
            | CodecKind::UnsignedTinyInt
            | CodecKind::UnsignedSmallInt
            | CodecKind::UnsignedInteger
            | CodecKind::UnsignedBigInt => value
                .as_integer()
                .ok_or_else(|| mismatch(mapping, "expected an integer value"))?
                .to_string(),
            CodecKind::Decimal => {
                let (precision, scale) = decimal_parameters(mapping)?;
                let decimal = match value {
                    EngineValue::Decimal(decimal) => *decimal,
                    _ => value
                        .as_integer()
                        .map(|v| DecimalValue::new(v, precision, 0))
                        .ok_or_else(|| mismatch(mapping, "expected a decimal value"))?,
                };
                // the validator already proved the rescaled value fits
                let rescaled = decimal
                    .rescale(scale)
                    .ok_or_else(|| mismatch(mapping, "decimal rescale overflow"))?;
                DecimalValue::new(rescaled.unscaled, precision, scale).to_string()
            }
            CodecKind::Real => match value {
                EngineValue::Real(v) => format!("{}", v),
                EngineValue::Double(v) => format!("{}", v),
                _ => return Err(mismatch(mapping, "expected a real value")),
            },
            CodecKind::Double => match value {
                EngineValue::Double(v) => format!("{}", v),
                EngineValue::Real(v) => format!("{}", v),
                _ => return Err(mismatch(mapping, "expected a double value")),
            },
            CodecKind::Varchar => match value {
                EngineValue::Varchar(text) => quote(text),
                _ => return Err(mismatch(mapping, "expected a varchar value")),
            },
            CodecKind::Varbinary => match value {
                EngineValue::Varbinary(bytes) => format!("unhex('{}')", hex(bytes)),
                _ => return Err(mismatch(mapping, "expected a varbinary value")),
            },
            CodecKind::Date => match value {
                EngineValue::Date(date) => format!("'{}'", date.format("%Y-%m-%d")),
                _ => return Err(mismatch(mapping, "expected a date value")),
            },
            CodecKind::Time => {
                let precision = match mapping.engine_type {
                    EngineType::Time { precision } => precision,
                    _ => return Err(mismatch(mapping, "time codec on non-time type")),
                };
                match value {
                    EngineValue::Time(time) => {
                        let rounded = temporal::round_time(time.picos_of_day, precision);
                        format!("'{}'", temporal::format_time(rounded, precision))
                    }
                    _ => return Err(mismatch(mapping, "expected a time value")),
                }
            }
            CodecKind::Timestamp | CodecKind::ZonedTimestamp => {
                let precision = match mapping.engine_type {
                    EngineType::Timestamp { precision } => precision,
                    EngineType::TimestampWithZone { precision } => precision,
                    _ => return Err(mismatch(mapping, "timestamp codec on non-timestamp type")),
                };
                let instant = temporal::write_instant(mapping.codec, value, self.session_offset)
                    .ok_or_else(|| mismatch(mapping, "expected a timestamp value"))?;
                let (seconds, picos) =
                    temporal::round_instant(instant.epoch_micros, instant.picos_of_micro, precision);
                let text = temporal::format_instant(seconds, picos, precision)
                    .ok_or_else(|| mismatch(mapping, "instant outside the renderable calendar"))?;
                format!("'{}'", text)
            }
            CodecKind::Json => match value {
                EngineValue::Json(json) => quote(&json.to_string()),
                _ => return Err(mismatch(mapping, "expected a JSON value")),
            },
        };
        Ok(SqlLiteral(text))
    }
}

fn signed_of(raw: &RemoteValue) -> Option<i64> {
    match raw {
        RemoteValue::Int(value) => Some(*value),
        RemoteValue::UInt(value) => i64::try_from(*value).ok(),
        _ => None,
    }
}

fn unsigned_of(raw: &RemoteValue) -> Option<u64> {
    match raw {
        RemoteValue::UInt(value) => Some(*value),
        RemoteValue::Int(value) => u64::try_from(*value).ok(),
        _ => None,
    }
}

fn datetime_of(mapping: &ColumnMapping, raw: &RemoteValue) -> Result<TimestampValue, ConnectorError> {
    match raw {
        RemoteValue::DateTime { year, month, day, hour, minute, second, micro } => {
            TimestampValue::from_parts(*year, *month, *day, *hour, *minute, *second, *micro)
                .ok_or_else(|| mismatch(mapping, "invalid datetime parts"))
        }
        _ => Err(mismatch(mapping, "expected a datetime")),
    }
}

fn decimal_parameters(mapping: &ColumnMapping) -> Result<(u8, u8), ConnectorError> {
    match mapping.engine_type {
        EngineType::Decimal { precision, scale } => Ok((precision, scale)),
        _ => Err(mismatch(mapping, "decimal codec on non-decimal type")),
    }
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn mismatch(mapping: &ColumnMapping, detail: impl Into<String>) -> ConnectorError {
    ConnectorError::UnsupportedConversion {
        column: mapping.column.clone(),
        detail: detail.into(),
    }
}
