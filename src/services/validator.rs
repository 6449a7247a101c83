// Boundary validator
//
// Write-path domain checks. The read path trusts the remote engine to have
// enforced its own domain, so nothing here runs on decode.

use crate::error::{ConnectorError, DomainViolation};
use crate::models::{Bounds, ColumnMapping, DecimalValue, EngineType, EngineValue};
use crate::services::temporal;
use chrono::{Datelike, FixedOffset, Offset, Utc};

// The remote engine's supported window for UTC-normalized timestamps.
const TIMESTAMP_MIN_MICROS: i64 = 1_000_000;
const TIMESTAMP_MAX_MICROS: i64 = 2_147_483_647_499_999;
const TIMESTAMP_MIN_TEXT: &str = "1970-01-01 00:00:01.000000";
const TIMESTAMP_MAX_TEXT: &str = "2038-01-19 03:14:07.499999";

// Calendar window for zone-less datetimes and dates; the remote engine
// rejects values before year 1 and nothing past year 9999 is renderable.
const DATETIME_MIN_SECONDS: i64 = -62_135_596_800; // 0001-01-01 00:00:00
const DATETIME_MAX_SECONDS: i64 = 253_402_300_799; // 9999-12-31 23:59:59
const DATETIME_MIN_TEXT: &str = "0001-01-01 00:00:00";
const DATETIME_MAX_TEXT: &str = "9999-12-31 23:59:59.999999";

pub struct BoundaryValidator {
    session_offset: FixedOffset,
}

impl BoundaryValidator {
    pub fn new(session_offset: FixedOffset) -> Self {
        Self { session_offset }
    }

    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }

    /// Check a write-path value against the remote domain of its column.
    /// Nulls pass; nullability is the remote engine's concern.
    pub fn validate(
        &self,
        mapping: &ColumnMapping,
        value: &EngineValue,
    ) -> Result<(), ConnectorError> {
        use crate::models::ValidatorKind;

        if matches!(value, EngineValue::Null) {
            return Ok(());
        }
        match mapping.validator {
            ValidatorKind::None => Ok(()),
            ValidatorKind::Integer => self.validate_integer(mapping, value),
            ValidatorKind::Decimal => self.validate_decimal(mapping, value),
            ValidatorKind::Varchar => self.validate_varchar(mapping, value),
            ValidatorKind::Date => self.validate_date(mapping, value),
            ValidatorKind::Datetime => self.validate_datetime(mapping, value),
            ValidatorKind::TimestampWindow => self.validate_timestamp_window(mapping, value),
        }
    }

    fn validate_integer(
        &self,
        mapping: &ColumnMapping,
        value: &EngineValue,
    ) -> Result<(), ConnectorError> {
        let bounds = Bounds::of_integer(mapping.codec)
            .ok_or_else(|| contract_violation(mapping, "integer validator on non-integer codec"))?;
        let integer = value
            .as_integer()
            .ok_or_else(|| contract_violation(mapping, "expected an integer value"))?;
        if !bounds.contains(integer) {
            return Err(rejected(
                mapping,
                value,
                DomainViolation::IntegerOutOfRange { min: bounds.min, max: bounds.max },
            ));
        }
        Ok(())
    }

    fn validate_decimal(
        &self,
        mapping: &ColumnMapping,
        value: &EngineValue,
    ) -> Result<(), ConnectorError> {
        let (precision, scale) = match mapping.engine_type {
            EngineType::Decimal { precision, scale } => (precision, scale),
            _ => return Err(contract_violation(mapping, "decimal validator on non-decimal type")),
        };
        let decimal = match value {
            EngineValue::Decimal(decimal) => *decimal,
            _ => match value.as_integer() {
                Some(integer) => DecimalValue::new(integer, precision, 0),
                None => return Err(contract_violation(mapping, "expected a decimal value")),
            },
        };
        let overflow = DomainViolation::DecimalOverflow { precision, scale };
        let rescaled = decimal
            .rescale(scale)
            .ok_or_else(|| rejected(mapping, value, overflow.clone()))?;
        if rescaled.unscaled.unsigned_abs() >= 10_u128.pow(precision as u32) {
            return Err(rejected(mapping, value, overflow));
        }
        Ok(())
    }

    fn validate_varchar(
        &self,
        mapping: &ColumnMapping,
        value: &EngineValue,
    ) -> Result<(), ConnectorError> {
        let limit = match mapping.engine_type {
            EngineType::Varchar { length: Some(length) } => length,
            EngineType::Varchar { length: None } => return Ok(()),
            _ => return Err(contract_violation(mapping, "varchar validator on non-varchar type")),
        };
        let text = match value {
            EngineValue::Varchar(text) => text,
            _ => return Err(contract_violation(mapping, "expected a varchar value")),
        };
        if text.chars().count() as u64 > limit as u64 {
            return Err(rejected(mapping, value, DomainViolation::VarcharTooLong { limit }));
        }
        Ok(())
    }

    fn validate_date(
        &self,
        mapping: &ColumnMapping,
        value: &EngineValue,
    ) -> Result<(), ConnectorError> {
        let date = match value {
            EngineValue::Date(date) => date,
            _ => return Err(contract_violation(mapping, "expected a date value")),
        };
        if date.year() < 1 || date.year() > 9999 {
            return Err(rejected(
                mapping,
                value,
                DomainViolation::DatetimeOutOfRange {
                    min: "0001-01-01".to_string(),
                    max: "9999-12-31".to_string(),
                },
            ));
        }
        Ok(())
    }

    fn validate_datetime(
        &self,
        mapping: &ColumnMapping,
        value: &EngineValue,
    ) -> Result<(), ConnectorError> {
        let (seconds, _) = self.rounded_write_instant(mapping, value)?;
        if !(DATETIME_MIN_SECONDS..=DATETIME_MAX_SECONDS).contains(&seconds) {
            return Err(rejected(
                mapping,
                value,
                DomainViolation::DatetimeOutOfRange {
                    min: DATETIME_MIN_TEXT.to_string(),
                    max: DATETIME_MAX_TEXT.to_string(),
                },
            ));
        }
        Ok(())
    }

    fn validate_timestamp_window(
        &self,
        mapping: &ColumnMapping,
        value: &EngineValue,
    ) -> Result<(), ConnectorError> {
        let (seconds, picos) = self.rounded_write_instant(mapping, value)?;
        // picos are a whole number of microseconds after rounding to at
        // most six digits
        let micros = seconds * 1_000_000 + (picos / 1_000_000) as i64;
        if !(TIMESTAMP_MIN_MICROS..=TIMESTAMP_MAX_MICROS).contains(&micros) {
            return Err(rejected(
                mapping,
                value,
                DomainViolation::DatetimeOutOfRange {
                    min: TIMESTAMP_MIN_TEXT.to_string(),
                    max: TIMESTAMP_MAX_TEXT.to_string(),
                },
            ));
        }
        Ok(())
    }

    /// The UTC instant the value would be written as, rounded to the
    /// column's precision. The validator must judge exactly what the codec
    /// will render.
    fn rounded_write_instant(
        &self,
        mapping: &ColumnMapping,
        value: &EngineValue,
    ) -> Result<(i64, u64), ConnectorError> {
        let precision = match mapping.engine_type {
            EngineType::Timestamp { precision } => precision,
            EngineType::TimestampWithZone { precision } => precision,
            _ => {
                return Err(contract_violation(
                    mapping,
                    "temporal validator on non-temporal type",
                ))
            }
        };
        let instant = temporal::write_instant(mapping.codec, value, self.session_offset)
            .ok_or_else(|| contract_violation(mapping, "expected a timestamp value"))?;
        Ok(temporal::round_instant(instant.epoch_micros, instant.picos_of_micro, precision))
    }
}

fn rejected(
    mapping: &ColumnMapping,
    value: &EngineValue,
    reason: DomainViolation,
) -> ConnectorError {
    ConnectorError::ValueOutOfDomain {
        column: mapping.column.clone(),
        value: value.to_string(),
        reason,
    }
}

fn contract_violation(mapping: &ColumnMapping, detail: &str) -> ConnectorError {
    ConnectorError::UnsupportedConversion {
        column: mapping.column.clone(),
        detail: detail.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TimestampValue, TypeSignature, ZonedTimestampValue};
    use crate::services::resolver::TypeResolver;

    fn mapping_for(decl: &str) -> ColumnMapping {
        let resolver = TypeResolver::default();
        let signature = TypeSignature::parse(decl).unwrap();
        let mapping = resolver.resolve("data", &signature);
        assert!(mapping.supported, "no mapping for {}", decl);
        mapping
    }

    fn assert_rejected(mapping: &ColumnMapping, value: EngineValue) {
        let error = BoundaryValidator::utc().validate(mapping, &value).unwrap_err();
        match error {
            ConnectorError::ValueOutOfDomain { column, .. } => assert_eq!(column, "data"),
            other => panic!("expected ValueOutOfDomain, got {:?}", other),
        }
    }

    fn assert_accepted(mapping: &ColumnMapping, value: EngineValue) {
        BoundaryValidator::utc().validate(mapping, &value).unwrap();
    }

    #[test]
    fn test_tinyint_bounds() {
        let mapping = mapping_for("tinyint");
        assert_accepted(&mapping, EngineValue::TinyInt(-128));
        assert_accepted(&mapping, EngineValue::TinyInt(127));
        assert_rejected(&mapping, EngineValue::SmallInt(-129));
        assert_rejected(&mapping, EngineValue::SmallInt(128));
    }

    #[test]
    fn test_smallint_bounds() {
        let mapping = mapping_for("smallint");
        assert_accepted(&mapping, EngineValue::SmallInt(-32_768));
        assert_accepted(&mapping, EngineValue::SmallInt(32_767));
        assert_rejected(&mapping, EngineValue::Integer(-32_769));
        assert_rejected(&mapping, EngineValue::Integer(32_768));
    }

    #[test]
    fn test_integer_bounds() {
        let mapping = mapping_for("integer");
        assert_accepted(&mapping, EngineValue::Integer(-2_147_483_648));
        assert_accepted(&mapping, EngineValue::Integer(2_147_483_647));
        assert_rejected(&mapping, EngineValue::BigInt(-2_147_483_649));
        assert_rejected(&mapping, EngineValue::BigInt(2_147_483_648));
    }

    #[test]
    fn test_bigint_bounds() {
        let mapping = mapping_for("bigint");
        assert_accepted(&mapping, EngineValue::BigInt(i64::MIN));
        assert_accepted(&mapping, EngineValue::BigInt(i64::MAX));
        assert_rejected(
            &mapping,
            EngineValue::Decimal(DecimalValue::new(i64::MIN as i128 - 1, 20, 0)),
        );
        assert_rejected(
            &mapping,
            EngineValue::Decimal(DecimalValue::new(i64::MAX as i128 + 1, 20, 0)),
        );
    }

    #[test]
    fn test_unsigned_bounds() {
        let tinyint = mapping_for("tinyint unsigned");
        assert_accepted(&tinyint, EngineValue::SmallInt(0));
        assert_accepted(&tinyint, EngineValue::SmallInt(255));
        assert_rejected(&tinyint, EngineValue::SmallInt(-1));
        assert_rejected(&tinyint, EngineValue::SmallInt(256));

        let smallint = mapping_for("smallint unsigned");
        assert_accepted(&smallint, EngineValue::Integer(65_535));
        assert_rejected(&smallint, EngineValue::Integer(65_536));

        let integer = mapping_for("int unsigned");
        assert_accepted(&integer, EngineValue::BigInt(4_294_967_295));
        assert_rejected(&integer, EngineValue::BigInt(4_294_967_296));

        let bigint = mapping_for("bigint unsigned");
        let max = 18_446_744_073_709_551_615_i128;
        assert_accepted(&bigint, EngineValue::Decimal(DecimalValue::new(max, 20, 0)));
        assert_rejected(&bigint, EngineValue::Decimal(DecimalValue::new(max + 1, 21, 0)));
        assert_rejected(&bigint, EngineValue::Decimal(DecimalValue::new(-1, 20, 0)));
    }

    #[test]
    fn test_decimal_integer_digit_budget() {
        let mapping = mapping_for("decimal(4, 2)");
        assert_accepted(&mapping, EngineValue::Decimal(DecimalValue::new(9_999, 4, 2)));
        // 100.00 needs three integer digits
        assert_rejected(&mapping, EngineValue::Decimal(DecimalValue::new(10_000, 5, 2)));
        assert_rejected(&mapping, EngineValue::Integer(100));
        assert_accepted(&mapping, EngineValue::Integer(99));
    }

    #[test]
    fn test_decimal_rescale_rounds_before_checking() {
        let mapping = mapping_for("decimal(4, 2)");
        // 99.995 rounds half up to 100.00, which no longer fits
        assert_rejected(&mapping, EngineValue::Decimal(DecimalValue::new(99_995, 5, 3)));
        // 99.994 rounds down to 99.99
        assert_accepted(&mapping, EngineValue::Decimal(DecimalValue::new(99_994, 5, 3)));
    }

    #[test]
    fn test_varchar_length_limit() {
        let mapping = mapping_for("varchar(5)");
        assert_accepted(&mapping, EngineValue::Varchar("abcde".to_string()));
        assert_rejected(&mapping, EngineValue::Varchar("abcdef".to_string()));

        let unbounded = mapping_for("varchar");
        assert_accepted(&unbounded, EngineValue::Varchar("x".repeat(100_000)));
    }

    #[test]
    fn test_date_rejects_pre_calendar_years() {
        let mapping = mapping_for("date");
        let first = chrono::NaiveDate::from_ymd_opt(1, 1, 1).unwrap();
        assert_accepted(&mapping, EngineValue::Date(first));
        let negative = chrono::NaiveDate::from_ymd_opt(-1, 1, 1).unwrap();
        assert_rejected(&mapping, EngineValue::Date(negative));
    }

    #[test]
    fn test_timestamp_window_boundaries() {
        let mapping = mapping_for("timestamp");
        let min = TimestampValue::from_parts(1970, 1, 1, 0, 0, 1, 0).unwrap();
        assert_accepted(
            &mapping,
            EngineValue::TimestampWithZone(ZonedTimestampValue::from_utc(min.epoch_micros, 0)),
        );
        let max = TimestampValue::from_parts(2038, 1, 19, 3, 14, 7, 499_999).unwrap();
        assert_accepted(
            &mapping,
            EngineValue::TimestampWithZone(ZonedTimestampValue::from_utc(max.epoch_micros, 0)),
        );

        let below = TimestampValue::from_parts(1970, 1, 1, 0, 0, 0, 0).unwrap();
        assert_rejected(
            &mapping,
            EngineValue::TimestampWithZone(ZonedTimestampValue::from_utc(below.epoch_micros, 0)),
        );
        let above = TimestampValue::from_parts(2038, 1, 19, 3, 14, 8, 0).unwrap();
        assert_rejected(
            &mapping,
            EngineValue::TimestampWithZone(ZonedTimestampValue::from_utc(above.epoch_micros, 0)),
        );
    }

    #[test]
    fn test_timestamp_window_judges_the_rounded_value() {
        // timestamp(0): 2038-01-19 03:14:07.5 rounds up to :08, outside the
        // window even though the raw value is inside it
        let mapping = mapping_for("timestamp");
        let edge = TimestampValue::from_parts(2038, 1, 19, 3, 14, 7, 500_000).unwrap();
        assert_rejected(
            &mapping,
            EngineValue::TimestampWithZone(ZonedTimestampValue::from_utc(edge.epoch_micros, 0)),
        );
    }

    #[test]
    fn test_datetime_accepts_pre_epoch_values() {
        let mapping = mapping_for("datetime(3)");
        let value = TimestampValue::from_parts(1958, 1, 1, 13, 18, 3, 123_000).unwrap();
        assert_accepted(&mapping, EngineValue::Timestamp(value));
    }

    #[test]
    fn test_session_zone_shifts_before_window_check() {
        // 1970-01-01 00:00:00 UTC expressed as 02:00:00 in a +02:00 session
        // is still below the window floor once shifted
        let mapping = mapping_for("timestamp");
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let validator = BoundaryValidator::new(offset);
        let wall = TimestampValue::from_parts(1970, 1, 1, 2, 0, 0, 0).unwrap();
        let error = validator
            .validate(&mapping, &EngineValue::Timestamp(wall))
            .unwrap_err();
        assert!(matches!(error, ConnectorError::ValueOutOfDomain { .. }));
    }

    #[test]
    fn test_null_passes_every_validator() {
        for decl in ["tinyint", "decimal(4, 2)", "varchar(5)", "date", "timestamp"] {
            assert_accepted(&mapping_for(decl), EngineValue::Null);
        }
    }

    #[test]
    fn test_non_integer_value_is_a_contract_violation() {
        let mapping = mapping_for("tinyint");
        let error = BoundaryValidator::utc()
            .validate(&mapping, &EngineValue::Varchar("x".to_string()))
            .unwrap_err();
        assert!(matches!(error, ConnectorError::UnsupportedConversion { .. }));
    }
}
