// Connector error types
use std::fmt;
use thiserror::Error;

/// Connector error taxonomy
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The remote type has no entry in the coercion policy table. On the
    /// read path this is resolved into a hidden column and never surfaces
    /// as a query failure.
    #[error("Unsupported type '{type_decl}' for column '{column}'")]
    UnsupportedType { column: String, type_decl: String },

    /// A write-path value failed boundary validation.
    #[error("Value {value} out of domain for column '{column}': {reason}")]
    ValueOutOfDomain {
        column: String,
        value: String,
        reason: DomainViolation,
    },

    /// A declared precision exceeds the supported maximum.
    #[error("Precision {precision} for column '{column}' exceeds maximum {maximum}")]
    PrecisionOverflow {
        column: String,
        precision: u32,
        maximum: u32,
    },

    /// Resolver/codec disagreement. A programming-contract violation, not a
    /// recoverable runtime condition.
    #[error("Unsupported conversion for column '{column}': {detail}")]
    UnsupportedConversion { column: String, detail: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why a write-path value was rejected. Integer range violations and
/// temporal truncations are reported distinctly so statement failures can
/// be diagnosed without inspecting the column type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainViolation {
    IntegerOutOfRange { min: i128, max: i128 },
    DatetimeOutOfRange { min: String, max: String },
    DecimalOverflow { precision: u8, scale: u8 },
    VarcharTooLong { limit: u32 },
}

impl fmt::Display for DomainViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainViolation::IntegerOutOfRange { min, max } => {
                write!(f, "out of range value, expected [{}, {}]", min, max)
            }
            DomainViolation::DatetimeOutOfRange { min, max } => {
                write!(f, "incorrect datetime value, expected [{}, {}]", min, max)
            }
            DomainViolation::DecimalOverflow { precision, scale } => {
                write!(
                    f,
                    "integer part does not fit decimal({}, {})",
                    precision, scale
                )
            }
            DomainViolation::VarcharTooLong { limit } => {
                write!(f, "value longer than varchar({})", limit)
            }
        }
    }
}

/// Convert anyhow::Error to ConnectorError
impl From<anyhow::Error> for ConnectorError {
    fn from(err: anyhow::Error) -> Self {
        ConnectorError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_out_of_domain_names_column_and_value() {
        let error = ConnectorError::ValueOutOfDomain {
            column: "data".to_string(),
            value: "128".to_string(),
            reason: DomainViolation::IntegerOutOfRange { min: -128, max: 127 },
        };
        let message = error.to_string();
        assert!(message.contains("data"));
        assert!(message.contains("128"));
        assert!(message.contains("[-128, 127]"));
    }

    #[test]
    fn test_datetime_reason_distinct_from_integer_reason() {
        let integer = DomainViolation::IntegerOutOfRange { min: 0, max: 255 }.to_string();
        let datetime = DomainViolation::DatetimeOutOfRange {
            min: "1970-01-01 00:00:01.000000".to_string(),
            max: "2038-01-19 03:14:07.499999".to_string(),
        }
        .to_string();
        assert!(integer.contains("out of range"));
        assert!(datetime.contains("incorrect datetime"));
        assert_ne!(integer, datetime);
    }

    #[test]
    fn test_anyhow_conversion() {
        let error: ConnectorError = anyhow::anyhow!("boom").into();
        assert!(matches!(error, ConnectorError::Internal(_)));
    }
}
