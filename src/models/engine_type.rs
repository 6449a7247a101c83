// Host engine type system
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of engine-side semantic types a remote column can resolve
/// to. Each kind carries the parameters needed to round-trip values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineType {
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Decimal { precision: u8, scale: u8 },
    Real,
    Double,
    /// `None` length means unbounded
    Varchar { length: Option<u32> },
    Varbinary,
    Date,
    Time { precision: u8 },
    Timestamp { precision: u8 },
    TimestampWithZone { precision: u8 },
    Json,
}

impl EngineType {
    /// Maximum decimal precision the engine supports.
    pub const MAX_DECIMAL_PRECISION: u8 = 38;

    /// Maximum fractional-second precision the remote engine stores.
    pub const MAX_REMOTE_TEMPORAL_PRECISION: u8 = 6;

    /// Maximum fractional-second precision carried by engine values
    /// (picosecond-level intermediates).
    pub const MAX_ENGINE_TEMPORAL_PRECISION: u8 = 12;

    /// Longest bounded varchar length; longer columns resolve as unbounded.
    pub const MAX_BOUNDED_VARCHAR_LENGTH: u32 = 16_777_215;

    pub fn decimal(precision: u8, scale: u8) -> Self {
        EngineType::Decimal { precision, scale }
    }

    pub fn varchar(length: u32) -> Self {
        EngineType::Varchar { length: Some(length) }
    }

    pub fn unbounded_varchar() -> Self {
        EngineType::Varchar { length: None }
    }
}

impl fmt::Display for EngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineType::Boolean => write!(f, "boolean"),
            EngineType::TinyInt => write!(f, "tinyint"),
            EngineType::SmallInt => write!(f, "smallint"),
            EngineType::Integer => write!(f, "integer"),
            EngineType::BigInt => write!(f, "bigint"),
            EngineType::Decimal { precision, scale } => {
                write!(f, "decimal({}, {})", precision, scale)
            }
            EngineType::Real => write!(f, "real"),
            EngineType::Double => write!(f, "double"),
            EngineType::Varchar { length: Some(length) } => write!(f, "varchar({})", length),
            EngineType::Varchar { length: None } => write!(f, "varchar"),
            EngineType::Varbinary => write!(f, "varbinary"),
            EngineType::Date => write!(f, "date"),
            EngineType::Time { precision } => write!(f, "time({})", precision),
            EngineType::Timestamp { precision } => write!(f, "timestamp({})", precision),
            EngineType::TimestampWithZone { precision } => {
                write!(f, "timestamp({}) with time zone", precision)
            }
            EngineType::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_renders_sql_forms() {
        assert_eq!(EngineType::decimal(20, 0).to_string(), "decimal(20, 0)");
        assert_eq!(EngineType::varchar(255).to_string(), "varchar(255)");
        assert_eq!(EngineType::unbounded_varchar().to_string(), "varchar");
        assert_eq!(
            EngineType::TimestampWithZone { precision: 3 }.to_string(),
            "timestamp(3) with time zone"
        );
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(EngineType::decimal(10, 2), EngineType::decimal(10, 2));
        assert_ne!(EngineType::decimal(10, 2), EngineType::decimal(10, 3));
        assert_ne!(
            EngineType::Timestamp { precision: 3 },
            EngineType::TimestampWithZone { precision: 3 }
        );
    }
}
