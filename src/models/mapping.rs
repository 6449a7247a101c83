// Resolved column mappings shared between resolver, codec and validator
use crate::models::engine_type::EngineType;
use crate::models::signature::TypeSignature;
use serde::{Deserialize, Serialize};

/// How values of a column move across the boundary. Every kind is data
/// selected from the coercion policy table; the codec dispatches on it with
/// a plain match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodecKind {
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    UnsignedTinyInt,
    UnsignedSmallInt,
    UnsignedInteger,
    UnsignedBigInt,
    Decimal,
    Real,
    Double,
    Varchar,
    Varbinary,
    Date,
    Time,
    Timestamp,
    ZonedTimestamp,
    Json,
}

/// Which write-path domain check applies to a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidatorKind {
    None,
    Integer,
    Decimal,
    Varchar,
    Date,
    Datetime,
    /// The remote UTC-normalized timestamp family only accepts instants
    /// inside an epoch-bounded window.
    TimestampWindow,
}

/// The resolved association between a remote column and its engine-side
/// representation. Built once per column during schema resolution and
/// immutable afterwards; shared across concurrent queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub column: String,
    pub signature: TypeSignature,
    pub engine_type: EngineType,
    pub codec: CodecKind,
    pub validator: ValidatorKind,
    /// When false the column is excluded from the visible schema and never
    /// reaches the codec.
    pub supported: bool,
}

impl ColumnMapping {
    pub fn unsupported(column: impl Into<String>, signature: TypeSignature) -> Self {
        Self {
            column: column.into(),
            signature,
            engine_type: EngineType::unbounded_varchar(),
            codec: CodecKind::Varchar,
            validator: ValidatorKind::None,
            supported: false,
        }
    }
}

/// Inclusive integer bounds in the remote domain's native representation,
/// derived solely from the column's signature (via its codec kind), never
/// from data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: i128,
    pub max: i128,
}

impl Bounds {
    pub fn new(min: i128, max: i128) -> Self {
        Self { min, max }
    }

    /// The remote integer domain behind a codec kind, if it has one.
    pub fn of_integer(codec: CodecKind) -> Option<Bounds> {
        match codec {
            CodecKind::TinyInt => Some(Bounds::new(i8::MIN as i128, i8::MAX as i128)),
            CodecKind::SmallInt => Some(Bounds::new(i16::MIN as i128, i16::MAX as i128)),
            CodecKind::Integer => Some(Bounds::new(i32::MIN as i128, i32::MAX as i128)),
            CodecKind::BigInt => Some(Bounds::new(i64::MIN as i128, i64::MAX as i128)),
            CodecKind::UnsignedTinyInt => Some(Bounds::new(0, u8::MAX as i128)),
            CodecKind::UnsignedSmallInt => Some(Bounds::new(0, u16::MAX as i128)),
            CodecKind::UnsignedInteger => Some(Bounds::new(0, u32::MAX as i128)),
            CodecKind::UnsignedBigInt => Some(Bounds::new(0, u64::MAX as i128)),
            _ => None,
        }
    }

    pub fn contains(&self, value: i128) -> bool {
        value >= self.min && value <= self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_bounds_per_width() {
        assert_eq!(
            Bounds::of_integer(CodecKind::TinyInt).unwrap(),
            Bounds::new(-128, 127)
        );
        assert_eq!(
            Bounds::of_integer(CodecKind::SmallInt).unwrap(),
            Bounds::new(-32_768, 32_767)
        );
        assert_eq!(
            Bounds::of_integer(CodecKind::Integer).unwrap(),
            Bounds::new(-2_147_483_648, 2_147_483_647)
        );
        assert_eq!(
            Bounds::of_integer(CodecKind::UnsignedBigInt).unwrap(),
            Bounds::new(0, 18_446_744_073_709_551_615)
        );
        assert!(Bounds::of_integer(CodecKind::Varchar).is_none());
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let bounds = Bounds::of_integer(CodecKind::TinyInt).unwrap();
        assert!(bounds.contains(-128));
        assert!(bounds.contains(127));
        assert!(!bounds.contains(-129));
        assert!(!bounds.contains(128));
    }

    #[test]
    fn test_unsupported_mapping_is_hidden() {
        let mapping =
            ColumnMapping::unsupported("data", TypeSignature::new("bitmap"));
        assert!(!mapping.supported);
        assert_eq!(mapping.column, "data");
    }
}
