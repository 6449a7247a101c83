// Coercion policy table
//
// The single place that decides which remote type signatures are supported,
// what engine type they become, and which codec and validator apply. Adding
// a remote type is a table edit here, not a change to the resolver, codec
// or validator.

use crate::error::ConnectorError;
use crate::models::{CodecKind, EngineType, TypeSignature, ValidatorKind};

/// Why a signature failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveError {
    /// No policy entry covers the signature.
    Unsupported,
    /// The declared precision exceeds what can be represented.
    PrecisionOverflow { precision: u32, maximum: u32 },
}

/// One row of the policy table: a `(name, unsigned?)` signature family and
/// the engine type constructor, codec and validator it selects.
pub struct TypePolicy {
    pub name: &'static str,
    pub unsigned: bool,
    pub engine_type: fn(&TypeSignature) -> Result<EngineType, ResolveError>,
    pub codec: CodecKind,
    pub validator: ValidatorKind,
}

fn boolean_type(_: &TypeSignature) -> Result<EngineType, ResolveError> {
    Ok(EngineType::Boolean)
}

fn tinyint_type(_: &TypeSignature) -> Result<EngineType, ResolveError> {
    Ok(EngineType::TinyInt)
}

fn smallint_type(_: &TypeSignature) -> Result<EngineType, ResolveError> {
    Ok(EngineType::SmallInt)
}

fn integer_type(_: &TypeSignature) -> Result<EngineType, ResolveError> {
    Ok(EngineType::Integer)
}

fn bigint_type(_: &TypeSignature) -> Result<EngineType, ResolveError> {
    Ok(EngineType::BigInt)
}

// Unsigned widths widen to the next wider signed kind so every remote value
// stays representable.

fn unsigned_tinyint_type(_: &TypeSignature) -> Result<EngineType, ResolveError> {
    Ok(EngineType::SmallInt)
}

fn unsigned_smallint_type(_: &TypeSignature) -> Result<EngineType, ResolveError> {
    Ok(EngineType::Integer)
}

fn unsigned_integer_type(_: &TypeSignature) -> Result<EngineType, ResolveError> {
    Ok(EngineType::BigInt)
}

fn unsigned_bigint_type(_: &TypeSignature) -> Result<EngineType, ResolveError> {
    // 2^64 - 1 has twenty digits
    Ok(EngineType::decimal(20, 0))
}

fn real_type(_: &TypeSignature) -> Result<EngineType, ResolveError> {
    Ok(EngineType::Real)
}

fn double_type(_: &TypeSignature) -> Result<EngineType, ResolveError> {
    Ok(EngineType::Double)
}

fn decimal_type(signature: &TypeSignature) -> Result<EngineType, ResolveError> {
    let precision = signature.precision.ok_or(ResolveError::Unsupported)?;
    let scale = signature.scale.unwrap_or(0);
    if precision > EngineType::MAX_DECIMAL_PRECISION as u32 {
        return Err(ResolveError::PrecisionOverflow {
            precision,
            maximum: EngineType::MAX_DECIMAL_PRECISION as u32,
        });
    }
    if precision == 0 || scale > precision {
        return Err(ResolveError::Unsupported);
    }
    Ok(EngineType::decimal(precision as u8, scale as u8))
}

fn varchar_type(signature: &TypeSignature) -> Result<EngineType, ResolveError> {
    Ok(match signature.length {
        Some(length) if length <= EngineType::MAX_BOUNDED_VARCHAR_LENGTH => {
            EngineType::varchar(length)
        }
        _ => EngineType::unbounded_varchar(),
    })
}

fn string_type(_: &TypeSignature) -> Result<EngineType, ResolveError> {
    Ok(EngineType::unbounded_varchar())
}

fn varbinary_type(_: &TypeSignature) -> Result<EngineType, ResolveError> {
    Ok(EngineType::Varbinary)
}

fn date_type(_: &TypeSignature) -> Result<EngineType, ResolveError> {
    Ok(EngineType::Date)
}

fn temporal_precision(signature: &TypeSignature) -> Result<u8, ResolveError> {
    // precision defaults to 0 when unspecified
    let precision = signature.precision.unwrap_or(0);
    if precision > EngineType::MAX_REMOTE_TEMPORAL_PRECISION as u32 {
        return Err(ResolveError::PrecisionOverflow {
            precision,
            maximum: EngineType::MAX_REMOTE_TEMPORAL_PRECISION as u32,
        });
    }
    Ok(precision as u8)
}

fn time_type(signature: &TypeSignature) -> Result<EngineType, ResolveError> {
    Ok(EngineType::Time { precision: temporal_precision(signature)? })
}

fn datetime_type(signature: &TypeSignature) -> Result<EngineType, ResolveError> {
    // no time-zone concept on the remote side, so the zone-less kind
    Ok(EngineType::Timestamp { precision: temporal_precision(signature)? })
}

fn zoned_timestamp_type(signature: &TypeSignature) -> Result<EngineType, ResolveError> {
    // stored values are UTC-normalized by the remote engine
    Ok(EngineType::TimestampWithZone { precision: temporal_precision(signature)? })
}

fn json_type(_: &TypeSignature) -> Result<EngineType, ResolveError> {
    Ok(EngineType::Json)
}

pub static POLICIES: &[TypePolicy] = &[
    TypePolicy { name: "boolean", unsigned: false, engine_type: boolean_type, codec: CodecKind::Boolean, validator: ValidatorKind::None },
    TypePolicy { name: "tinyint", unsigned: false, engine_type: tinyint_type, codec: CodecKind::TinyInt, validator: ValidatorKind::Integer },
    TypePolicy { name: "smallint", unsigned: false, engine_type: smallint_type, codec: CodecKind::SmallInt, validator: ValidatorKind::Integer },
    TypePolicy { name: "int", unsigned: false, engine_type: integer_type, codec: CodecKind::Integer, validator: ValidatorKind::Integer },
    TypePolicy { name: "integer", unsigned: false, engine_type: integer_type, codec: CodecKind::Integer, validator: ValidatorKind::Integer },
    TypePolicy { name: "bigint", unsigned: false, engine_type: bigint_type, codec: CodecKind::BigInt, validator: ValidatorKind::Integer },
    TypePolicy { name: "tinyint", unsigned: true, engine_type: unsigned_tinyint_type, codec: CodecKind::UnsignedTinyInt, validator: ValidatorKind::Integer },
    TypePolicy { name: "smallint", unsigned: true, engine_type: unsigned_smallint_type, codec: CodecKind::UnsignedSmallInt, validator: ValidatorKind::Integer },
    TypePolicy { name: "int", unsigned: true, engine_type: unsigned_integer_type, codec: CodecKind::UnsignedInteger, validator: ValidatorKind::Integer },
    TypePolicy { name: "integer", unsigned: true, engine_type: unsigned_integer_type, codec: CodecKind::UnsignedInteger, validator: ValidatorKind::Integer },
    TypePolicy { name: "bigint", unsigned: true, engine_type: unsigned_bigint_type, codec: CodecKind::UnsignedBigInt, validator: ValidatorKind::Integer },
    TypePolicy { name: "float", unsigned: false, engine_type: real_type, codec: CodecKind::Real, validator: ValidatorKind::None },
    TypePolicy { name: "double", unsigned: false, engine_type: double_type, codec: CodecKind::Double, validator: ValidatorKind::None },
    TypePolicy { name: "decimal", unsigned: false, engine_type: decimal_type, codec: CodecKind::Decimal, validator: ValidatorKind::Decimal },
    TypePolicy { name: "varchar", unsigned: false, engine_type: varchar_type, codec: CodecKind::Varchar, validator: ValidatorKind::Varchar },
    TypePolicy { name: "char", unsigned: false, engine_type: varchar_type, codec: CodecKind::Varchar, validator: ValidatorKind::Varchar },
    TypePolicy { name: "string", unsigned: false, engine_type: string_type, codec: CodecKind::Varchar, validator: ValidatorKind::Varchar },
    TypePolicy { name: "binary", unsigned: false, engine_type: varbinary_type, codec: CodecKind::Varbinary, validator: ValidatorKind::None },
    TypePolicy { name: "varbinary", unsigned: false, engine_type: varbinary_type, codec: CodecKind::Varbinary, validator: ValidatorKind::None },
    TypePolicy { name: "date", unsigned: false, engine_type: date_type, codec: CodecKind::Date, validator: ValidatorKind::Date },
    TypePolicy { name: "time", unsigned: false, engine_type: time_type, codec: CodecKind::Time, validator: ValidatorKind::None },
    TypePolicy { name: "datetime", unsigned: false, engine_type: datetime_type, codec: CodecKind::Timestamp, validator: ValidatorKind::Datetime },
    TypePolicy { name: "timestamp", unsigned: false, engine_type: zoned_timestamp_type, codec: CodecKind::ZonedTimestamp, validator: ValidatorKind::TimestampWindow },
    TypePolicy { name: "json", unsigned: false, engine_type: json_type, codec: CodecKind::Json, validator: ValidatorKind::None },
    TypePolicy { name: "variant", unsigned: false, engine_type: json_type, codec: CodecKind::Json, validator: ValidatorKind::None },
];

/// Look up the policy row for a signature family.
pub fn lookup(signature: &TypeSignature) -> Result<&'static TypePolicy, ResolveError> {
    POLICIES
        .iter()
        .find(|policy| policy.name == signature.name && policy.unsigned == signature.unsigned)
        .ok_or(ResolveError::Unsupported)
}

/// Remote column type used when the engine creates a table with the given
/// engine type (the write direction of the policy table).
pub fn remote_type_for(column: &str, engine_type: &EngineType) -> Result<String, ConnectorError> {
    let remote = match engine_type {
        EngineType::Boolean => "BOOLEAN".to_string(),
        EngineType::TinyInt => "TINYINT".to_string(),
        EngineType::SmallInt => "SMALLINT".to_string(),
        EngineType::Integer => "INT".to_string(),
        EngineType::BigInt => "BIGINT".to_string(),
        EngineType::Real => "FLOAT".to_string(),
        EngineType::Double => "DOUBLE".to_string(),
        EngineType::Decimal { precision, scale } => {
            if *precision > EngineType::MAX_DECIMAL_PRECISION {
                return Err(ConnectorError::PrecisionOverflow {
                    column: column.to_string(),
                    precision: *precision as u32,
                    maximum: EngineType::MAX_DECIMAL_PRECISION as u32,
                });
            }
            format!("DECIMAL({}, {})", precision, scale)
        }
        // bounded lengths are created at the smallest remote storage width
        // that holds them
        EngineType::Varchar { length: Some(length) } => match *length {
            0..=255 => "VARCHAR(255)".to_string(),
            256..=65_535 => "VARCHAR(65535)".to_string(),
            65_536..=16_777_215 => "VARCHAR(16777215)".to_string(),
            _ => "VARCHAR".to_string(),
        },
        EngineType::Varchar { length: None } => "VARCHAR".to_string(),
        EngineType::Varbinary => "VARBINARY".to_string(),
        EngineType::Date => "DATE".to_string(),
        EngineType::Time { precision } => {
            format!("TIME({})", precision.min(&EngineType::MAX_REMOTE_TEMPORAL_PRECISION))
        }
        EngineType::Timestamp { precision } => {
            format!("DATETIME({})", precision.min(&EngineType::MAX_REMOTE_TEMPORAL_PRECISION))
        }
        EngineType::TimestampWithZone { precision } => {
            format!("TIMESTAMP({})", precision.min(&EngineType::MAX_REMOTE_TEMPORAL_PRECISION))
        }
        EngineType::Json => "JSON".to_string(),
    };
    Ok(remote)
}
