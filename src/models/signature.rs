// Remote column type signatures as declared by Databend
use crate::error::ConnectorError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A remote column's declared type: base name plus the parameters the remote
/// engine reports through its information schema. Constructed once per column
/// during schema discovery and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeSignature {
    /// Normalized (lowercase) base type name, e.g. "decimal"
    pub name: String,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub unsigned: bool,
    pub length: Option<u32>,
}

impl TypeSignature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_lowercase(),
            precision: None,
            scale: None,
            unsigned: false,
            length: None,
        }
    }

    pub fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    /// Parse a declared column type exactly as the remote engine reports it,
    /// e.g. "tinyint unsigned", "decimal(20, 5)", "varchar(255)",
    /// "datetime(3)".
    pub fn parse(decl: &str) -> Result<Self, ConnectorError> {
        let normalized = decl.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(ConnectorError::Validation(
                "Empty type declaration".to_string(),
            ));
        }

        // The unsigned marker may follow the base name or the parameter list
        let mut unsigned = false;
        let mut body = normalized.as_str();
        if let Some(stripped) = body.strip_suffix("unsigned") {
            unsigned = true;
            body = stripped.trim_end();
        }

        let (name, args) = match body.split_once('(') {
            Some((name, rest)) => {
                let inner = rest.trim_end().strip_suffix(')').ok_or_else(|| {
                    ConnectorError::Validation(format!("Malformed type declaration: {}", decl))
                })?;
                let args = inner
                    .split(',')
                    .map(|arg| arg.trim().parse::<u32>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|_| {
                        ConnectorError::Validation(format!(
                            "Malformed type parameters in declaration: {}",
                            decl
                        ))
                    })?;
                (name.trim(), args)
            }
            None => (body.trim(), Vec::new()),
        };

        if name.is_empty() {
            return Err(ConnectorError::Validation(format!(
                "Malformed type declaration: {}",
                decl
            )));
        }

        let mut signature = TypeSignature::new(name);
        signature.unsigned = unsigned;
        if Self::is_character(name) {
            signature.length = args.first().copied();
        } else {
            signature.precision = args.first().copied();
            signature.scale = args.get(1).copied();
        }
        Ok(signature)
    }

    /// Character and binary families carry a length, everything else carries
    /// precision and scale.
    fn is_character(name: &str) -> bool {
        matches!(name, "varchar" | "char" | "string" | "binary" | "varbinary")
    }
}

impl fmt::Display for TypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(length) = self.length {
            write!(f, "({})", length)?;
        } else if let Some(precision) = self.precision {
            match self.scale {
                Some(scale) => write!(f, "({}, {})", precision, scale)?,
                None => write!(f, "({})", precision)?,
            }
        }
        if self.unsigned {
            write!(f, " unsigned")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_name() {
        let signature = TypeSignature::parse("bigint").unwrap();
        assert_eq!(signature, TypeSignature::new("bigint"));
    }

    #[test]
    fn test_parse_normalizes_case_and_whitespace() {
        let signature = TypeSignature::parse("  TINYINT  ").unwrap();
        assert_eq!(signature.name, "tinyint");
        assert!(!signature.unsigned);
    }

    #[test]
    fn test_parse_unsigned_suffix() {
        let signature = TypeSignature::parse("TINYINT UNSIGNED").unwrap();
        assert_eq!(signature, TypeSignature::new("tinyint").unsigned());

        let signature = TypeSignature::parse("int(11) unsigned").unwrap();
        assert_eq!(signature.name, "int");
        assert!(signature.unsigned);
        assert_eq!(signature.precision, Some(11));
    }

    #[test]
    fn test_parse_decimal_parameters() {
        let signature = TypeSignature::parse("decimal(20, 5)").unwrap();
        assert_eq!(signature.precision, Some(20));
        assert_eq!(signature.scale, Some(5));
        assert_eq!(signature.length, None);
    }

    #[test]
    fn test_parse_varchar_length() {
        let signature = TypeSignature::parse("varchar(255)").unwrap();
        assert_eq!(signature.length, Some(255));
        assert_eq!(signature.precision, None);
    }

    #[test]
    fn test_parse_temporal_precision() {
        let signature = TypeSignature::parse("datetime(3)").unwrap();
        assert_eq!(signature.precision, Some(3));

        let signature = TypeSignature::parse("timestamp").unwrap();
        assert_eq!(signature.precision, None);
    }

    #[test]
    fn test_parse_rejects_malformed_declarations() {
        assert!(TypeSignature::parse("").is_err());
        assert!(TypeSignature::parse("decimal(20").is_err());
        assert!(TypeSignature::parse("decimal(a, b)").is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for decl in ["tinyint unsigned", "decimal(20, 5)", "varchar(255)", "datetime(3)", "json"] {
            let signature = TypeSignature::parse(decl).unwrap();
            assert_eq!(signature.to_string(), decl);
        }
    }
}
