// Type descriptor resolver
//
// Turns remote column signatures into engine-side column mappings. Pure:
// resolving the same signature twice, even concurrently, yields structurally
// equal mappings, so racing first resolutions just duplicate harmless work.

use crate::config::ConnectorConfig;
use crate::models::{
    ColumnMapping, EngineType, RemoteColumn, ResolvedTable, TableHandle, TypeSignature,
    ValidatorKind,
};
use crate::services::policy::{self, ResolveError};
use std::collections::HashSet;
use tracing::warn;

pub struct TypeResolver {
    /// Remote type names opted into an unbounded-varchar pass-through
    /// instead of being hidden.
    types_mapped_to_varchar: HashSet<String>,
}

impl TypeResolver {
    pub fn new(config: &ConnectorConfig) -> Self {
        Self::with_varchar_fallback(
            config
                .types
                .mapped_to_varchar
                .iter()
                .map(|name| name.to_lowercase())
                .collect(),
        )
    }

    pub fn with_varchar_fallback(types_mapped_to_varchar: HashSet<String>) -> Self {
        Self { types_mapped_to_varchar }
    }

    /// Resolve one column. Signatures without a policy entry, and
    /// signatures whose declared precision cannot be represented, come back
    /// with `supported = false` so schema resolution can hide them; the read
    /// path never raises for an absent column.
    pub fn resolve(&self, column: &str, signature: &TypeSignature) -> ColumnMapping {
        let outcome = policy::lookup(signature)
            .and_then(|policy| Ok(((policy.engine_type)(signature)?, policy)));
        match outcome {
            Ok((engine_type, policy)) => ColumnMapping {
                column: column.to_string(),
                signature: signature.clone(),
                engine_type,
                codec: policy.codec,
                validator: policy.validator,
                supported: true,
            },
            Err(ResolveError::PrecisionOverflow { precision, maximum }) => {
                warn!(
                    "Hiding column '{}': declared precision {} of type '{}' exceeds maximum {}",
                    column, precision, signature, maximum
                );
                ColumnMapping::unsupported(column, signature.clone())
            }
            Err(ResolveError::Unsupported) => {
                if self.types_mapped_to_varchar.contains(&signature.name) {
                    return ColumnMapping {
                        column: column.to_string(),
                        signature: signature.clone(),
                        engine_type: EngineType::unbounded_varchar(),
                        codec: crate::models::CodecKind::Varchar,
                        validator: ValidatorKind::Varchar,
                        supported: true,
                    };
                }
                warn!("Hiding column '{}': unsupported type '{}'", column, signature);
                ColumnMapping::unsupported(column, signature.clone())
            }
        }
    }

    /// Resolve one discovered column, treating an unparseable declaration
    /// the same as an unsupported type.
    pub fn resolve_column(&self, column: &RemoteColumn) -> ColumnMapping {
        match TypeSignature::parse(&column.type_decl) {
            Ok(signature) => self.resolve(&column.name, &signature),
            Err(_) => {
                warn!(
                    "Hiding column '{}': unparseable type declaration '{}'",
                    column.name, column.type_decl
                );
                ColumnMapping::unsupported(&column.name, TypeSignature::new(&column.type_decl))
            }
        }
    }

    /// Resolve a table's visible schema. Unsupported columns are excluded
    /// from the column list and recorded by name.
    pub fn resolve_table(&self, handle: TableHandle, columns: &[RemoteColumn]) -> ResolvedTable {
        let mut visible = Vec::with_capacity(columns.len());
        let mut hidden = Vec::new();
        for column in columns {
            let mapping = self.resolve_column(column);
            if mapping.supported {
                visible.push(mapping);
            } else {
                hidden.push(column.name.clone());
            }
        }
        ResolvedTable::new(handle, visible, hidden)
    }
}

impl Default for TypeResolver {
    fn default() -> Self {
        Self::with_varchar_fallback(HashSet::new())
    }
}
