use crate::error::ConnectorError;
use serde::Deserialize;
use std::env;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectorConfig {
    pub connection: ConnectionConfig,
    pub cache: CacheConfig,
    pub types: TypeMappingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    pub url: Option<String>,
    pub timeout_secs: u64,
    pub presigned_url_disabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub maximum_size: usize,
    pub cache_missing: bool,
    /// Zero disables metadata caching
    pub metadata_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeMappingConfig {
    /// Remote type names surfaced as unbounded varchar instead of hidden
    pub mapped_to_varchar: Vec<String>,
}

impl ConnectorConfig {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("connection.url", None::<String>)?
            .set_default("connection.timeout_secs", 60)?
            .set_default("connection.presigned_url_disabled", false)?
            .set_default("cache.maximum_size", 10_000)?
            .set_default("cache.cache_missing", false)?
            .set_default("cache.metadata_ttl_secs", 0)?
            .set_default("types.mapped_to_varchar", Vec::<String>::new())?;

        // Load from environment variables
        if let Ok(url) = env::var("DATABEND_URL") {
            builder = builder.set_override("connection.url", Some(url))?;
        }

        if let Ok(timeout) = env::var("DATABEND_CONNECTION_TIMEOUT") {
            builder = builder
                .set_override("connection.timeout_secs", timeout.parse::<u64>().unwrap_or(60))?;
        }

        if let Ok(disabled) = env::var("DATABEND_PRESIGNED_URL_DISABLED") {
            builder = builder.set_override(
                "connection.presigned_url_disabled",
                disabled.parse::<bool>().unwrap_or(false),
            )?;
        }

        if let Ok(size) = env::var("DATABEND_CACHE_MAXIMUM_SIZE") {
            builder = builder
                .set_override("cache.maximum_size", size.parse::<u64>().unwrap_or(10_000))?;
        }

        if let Ok(missing) = env::var("DATABEND_CACHE_MISSING") {
            builder = builder
                .set_override("cache.cache_missing", missing.parse::<bool>().unwrap_or(false))?;
        }

        if let Ok(ttl) = env::var("DATABEND_METADATA_CACHE_TTL") {
            builder =
                builder.set_override("cache.metadata_ttl_secs", ttl.parse::<u64>().unwrap_or(0))?;
        }

        if let Ok(names) = env::var("DATABEND_TYPES_MAPPED_TO_VARCHAR") {
            let names: Vec<String> = names
                .split(',')
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect();
            builder = builder.set_override("types.mapped_to_varchar", names)?;
        }

        // Try to load from .env file
        let _ = dotenv::dotenv();

        builder.build()?.try_deserialize()
    }

    /// Check the configured connection URL parses and carries the expected
    /// scheme. The URL itself is only ever consumed by the transport layer.
    pub fn validate_connection_url(&self) -> Result<(), ConnectorError> {
        let raw = self.connection.url.as_deref().ok_or_else(|| {
            ConnectorError::Configuration("connection URL is not set".to_string())
        })?;
        let url = Url::parse(raw)
            .map_err(|e| ConnectorError::Configuration(format!("Invalid connection URL: {}", e)))?;
        if url.scheme() != "databend" {
            return Err(ConnectorError::Configuration(
                "URL must use databend:// scheme".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clear_env() {
        env::remove_var("DATABEND_URL");
        env::remove_var("DATABEND_CONNECTION_TIMEOUT");
        env::remove_var("DATABEND_PRESIGNED_URL_DISABLED");
        env::remove_var("DATABEND_CACHE_MAXIMUM_SIZE");
        env::remove_var("DATABEND_CACHE_MISSING");
        env::remove_var("DATABEND_METADATA_CACHE_TTL");
        env::remove_var("DATABEND_TYPES_MAPPED_TO_VARCHAR");
    }

    #[test]
    fn test_config_defaults() {
        clear_env();

        let config = ConnectorConfig::from_env();
        assert!(config.is_ok());

        let config = config.unwrap();
        assert_eq!(config.connection.url, None);
        assert_eq!(config.connection.timeout_secs, 60);
        assert!(!config.connection.presigned_url_disabled);
        assert_eq!(config.cache.maximum_size, 10_000);
        assert!(!config.cache.cache_missing);
        assert_eq!(config.cache.metadata_ttl_secs, 0);
        assert!(config.types.mapped_to_varchar.is_empty());
    }

    #[test]
    fn test_connection_url_validation() {
        let mut config = ConnectorConfig {
            connection: ConnectionConfig {
                url: Some("databend://root:@localhost:8000/default".to_string()),
                timeout_secs: 60,
                presigned_url_disabled: false,
            },
            cache: CacheConfig {
                maximum_size: 10_000,
                cache_missing: false,
                metadata_ttl_secs: 0,
            },
            types: TypeMappingConfig { mapped_to_varchar: Vec::new() },
        };
        assert!(config.validate_connection_url().is_ok());

        config.connection.url = Some("mysql://localhost:3306".to_string());
        assert!(config.validate_connection_url().is_err());

        config.connection.url = None;
        assert!(config.validate_connection_url().is_err());
    }
}
