use serde::Deserialize;
use service_core::config::{self as core_config, get_env, is_production};
use service_core::error::AppError;
use std::env;

pub const SERVICE_NAME: &str = "invoicing-service";

#[derive(Debug, Clone, Deserialize)]
pub struct InvoicingConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub company: CompanyConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Unset outside production means the in-memory store is used.
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Letterhead printed on invoices.
#[derive(Debug, Clone, Deserialize)]
pub struct CompanyConfig {
    pub name: String,
    pub address: String,
}

impl Default for InvoicingConfig {
    fn default() -> Self {
        Self {
            common: core_config::Config::default(),
            log_level: "info".to_string(),
            otlp_endpoint: None,
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                min_connections: 1,
            },
            company: CompanyConfig {
                name: "Invoices Inc.".to_string(),
                address: "1 Main Street".to_string(),
            },
        }
    }
}

impl InvoicingConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = is_production();
        let defaults = Self::default();

        let database_url = if is_prod {
            Some(get_env("DATABASE_URL", None, is_prod)?)
        } else {
            env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty())
        };

        Ok(InvoicingConfig {
            common: common_config,
            log_level: get_env("LOG_LEVEL", Some(&defaults.log_level), false)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|e| !e.trim().is_empty()),
            database: DatabaseConfig {
                url: database_url,
                max_connections: parse_env(
                    "DATABASE_MAX_CONNECTIONS",
                    defaults.database.max_connections,
                )?,
                min_connections: parse_env(
                    "DATABASE_MIN_CONNECTIONS",
                    defaults.database.min_connections,
                )?,
            },
            company: CompanyConfig {
                name: get_env("COMPANY_NAME", Some(&defaults.company.name), is_prod)?,
                address: get_env("COMPANY_ADDRESS", Some(&defaults.company.address), is_prod)?,
            },
        })
    }
}

fn parse_env(key: &str, default: u32) -> Result<u32, AppError> {
    match env::var(key) {
        Ok(value) => value.trim().parse().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("{} must be a number: {}", key, e))
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_run_without_a_database() {
        let config = InvoicingConfig::default();
        assert!(config.database.url.is_none());
        assert_eq!(config.common.port, 8080);
        assert!(config.database.min_connections <= config.database.max_connections);
    }

    #[test]
    fn unset_numeric_env_uses_default() {
        assert_eq!(parse_env("INVOICING_TEST_UNSET_NUMBER", 7).unwrap(), 7);
    }
}
