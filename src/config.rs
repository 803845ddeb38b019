//! Configuration management for the loans service

use chrono::Duration;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoansConfig {
    /// Days between loan date and due date when the caller gives no due date
    pub default_duration_days: i64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub loans: LoansConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on the environment-specific file
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add environment variables, e.g. LOANS_DATABASE__MAX_CONNECTIONS=4
            .add_source(
                Environment::with_prefix("LOANS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            // Override database URL from DATABASE_URL env var if present
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .build()?;

        config.try_deserialize()
    }
}

impl LoansConfig {
    /// Loan period as a duration, rejecting negative or unrepresentable values
    pub fn loan_period(&self) -> AppResult<Duration> {
        if self.default_duration_days < 0 {
            return Err(AppError::Validation(format!(
                "loans.default_duration_days must not be negative (got {})",
                self.default_duration_days
            )));
        }
        Duration::try_days(self.default_duration_days).ok_or_else(|| {
            AppError::Validation(format!(
                "loans.default_duration_days is too large (got {})",
                self.default_duration_days
            ))
        })
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://biblioteca.db".to_string(),
            max_connections: 5,
            min_connections: 1,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for LoansConfig {
    fn default() -> Self {
        Self {
            default_duration_days: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_loan_period_is_three_days() {
        let config = AppConfig::default();
        assert_eq!(config.loans.loan_period().unwrap(), Duration::days(3));
    }

    #[test]
    fn test_negative_loan_period_rejected() {
        let loans = LoansConfig {
            default_duration_days: -1,
        };
        assert!(matches!(loans.loan_period(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_unrepresentable_loan_period_rejected() {
        let loans = LoansConfig {
            default_duration_days: i64::MAX,
        };
        assert!(matches!(loans.loan_period(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_load_applies_environment_overrides() {
        env::set_var("LOANS_LOANS__DEFAULT_DURATION_DAYS", "14");
        env::set_var("LOANS_LOGGING__FORMAT", "json");
        env::set_var("DATABASE_URL", "sqlite::memory:");

        let config = AppConfig::load();

        env::remove_var("LOANS_LOANS__DEFAULT_DURATION_DAYS");
        env::remove_var("LOANS_LOGGING__FORMAT");
        env::remove_var("DATABASE_URL");

        let config = config.unwrap();
        assert_eq!(config.loans.default_duration_days, 14);
        assert_eq!(config.loans.loan_period().unwrap(), Duration::days(14));
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.database.url, "sqlite::memory:");
    }

    #[test]
    fn test_zero_loan_period_allowed() {
        let loans = LoansConfig {
            default_duration_days: 0,
        };
        assert_eq!(loans.loan_period().unwrap(), Duration::zero());
    }
}
