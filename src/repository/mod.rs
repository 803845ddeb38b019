//! Repository layer for database operations

pub mod loans;

use std::str::FromStr;

use chrono::Duration;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};

use crate::{config::DatabaseConfig, error::AppResult};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Sqlite>,
    pub loans: loans::LoansRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self {
            loans: loans::LoansRepository::new(pool.clone()),
            pool,
        }
    }

    /// Use a custom default loan period for new loans
    pub fn with_loan_period(mut self, loan_period: Duration) -> Self {
        self.loans = self.loans.with_loan_period(loan_period);
        self
    }
}

/// Open a pool with foreign key enforcement, creating the file if needed
pub async fn connect(config: &DatabaseConfig) -> AppResult<Pool<Sqlite>> {
    let options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_with(options)
        .await?;

    tracing::debug!("Opened sqlite pool at {}", config.url);
    Ok(pool)
}
