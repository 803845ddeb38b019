//! Library loans
//!
//! Persistence and queries for loan (checkout) records of a library
//! management system: who borrowed which copy of which book, when it is
//! due, whether it came back, and how often it was renewed.

pub mod config;
pub mod error;
pub mod models;
pub mod repository;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use repository::{loans::LoansRepository, Repository};
