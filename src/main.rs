//! Library loans maintenance tool
//!
//! Ensures the loans table exists and logs a report of overdue loans.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use library_loans::{config::AppConfig, repository, Repository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("library_loans={},sqlx=warn", config.logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting library-loans v{}", env!("CARGO_PKG_VERSION"));

    let pool = repository::connect(&config.database).await?;
    tracing::info!("Connected to database");

    let repository = Repository::new(pool.clone())
        .with_loan_period(config.loans.loan_period()?);

    repository.loans.create_table().await?;

    let active = repository.loans.count_active().await?;
    let overdue = repository.loans.get_overdue().await?;
    tracing::info!("{} active loans, {} overdue", active, overdue.len());

    for loan in &overdue {
        tracing::warn!(
            "Loan {} overdue since {}: \"{}\" ({}) borrowed by {}",
            loan.id,
            loan.due_date.date(),
            loan.book_title,
            loan.publisher_name,
            loan.user_name
        );
    }

    pool.close().await;
    Ok(())
}
