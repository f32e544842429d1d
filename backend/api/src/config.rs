//! Application configuration loaded from environment variables.

use rust_decimal::Decimal;

use crate::errors::{ApiError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite database file
    pub database_url: String,
    /// Port for the REST API server
    pub api_port: u16,
    /// Secret key used to authenticate against the payment processor
    pub stripe_secret_key: String,
    /// Processor API base URL (overridable for sandboxes)
    pub stripe_api_base: String,
    /// ISO currency code sent with every payment intent
    pub currency: String,
    /// Minimum amount accepted for a single investment
    pub min_investment: Decimal,
    /// How often (in seconds) the deadline sweeper re-evaluates active projects
    pub sweep_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            database_url: env_var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:./crowdfund.db".to_string()),
            api_port: env_var("API_PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .map_err(|_| ApiError::Config("Invalid API_PORT".to_string()))?,
            stripe_secret_key: env_var("STRIPE_SECRET_KEY").map_err(|_| {
                ApiError::Config("STRIPE_SECRET_KEY environment variable is required".to_string())
            })?,
            stripe_api_base: env_var("STRIPE_API_BASE")
                .unwrap_or_else(|_| "https://api.stripe.com".to_string()),
            currency: env_var("CURRENCY").unwrap_or_else(|_| "eur".to_string()),
            min_investment: env_var("MIN_INVESTMENT")
                .unwrap_or_else(|_| "1.00".to_string())
                .parse()
                .map_err(|_| ApiError::Config("Invalid MIN_INVESTMENT".to_string()))?,
            sweep_interval_secs: env_var("SWEEP_INTERVAL_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .map_err(|_| ApiError::Config("Invalid SWEEP_INTERVAL_SECS".to_string()))?,
        })
    }
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| ApiError::Config(format!("Missing env var: {key}")))
}
