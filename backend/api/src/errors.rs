//! Application-wide error types and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use funding::FundingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Funding(#[from] FundingError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// A stored row failed to decode into a domain value.
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Funding(e) => match e {
                FundingError::Validation(_)
                | FundingError::PaymentFailed
                | FundingError::PaymentProvider(_) => StatusCode::BAD_REQUEST,
                FundingError::Forbidden
                | FundingError::RoleForbidden
                | FundingError::SelfInvestmentForbidden => StatusCode::FORBIDDEN,
                FundingError::NotFound { .. } => StatusCode::NOT_FOUND,
                FundingError::InvalidState(_)
                | FundingError::InvalidTransition(_)
                | FundingError::ProjectNotAcceptingFunds
                | FundingError::IntentMismatch => StatusCode::CONFLICT,
            },
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Http(_) => StatusCode::BAD_GATEWAY,
            ApiError::Database(_)
            | ApiError::Migrate(_)
            | ApiError::Config(_)
            | ApiError::Corrupt(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Internal causes are logged, not leaked to clients.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("internal error: {self}");
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
