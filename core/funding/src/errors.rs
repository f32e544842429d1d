//! Domain error taxonomy.
//!
//! Every state-changing operation either succeeds or returns one of these and
//! leaves prior state untouched. The service crate maps the taxonomy onto
//! HTTP statuses; nothing here knows about transport.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FundingError {
    /// Malformed or out-of-range input; user-correctable.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The acting principal's role does not permit the operation.
    #[error("role does not permit this operation")]
    RoleForbidden,

    /// A project owner may not invest in their own project.
    #[error("cannot invest in your own project")]
    SelfInvestmentForbidden,

    /// The project is not Active or its deadline has passed.
    #[error("project is not accepting funds")]
    ProjectNotAcceptingFunds,

    /// Ownership mismatch: the principal is not the actor the operation
    /// belongs to.
    #[error("permission denied")]
    Forbidden,

    /// The entity is not in a state that permits the requested transition.
    /// Also returned to the loser of a settlement race.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// An explicit lifecycle transition was requested from the wrong state.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// The supplied intent id does not match the one stored on the
    /// investment — stale client or tampering.
    #[error("payment intent id does not match")]
    IntentMismatch,

    /// The processor reported a terminal non-success status.
    #[error("payment failed")]
    PaymentFailed,

    /// The external processor call itself failed; the caller may retry
    /// intent creation, and confirmation remains retryable while Pending.
    #[error("payment provider error: {0}")]
    PaymentProvider(String),
}

impl FundingError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        FundingError::NotFound { entity, id }
    }
}

pub type Result<T> = std::result::Result<T, FundingError>;
