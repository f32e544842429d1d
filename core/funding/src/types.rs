//! # Types
//!
//! Shared data structures used across the funding engine and the service
//! crate.
//!
//! ## Status as a Finite-State Machine
//!
//! [`ProjectStatus`] enforces a strict lifecycle:
//!
//! ```text
//! PendingValidation ──► Active ──► Funded
//!                          └─────► Failed
//! ```
//!
//! `PendingValidation` is only left by an explicit administrative validation;
//! `Funded` and `Failed` are terminal. [`PaymentStatus`] is the investment's
//! own machine: `Pending ──► Settled | Failed`, both terminal.
//!
//! All enums carry a stable SCREAMING_SNAKE_CASE wire form used both in JSON
//! payloads and as the TEXT column encoding in the database.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::FundingError;

// ─────────────────────────────────────────────────────────
// Enums
// ─────────────────────────────────────────────────────────

/// Lifecycle status of a project.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    /// Created, awaiting administrative validation. Not accepting funds.
    PendingValidation,
    /// Validated and accepting investments.
    Active,
    /// Goal reached. Terminal.
    Funded,
    /// Deadline passed below goal. Terminal.
    Failed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::PendingValidation => "PENDING_VALIDATION",
            ProjectStatus::Active => "ACTIVE",
            ProjectStatus::Funded => "FUNDED",
            ProjectStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Result<Self, FundingError> {
        match s {
            "PENDING_VALIDATION" => Ok(ProjectStatus::PendingValidation),
            "ACTIVE" => Ok(ProjectStatus::Active),
            "FUNDED" => Ok(ProjectStatus::Funded),
            "FAILED" => Ok(ProjectStatus::Failed),
            other => Err(FundingError::Validation(format!(
                "unknown project status: {other}"
            ))),
        }
    }

    /// Terminal states admit no further automatic transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProjectStatus::Funded | ProjectStatus::Failed)
    }
}

/// Payment status of an investment.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Recorded, payment not yet confirmed by the processor.
    Pending,
    /// Processor confirmed success; counts toward project funding.
    Settled,
    /// Processor reported failure or mismatch. Never counts.
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Settled => "SETTLED",
            PaymentStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Result<Self, FundingError> {
        match s {
            "PENDING" => Ok(PaymentStatus::Pending),
            "SETTLED" => Ok(PaymentStatus::Settled),
            "FAILED" => Ok(PaymentStatus::Failed),
            other => Err(FundingError::Validation(format!(
                "unknown payment status: {other}"
            ))),
        }
    }
}

/// How the investor pays.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Card,
    BankTransfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "CARD",
            PaymentMethod::BankTransfer => "BANK_TRANSFER",
        }
    }

    pub fn parse(s: &str) -> Result<Self, FundingError> {
        match s {
            "CARD" => Ok(PaymentMethod::Card),
            "BANK_TRANSFER" => Ok(PaymentMethod::BankTransfer),
            other => Err(FundingError::Validation(format!(
                "unknown payment method: {other}"
            ))),
        }
    }
}

/// Exactly one role per principal, supplied by the identity collaborator.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Creates projects and receives funds.
    ProjectOwner,
    /// Commits money to other people's projects.
    Investor,
    /// Validates projects and sees everything.
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::ProjectOwner => "PROJECT_OWNER",
            Role::Investor => "INVESTOR",
            Role::Admin => "ADMIN",
        }
    }

    pub fn parse(s: &str) -> Result<Self, FundingError> {
        match s {
            "PROJECT_OWNER" => Ok(Role::ProjectOwner),
            "INVESTOR" => Ok(Role::Investor),
            "ADMIN" => Ok(Role::Admin),
            other => Err(FundingError::Validation(format!("unknown role: {other}"))),
        }
    }
}

// ─────────────────────────────────────────────────────────
// Entities
// ─────────────────────────────────────────────────────────

/// The authenticated actor for the current request.
///
/// Produced by the identity collaborator upstream; the engine trusts it per
/// request and never caches it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

/// A funding project.
///
/// `amount_raised` is owned by the aggregator: it is always the exact sum of
/// settled investments against the project and is never written by clients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Funding goal, positive, scale 2 (currency minor-unit precision).
    pub goal: Decimal,
    /// Sum of settled investments. Starts at zero.
    pub amount_raised: Decimal,
    pub status: ProjectStatus,
    pub deadline: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub owner_id: i64,
    pub owner_email: String,
}

impl Project {
    /// Funded percentage, capped at 100. Zero when the goal is zero.
    pub fn funded_percentage(&self) -> Decimal {
        if self.goal > Decimal::ZERO {
            (self.amount_raised / self.goal * Decimal::ONE_HUNDRED).min(Decimal::ONE_HUNDRED)
        } else {
            Decimal::ZERO
        }
    }

    pub fn is_funded(&self) -> bool {
        self.amount_raised >= self.goal
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.deadline
    }

    /// Whole days until the deadline, rounded up; zero once expired.
    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        if self.is_expired(now) {
            return 0;
        }
        let secs = (self.deadline - now).num_seconds();
        (secs + 86_399) / 86_400
    }
}

/// A single committed investment. Append-only: amounts are immutable and
/// records are never deleted, only transitioned.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Investment {
    pub id: i64,
    pub investor_id: i64,
    /// Snapshot of the investor's email at record time, forwarded to the
    /// processor as intent metadata.
    pub investor_email: String,
    pub project_id: i64,
    /// Positive, scale 2, at least the configured minimum. Immutable.
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// Processor-side intent handle, set during phase 1 of reconciliation.
    pub intent_id: Option<String>,
    /// Client-held secret completing the payment. Sensitive: surfaced once
    /// by intent creation, never by reads, never logged.
    #[serde(skip_serializing, default)]
    pub client_secret: Option<String>,
    pub created_at: DateTime<Utc>,
}
