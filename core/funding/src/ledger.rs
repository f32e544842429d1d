//! Investment admission and settlement rules.
//!
//! The ledger proper (rows, conditional updates) lives in the service crate;
//! this module is the rulebook it consults: who may record an investment
//! against which project, and which payment-status transitions exist.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::errors::{FundingError, Result};
use crate::money;
use crate::types::{PaymentStatus, Principal, Project, ProjectStatus, Role};

/// Admission rule for recording an investment.
///
/// Order of checks follows the reference behaviour: amount first, then the
/// project's ability to accept funds, then actor constraints.
pub fn check_record(
    investor: &Principal,
    project: &Project,
    amount: Decimal,
    min_amount: Decimal,
    now: DateTime<Utc>,
) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(FundingError::Validation(
            "amount must be greater than zero".into(),
        ));
    }
    if amount < min_amount {
        return Err(FundingError::Validation(format!(
            "minimum investment is {min_amount}"
        )));
    }
    money::check_scale(amount)?;
    if project.status != ProjectStatus::Active || project.is_expired(now) {
        return Err(FundingError::ProjectNotAcceptingFunds);
    }
    if investor.id == project.owner_id {
        return Err(FundingError::SelfInvestmentForbidden);
    }
    if investor.role != Role::Investor {
        return Err(FundingError::RoleForbidden);
    }
    Ok(())
}

/// The only legal payment transitions: `Pending → Settled | Failed`.
///
/// Settlement and failure must be applied as a compare-and-swap on status at
/// the storage layer; this check is the pure half that produces the error the
/// loser of that race receives.
pub fn check_transition(current: PaymentStatus, target: PaymentStatus) -> Result<()> {
    if current != PaymentStatus::Pending {
        return Err(FundingError::InvalidState(format!(
            "investment is {}, not PENDING",
            current.as_str()
        )));
    }
    if target == PaymentStatus::Pending {
        return Err(FundingError::InvalidState(
            "cannot transition back to PENDING".into(),
        ));
    }
    Ok(())
}
