//! Project lifecycle state machine.
//!
//! The transition rule is evaluated after any change to a project's raised
//! amount and after time-based checks. Rule order matters: the funded check
//! precedes the expiry check, so a project that reaches its goal in the same
//! instant its deadline passes is `Funded`, and a project exactly at goal is
//! `Funded` even with time to spare.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::errors::{FundingError, Result};
use crate::types::{Principal, Project, ProjectStatus, Role};

/// Compute the status a project should hold given its raised amount and the
/// current time.
///
/// * `PendingValidation` never auto-transitions — only [`validate`] leaves it.
/// * `Funded` and `Failed` are terminal.
pub fn evaluate(project: &Project, now: DateTime<Utc>) -> ProjectStatus {
    match project.status {
        ProjectStatus::PendingValidation => ProjectStatus::PendingValidation,
        s if s.is_terminal() => s,
        _ => {
            if project.is_funded() {
                ProjectStatus::Funded
            } else if project.is_expired(now) {
                ProjectStatus::Failed
            } else {
                ProjectStatus::Active
            }
        }
    }
}

/// Check the administrative validation action: `PendingValidation → Active`.
///
/// Fails with `Forbidden` for non-admins and `InvalidTransition` from any
/// other state, so a repeated call fails rather than succeeding twice.
pub fn check_validate(project: &Project, actor: &Principal) -> Result<ProjectStatus> {
    if actor.role != Role::Admin {
        return Err(FundingError::Forbidden);
    }
    if project.status != ProjectStatus::PendingValidation {
        return Err(FundingError::InvalidTransition(format!(
            "cannot validate a project in status {}",
            project.status.as_str()
        )));
    }
    Ok(ProjectStatus::Active)
}

/// Admission rule for project creation (recovered from the reference
/// validation rules): trimmed title ≥ 5 chars, trimmed description ≥ 50
/// chars, positive goal, future deadline, ProjectOwner role.
pub fn check_create_project(
    actor: &Principal,
    title: &str,
    description: &str,
    goal: Decimal,
    deadline: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<()> {
    if actor.role != Role::ProjectOwner {
        return Err(FundingError::RoleForbidden);
    }
    // Character counts, not byte lengths: accented titles must not get a
    // free pass from their UTF-8 width.
    if title.trim().chars().count() < 5 {
        return Err(FundingError::Validation(
            "title must be at least 5 characters".into(),
        ));
    }
    if description.trim().chars().count() < 50 {
        return Err(FundingError::Validation(
            "description must be at least 50 characters".into(),
        ));
    }
    if goal <= Decimal::ZERO {
        return Err(FundingError::Validation("goal must be positive".into()));
    }
    crate::money::check_scale(goal)?;
    if deadline <= now {
        return Err(FundingError::Validation(
            "deadline must be in the future".into(),
        ));
    }
    Ok(())
}
