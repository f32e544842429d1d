//! Investment ledger and funding aggregator.
//!
//! This is the explicit orchestration layer: `settle`/`fail` apply the
//! storage-level compare-and-swap and `settle` then invokes the aggregator in
//! the same transaction, so a settlement and its project recomputation land
//! atomically and concurrent settlements against one project serialize on the
//! store. Nothing here talks to the payment processor — that is
//! [`crate::payments`]' job, and it calls in only after the processor's
//! verdict is known.

use chrono::Utc;
use funding::{
    ledger as rules, lifecycle, money, FundingError, Investment, PaymentMethod, PaymentStatus,
    Principal, Project, ProjectStatus,
};
use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use crate::config::Config;
use crate::db;
use crate::errors::{ApiError, Result};

/// Record a new `Pending` investment against an active project.
///
/// No effect on the project until settlement; a rejected admission writes
/// nothing.
pub async fn record_investment(
    pool: &SqlitePool,
    config: &Config,
    principal: &Principal,
    project_id: i64,
    amount: Decimal,
    method: PaymentMethod,
) -> Result<Investment> {
    let mut conn = pool.acquire().await?;

    let project: Project = db::get_project(&mut conn, project_id)
        .await?
        .ok_or(FundingError::not_found("project", project_id))?
        .try_into()?;

    let now = Utc::now();
    rules::check_record(principal, &project, amount, config.min_investment, now)?;

    let id = db::insert_investment(
        &mut conn,
        db::NewInvestment {
            investor_id: principal.id,
            investor_email: &principal.email,
            project_id,
            amount: &money::format_amount(&amount),
            method: method.as_str(),
            created_at: &now.to_rfc3339(),
        },
    )
    .await?;

    info!(investment = id, project = project_id, "investment recorded");
    fetch_investment(&mut conn, id).await
}

/// Settle an investment: `Pending → Settled`, then recompute the owning
/// project. One transaction; duplicate settlements lose the CAS and get
/// `InvalidState` without touching the books again.
pub async fn settle(pool: &SqlitePool, investment_id: i64) -> Result<Investment> {
    transition(pool, investment_id, PaymentStatus::Settled).await
}

/// Fail an investment: `Pending → Failed`. Failed investments never count
/// toward funding, so no aggregation runs.
pub async fn fail(pool: &SqlitePool, investment_id: i64) -> Result<Investment> {
    transition(pool, investment_id, PaymentStatus::Failed).await
}

async fn transition(
    pool: &SqlitePool,
    investment_id: i64,
    target: PaymentStatus,
) -> Result<Investment> {
    let mut tx = pool.begin().await?;

    let row = db::get_investment(&mut tx, investment_id)
        .await?
        .ok_or(FundingError::not_found("investment", investment_id))?;
    let current = PaymentStatus::parse(&row.status)?;
    rules::check_transition(current, target)?;

    let rows = db::cas_payment_status(&mut tx, investment_id, target).await?;
    if rows == 0 {
        // Raced with a concurrent confirmation between the read and the CAS.
        return Err(FundingError::InvalidState(format!(
            "investment {investment_id} is no longer PENDING"
        ))
        .into());
    }

    if target == PaymentStatus::Settled {
        let (amount, status) = recompute_on(&mut tx, row.project_id).await?;
        info!(
            project = row.project_id,
            raised = %amount,
            status = status.as_str(),
            "settlement aggregated"
        );
    }

    let investment = fetch_investment(&mut tx, investment_id).await?;
    tx.commit().await?;
    Ok(investment)
}

/// Administrative validation: the only way out of `PendingValidation`.
pub async fn validate_project(
    pool: &SqlitePool,
    principal: &Principal,
    project_id: i64,
) -> Result<Project> {
    let mut conn = pool.acquire().await?;

    let project: Project = db::get_project(&mut conn, project_id)
        .await?
        .ok_or(FundingError::not_found("project", project_id))?
        .try_into()?;
    lifecycle::check_validate(&project, principal)?;

    let rows = db::cas_activate_project(&mut conn, project_id).await?;
    if rows == 0 {
        return Err(FundingError::InvalidTransition(format!(
            "project {project_id} is no longer awaiting validation"
        ))
        .into());
    }

    info!(project = project_id, "project validated");
    fetch_project(&mut conn, project_id).await
}

/// Recompute a project's raised amount and status from its settled
/// investments. Idempotent; exposed to admins for drift correction and used
/// by the deadline sweeper.
pub async fn recompute(pool: &SqlitePool, project_id: i64) -> Result<(Decimal, ProjectStatus)> {
    let mut tx = pool.begin().await?;
    let result = recompute_on(&mut tx, project_id).await?;
    tx.commit().await?;
    Ok(result)
}

/// The aggregator: exact decimal sum of settled amounts, then the lifecycle
/// rule. Must run on the settling transaction so sum-then-write cannot lose
/// a concurrent update.
async fn recompute_on(
    conn: &mut SqliteConnection,
    project_id: i64,
) -> Result<(Decimal, ProjectStatus)> {
    let mut project: Project = db::get_project(conn, project_id)
        .await?
        .ok_or(FundingError::not_found("project", project_id))?
        .try_into()?;

    let mut total = Decimal::ZERO;
    for amount in db::settled_amounts(conn, project_id).await? {
        total += money::parse_amount(&amount)?;
    }

    project.amount_raised = total;
    let status = lifecycle::evaluate(&project, Utc::now());

    db::set_project_funding(conn, project_id, &money::format_amount(&total), status.as_str())
        .await?;
    Ok((total, status))
}

// ─────────────────────────────────────────────────────────
// Row → domain helpers
// ─────────────────────────────────────────────────────────

async fn fetch_investment(conn: &mut SqliteConnection, id: i64) -> Result<Investment> {
    db::get_investment(conn, id)
        .await?
        .ok_or(ApiError::from(FundingError::not_found("investment", id)))?
        .try_into()
}

async fn fetch_project(conn: &mut SqliteConnection, id: i64) -> Result<Project> {
    db::get_project(conn, id)
        .await?
        .ok_or(ApiError::from(FundingError::not_found("project", id)))?
        .try_into()
}

// ─────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────
