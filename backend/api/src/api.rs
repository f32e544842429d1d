//! Axum REST API handlers.
//!
//! Thin by design: every handler maps 1:1 onto a ledger / lifecycle /
//! reconciliation operation and contributes nothing but extraction and
//! response shaping.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use funding::{lifecycle, Investment, PaymentMethod, Project, ProjectStatus};

use crate::auth::{self, AuthPrincipal};
use crate::config::Config;
use crate::db;
use crate::errors::{ApiError, Result};
use crate::ledger;
use crate::payments::{self, PaymentProcessor};

#[derive(Clone)]
pub struct ApiState {
    pub pool: SqlitePool,
    pub config: Config,
    pub processor: Arc<dyn PaymentProcessor>,
}

// ─────────────────────────────────────────────────────────
// Request / response shapes
// ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateProjectRequest {
    pub title: String,
    pub description: String,
    pub goal: Decimal,
    pub deadline: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct CreateInvestmentRequest {
    pub project_id: i64,
    pub amount: Decimal,
    #[serde(default)]
    pub method: Option<PaymentMethod>,
}

#[derive(Deserialize)]
pub struct ConfirmPaymentRequest {
    pub payment_intent_id: String,
}

#[derive(Serialize)]
pub struct ProjectResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub goal: Decimal,
    pub amount_raised: Decimal,
    pub status: ProjectStatus,
    pub deadline: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub owner_id: i64,
    pub funded_percentage: Decimal,
    pub days_remaining: i64,
    pub is_expired: bool,
    pub investor_count: i64,
}

impl ProjectResponse {
    fn build(project: Project, investor_count: i64) -> Self {
        let now = Utc::now();
        Self {
            funded_percentage: project.funded_percentage(),
            days_remaining: project.days_remaining(now),
            is_expired: project.is_expired(now),
            investor_count,
            id: project.id,
            title: project.title,
            description: project.description,
            goal: project.goal,
            amount_raised: project.amount_raised,
            status: project.status,
            deadline: project.deadline,
            created_at: project.created_at,
            owner_id: project.owner_id,
        }
    }
}

/// Investment as surfaced to readers. The client secret is deliberately not
/// part of this shape; it leaves the system exactly once, in
/// [`IntentResponse`].
#[derive(Serialize)]
pub struct InvestmentResponse {
    pub id: i64,
    pub project_id: i64,
    pub investor_id: i64,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub status: funding::PaymentStatus,
    pub payment_intent_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Investment> for InvestmentResponse {
    fn from(i: Investment) -> Self {
        Self {
            id: i.id,
            project_id: i.project_id,
            investor_id: i.investor_id,
            amount: i.amount,
            method: i.method,
            status: i.status,
            payment_intent_id: i.intent_id,
            created_at: i.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct ProjectsResponse {
    pub count: usize,
    pub projects: Vec<ProjectResponse>,
}

#[derive(Serialize)]
pub struct InvestmentsResponse {
    pub count: usize,
    pub investments: Vec<InvestmentResponse>,
}

#[derive(Serialize)]
pub struct IntentResponse {
    pub client_secret: String,
    pub payment_intent_id: String,
}

#[derive(Serialize)]
pub struct RecheckResponse {
    pub project_id: i64,
    pub amount_raised: Decimal,
    pub status: ProjectStatus,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `POST /projects`
///
/// Project owners create projects; every project starts in
/// `PENDING_VALIDATION` and waits for an administrator.
pub async fn create_project(
    State(state): State<Arc<ApiState>>,
    AuthPrincipal(principal): AuthPrincipal,
    Json(req): Json<CreateProjectRequest>,
) -> Result<impl IntoResponse> {
    let now = Utc::now();
    lifecycle::check_create_project(
        &principal,
        &req.title,
        &req.description,
        req.goal,
        req.deadline,
        now,
    )?;

    let mut conn = state.pool.acquire().await?;
    let id = db::insert_project(
        &mut conn,
        db::NewProject {
            title: req.title.trim(),
            description: req.description.trim(),
            goal: &funding::money::format_amount(&req.goal),
            deadline: &req.deadline.to_rfc3339(),
            created_at: &now.to_rfc3339(),
            owner_id: principal.id,
            owner_email: &principal.email,
        },
    )
    .await?;

    let project: Project = db::get_project(&mut conn, id)
        .await?
        .ok_or(funding::FundingError::not_found("project", id))?
        .try_into()?;
    Ok((
        StatusCode::CREATED,
        Json(ProjectResponse::build(project, 0)),
    ))
}

/// `GET /projects`
pub async fn list_projects(
    State(state): State<Arc<ApiState>>,
    AuthPrincipal(principal): AuthPrincipal,
) -> Result<impl IntoResponse> {
    let scope = auth::visible_projects(&principal);
    let mut conn = state.pool.acquire().await?;
    let rows = db::list_projects(&mut conn, &scope).await?;

    let mut projects = Vec::with_capacity(rows.len());
    for row in rows {
        let project: Project = row.try_into()?;
        let investors = db::distinct_investor_count(&mut conn, project.id).await?;
        projects.push(ProjectResponse::build(project, investors));
    }
    Ok(Json(ProjectsResponse {
        count: projects.len(),
        projects,
    }))
}

/// `GET /projects/:id`
pub async fn get_project(
    State(state): State<Arc<ApiState>>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let mut conn = state.pool.acquire().await?;
    let project: Project = db::get_project(&mut conn, id)
        .await?
        .ok_or(funding::FundingError::not_found("project", id))?
        .try_into()?;

    // Unvalidated drafts are visible to their owner and admins only.
    let visible = match auth::visible_projects(&principal) {
        auth::ProjectScope::All => true,
        auth::ProjectScope::OwnedOrValidated(owner) => {
            project.owner_id == owner || project.status != ProjectStatus::PendingValidation
        }
        auth::ProjectScope::ValidatedOnly => project.status != ProjectStatus::PendingValidation,
    };
    if !visible {
        return Err(funding::FundingError::not_found("project", id).into());
    }

    let investors = db::distinct_investor_count(&mut conn, id).await?;
    Ok(Json(ProjectResponse::build(project, investors)))
}

/// `POST /projects/:id/validate` — administrative validation.
pub async fn validate_project(
    State(state): State<Arc<ApiState>>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let project = ledger::validate_project(&state.pool, &principal, id).await?;
    Ok(Json(ProjectResponse::build(project, 0)))
}

/// `POST /projects/:id/recheck` — administrative drift correction: re-run
/// the aggregator and lifecycle rule from the ledger.
pub async fn recheck_project(
    State(state): State<Arc<ApiState>>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    if principal.role != funding::Role::Admin {
        return Err(funding::FundingError::Forbidden.into());
    }
    let (amount_raised, status) = ledger::recompute(&state.pool, id).await?;
    Ok(Json(RecheckResponse {
        project_id: id,
        amount_raised,
        status,
    }))
}

/// `POST /investments`
pub async fn create_investment(
    State(state): State<Arc<ApiState>>,
    AuthPrincipal(principal): AuthPrincipal,
    Json(req): Json<CreateInvestmentRequest>,
) -> Result<impl IntoResponse> {
    let investment = ledger::record_investment(
        &state.pool,
        &state.config,
        &principal,
        req.project_id,
        req.amount,
        req.method.unwrap_or(PaymentMethod::Card),
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(InvestmentResponse::from(investment)),
    ))
}

/// `GET /investments`
pub async fn list_investments(
    State(state): State<Arc<ApiState>>,
    AuthPrincipal(principal): AuthPrincipal,
) -> Result<impl IntoResponse> {
    let scope = auth::visible_investments(&principal);
    let mut conn = state.pool.acquire().await?;
    let rows = db::list_investments(&mut conn, &scope).await?;

    let investments = rows
        .into_iter()
        .map(|row| Investment::try_from(row).map(InvestmentResponse::from))
        .collect::<std::result::Result<Vec<_>, ApiError>>()?;
    Ok(Json(InvestmentsResponse {
        count: investments.len(),
        investments,
    }))
}

/// `GET /investments/:id`
pub async fn get_investment(
    State(state): State<Arc<ApiState>>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let mut conn = state.pool.acquire().await?;
    let investment: Investment = db::get_investment(&mut conn, id)
        .await?
        .ok_or(funding::FundingError::not_found("investment", id))?
        .try_into()?;

    let project = db::get_project(&mut conn, investment.project_id)
        .await?
        .ok_or(funding::FundingError::not_found(
            "project",
            investment.project_id,
        ))?;
    if !auth::may_view_investment(&principal, investment.investor_id, project.owner_id) {
        return Err(funding::FundingError::not_found("investment", id).into());
    }
    Ok(Json(InvestmentResponse::from(investment)))
}

/// `POST /investments/:id/payment-intent` — reconciliation phase 1.
pub async fn create_payment_intent(
    State(state): State<Arc<ApiState>>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let intent = payments::create_intent(
        &state.pool,
        state.processor.as_ref(),
        &state.config,
        &principal,
        id,
    )
    .await?;
    Ok(Json(IntentResponse {
        client_secret: intent.client_secret,
        payment_intent_id: intent.intent_id,
    }))
}

/// `POST /investments/:id/confirm` — reconciliation phase 2.
pub async fn confirm_payment(
    State(state): State<Arc<ApiState>>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(id): Path<i64>,
    Json(req): Json<ConfirmPaymentRequest>,
) -> Result<impl IntoResponse> {
    let investment = payments::confirm_payment(
        &state.pool,
        state.processor.as_ref(),
        &principal,
        id,
        &req.payment_intent_id,
    )
    .await?;
    Ok(Json(InvestmentResponse::from(investment)))
}
