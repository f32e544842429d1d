//! Database row shapes and their conversions into domain values.
//!
//! Rows keep the TEXT encodings (decimal amounts, RFC 3339 timestamps,
//! SCREAMING_SNAKE_CASE statuses); all interpretation happens in the
//! `TryFrom` conversions so a corrupt row surfaces as an error instead of a
//! silent misread.

use chrono::{DateTime, Utc};
use funding::{money, Investment, PaymentMethod, PaymentStatus, Project, ProjectStatus};
use sqlx::FromRow;

use crate::errors::ApiError;

#[derive(Debug, Clone, FromRow)]
pub struct ProjectRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub goal: String,
    pub amount_raised: String,
    pub status: String,
    pub deadline: String,
    pub created_at: String,
    pub owner_id: i64,
    pub owner_email: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct InvestmentRow {
    pub id: i64,
    pub investor_id: i64,
    pub investor_email: String,
    pub project_id: i64,
    pub amount: String,
    pub method: String,
    pub status: String,
    pub intent_id: Option<String>,
    pub client_secret: Option<String>,
    pub created_at: String,
}

pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ApiError::Corrupt(format!("bad timestamp {s:?}: {e}")))
}

impl TryFrom<ProjectRow> for Project {
    type Error = ApiError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        Ok(Project {
            id: row.id,
            title: row.title,
            description: row.description,
            goal: money::parse_amount(&row.goal)?,
            amount_raised: money::parse_amount(&row.amount_raised)?,
            status: ProjectStatus::parse(&row.status)?,
            deadline: parse_timestamp(&row.deadline)?,
            created_at: parse_timestamp(&row.created_at)?,
            owner_id: row.owner_id,
            owner_email: row.owner_email,
        })
    }
}

impl TryFrom<InvestmentRow> for Investment {
    type Error = ApiError;

    fn try_from(row: InvestmentRow) -> Result<Self, Self::Error> {
        Ok(Investment {
            id: row.id,
            investor_id: row.investor_id,
            investor_email: row.investor_email,
            project_id: row.project_id,
            amount: money::parse_amount(&row.amount)?,
            method: PaymentMethod::parse(&row.method)?,
            status: PaymentStatus::parse(&row.status)?,
            intent_id: row.intent_id,
            client_secret: row.client_secret,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}
