//! Database layer — migrations and queries.
//!
//! Every function takes a `&mut SqliteConnection` so callers decide the
//! transaction boundary: the ledger runs settlement and aggregation on one
//! transaction, read paths use a plain acquired connection.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use funding::PaymentStatus;

use crate::auth::{InvestmentScope, ProjectScope};
use crate::errors::Result;
use crate::models::{InvestmentRow, ProjectRow};

/// Establish a SQLite connection pool and run pending migrations.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    // Make sure the file is created if it doesn't exist yet.
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{database_url}")
    };

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied successfully");
    Ok(pool)
}

// ─────────────────────────────────────────────────────────
// Projects
// ─────────────────────────────────────────────────────────

pub struct NewProject<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub goal: &'a str,
    pub deadline: &'a str,
    pub created_at: &'a str,
    pub owner_id: i64,
    pub owner_email: &'a str,
}

/// Insert a project in its initial `PENDING_VALIDATION` state and return its id.
pub async fn insert_project(conn: &mut SqliteConnection, p: NewProject<'_>) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO projects
            (title, description, goal, amount_raised, status, deadline, created_at, owner_id, owner_email)
        VALUES (?1, ?2, ?3, '0.00', 'PENDING_VALIDATION', ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(p.title)
    .bind(p.description)
    .bind(p.goal)
    .bind(p.deadline)
    .bind(p.created_at)
    .bind(p.owner_id)
    .bind(p.owner_email)
    .execute(conn)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn get_project(conn: &mut SqliteConnection, id: i64) -> Result<Option<ProjectRow>> {
    let row = sqlx::query_as::<_, ProjectRow>("SELECT * FROM projects WHERE id = ?1")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// Fetch the projects visible under `scope`, newest first.
pub async fn list_projects(
    conn: &mut SqliteConnection,
    scope: &ProjectScope,
) -> Result<Vec<ProjectRow>> {
    let rows = match scope {
        ProjectScope::All => {
            sqlx::query_as::<_, ProjectRow>("SELECT * FROM projects ORDER BY created_at DESC")
                .fetch_all(conn)
                .await?
        }
        ProjectScope::OwnedOrValidated(owner_id) => {
            sqlx::query_as::<_, ProjectRow>(
                "SELECT * FROM projects
                 WHERE  owner_id = ?1 OR status != 'PENDING_VALIDATION'
                 ORDER  BY created_at DESC",
            )
            .bind(owner_id)
            .fetch_all(conn)
            .await?
        }
        ProjectScope::ValidatedOnly => {
            sqlx::query_as::<_, ProjectRow>(
                "SELECT * FROM projects WHERE status != 'PENDING_VALIDATION' ORDER BY created_at DESC",
            )
            .fetch_all(conn)
            .await?
        }
    };
    Ok(rows)
}

pub async fn active_projects(conn: &mut SqliteConnection) -> Result<Vec<ProjectRow>> {
    let rows = sqlx::query_as::<_, ProjectRow>("SELECT * FROM projects WHERE status = 'ACTIVE'")
        .fetch_all(conn)
        .await?;
    Ok(rows)
}

/// Distinct investors who ever recorded an investment against the project.
pub async fn distinct_investor_count(conn: &mut SqliteConnection, project_id: i64) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(DISTINCT investor_id) FROM investments WHERE project_id = ?1",
    )
    .bind(project_id)
    .fetch_one(conn)
    .await?;
    Ok(count)
}

/// Administrative validation: `PENDING_VALIDATION → ACTIVE` as a conditional
/// update. Zero rows affected means the project was not awaiting validation.
pub async fn cas_activate_project(conn: &mut SqliteConnection, id: i64) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE projects SET status = 'ACTIVE' WHERE id = ?1 AND status = 'PENDING_VALIDATION'",
    )
    .bind(id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// Aggregator write: the recomputed raised amount and the status it implies.
pub async fn set_project_funding(
    conn: &mut SqliteConnection,
    id: i64,
    amount_raised: &str,
    status: &str,
) -> Result<()> {
    sqlx::query("UPDATE projects SET amount_raised = ?2, status = ?3 WHERE id = ?1")
        .bind(id)
        .bind(amount_raised)
        .bind(status)
        .execute(conn)
        .await?;
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Investments
// ─────────────────────────────────────────────────────────

pub struct NewInvestment<'a> {
    pub investor_id: i64,
    pub investor_email: &'a str,
    pub project_id: i64,
    pub amount: &'a str,
    pub method: &'a str,
    pub created_at: &'a str,
}

/// Insert a `PENDING` investment and return its id.
pub async fn insert_investment(conn: &mut SqliteConnection, i: NewInvestment<'_>) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO investments
            (investor_id, investor_email, project_id, amount, method, status, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, 'PENDING', ?6)
        "#,
    )
    .bind(i.investor_id)
    .bind(i.investor_email)
    .bind(i.project_id)
    .bind(i.amount)
    .bind(i.method)
    .bind(i.created_at)
    .execute(conn)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn get_investment(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<InvestmentRow>> {
    let row = sqlx::query_as::<_, InvestmentRow>("SELECT * FROM investments WHERE id = ?1")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// Fetch the investments visible under `scope`, newest first.
pub async fn list_investments(
    conn: &mut SqliteConnection,
    scope: &InvestmentScope,
) -> Result<Vec<InvestmentRow>> {
    let rows = match scope {
        InvestmentScope::All => {
            sqlx::query_as::<_, InvestmentRow>("SELECT * FROM investments ORDER BY created_at DESC")
                .fetch_all(conn)
                .await?
        }
        InvestmentScope::ByInvestor(investor_id) => {
            sqlx::query_as::<_, InvestmentRow>(
                "SELECT * FROM investments WHERE investor_id = ?1 ORDER BY created_at DESC",
            )
            .bind(investor_id)
            .fetch_all(conn)
            .await?
        }
        InvestmentScope::IntoProjectsOf(owner_id) => {
            sqlx::query_as::<_, InvestmentRow>(
                r#"
                SELECT i.* FROM investments i
                JOIN   projects p ON p.id = i.project_id
                WHERE  p.owner_id = ?1
                ORDER  BY i.created_at DESC
                "#,
            )
            .bind(owner_id)
            .fetch_all(conn)
            .await?
        }
    };
    Ok(rows)
}

/// Compare-and-swap on payment status: `PENDING → SETTLED | FAILED`.
///
/// Zero rows affected means the row was missing or already transitioned —
/// concurrent duplicate confirmations lose here, which is what makes
/// settlement exactly-once.
pub async fn cas_payment_status(
    conn: &mut SqliteConnection,
    id: i64,
    target: PaymentStatus,
) -> Result<u64> {
    let result =
        sqlx::query("UPDATE investments SET status = ?2 WHERE id = ?1 AND status = 'PENDING'")
            .bind(id)
            .bind(target.as_str())
            .execute(conn)
            .await?;
    Ok(result.rows_affected())
}

/// Attach the processor's intent handle, but only while still `PENDING`.
pub async fn store_intent(
    conn: &mut SqliteConnection,
    id: i64,
    intent_id: &str,
    client_secret: &str,
) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE investments SET intent_id = ?2, client_secret = ?3 WHERE id = ?1 AND status = 'PENDING'",
    )
    .bind(id)
    .bind(intent_id)
    .bind(client_secret)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// TEXT amounts of all settled investments for a project — the aggregator's
/// input.
pub async fn settled_amounts(conn: &mut SqliteConnection, project_id: i64) -> Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT amount FROM investments WHERE project_id = ?1 AND status = 'SETTLED'",
    )
    .bind(project_id)
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().map(|(a,)| a).collect())
}
