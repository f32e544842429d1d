//! Long-running background task that re-evaluates active projects whose
//! deadline has passed, so they converge to `Failed` without waiting for
//! request traffic to touch them.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use funding::Project;
use sqlx::SqlitePool;
use tracing::{error, info};

use crate::db;
use crate::errors::Result;
use crate::ledger;

pub struct SweeperState {
    pub pool: SqlitePool,
    pub interval_secs: u64,
}

/// Spawn the sweep loop as a background [`tokio`] task.
pub async fn run(state: Arc<SweeperState>) {
    info!(
        "Deadline sweeper starting — interval {}s",
        state.interval_secs
    );

    loop {
        match sweep_once(&state.pool).await {
            Ok(0) => {}
            Ok(n) => info!("Sweep recomputed {n} expired projects"),
            Err(e) => error!("Sweep error: {e}"),
        }

        tokio::time::sleep(Duration::from_secs(state.interval_secs)).await;
    }
}

/// Perform a single sweep iteration. Returns how many projects were
/// recomputed.
async fn sweep_once(pool: &SqlitePool) -> Result<usize> {
    let rows = {
        let mut conn = pool.acquire().await?;
        db::active_projects(&mut conn).await?
    };

    let now = Utc::now();
    let mut recomputed = 0usize;
    for row in rows {
        let project: Project = row.try_into()?;
        if project.is_expired(now) {
            // recompute applies the lifecycle rule, which turns an expired
            // under-goal project into Failed (or Funded if it is at goal).
            ledger::recompute(pool, project.id).await?;
            recomputed += 1;
        }
    }
    Ok(recomputed)
}
