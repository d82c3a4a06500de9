use chrono::{DateTime, Utc};
use sqlx::AnyPool;
use swing_core::{RunRow, SwingError};

/// Inserts one `rc_run` bookkeeping row (spec §6.3, §10.6) — written once
/// per CLI invocation, before any per-ticker evaluation begins.
pub async fn insert_run(pool: &AnyPool, run: &RunRow) -> Result<(), SwingError> {
    sqlx::query(
        "INSERT INTO rc_run (run_id, created_at, engine_version, policy_id, policy_version)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&run.run_id)
    .bind(run.created_at.to_rfc3339())
    .bind(&run.engine_version)
    .bind(&run.policy_id)
    .bind(&run.policy_version)
    .execute(pool)
    .await
    .map_err(|e| SwingError::InvariantViolation(format!("insert rc_run: {e}")))?;
    Ok(())
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct RunRowRaw {
    run_id: String,
    created_at: String,
    engine_version: String,
    policy_id: String,
    policy_version: String,
}

/// Fetches the most recently recorded run, if any.
pub async fn fetch_latest_run(pool: &AnyPool) -> Result<Option<RunRow>, SwingError> {
    let row: Option<RunRowRaw> = sqlx::query_as(
        "SELECT run_id, created_at, engine_version, policy_id, policy_version
         FROM rc_run ORDER BY created_at DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await
    .map_err(|e| SwingError::InvariantViolation(format!("fetch rc_run: {e}")))?;

    row.map(|r| {
        Ok(RunRow {
            run_id: r.run_id,
            created_at: DateTime::parse_from_rfc3339(&r.created_at)
                .map_err(|e| SwingError::InvariantViolation(format!("created_at: {e}")))?
                .with_timezone(&Utc),
            engine_version: r.engine_version,
            policy_id: r.policy_id,
            policy_version: r.policy_version,
        })
    })
    .transpose()
}
