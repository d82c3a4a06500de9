use sqlx::AnyPool;
use sqlx::Row;
use swing_core::SwingError;
use tracing::{debug, info};

/// Creates the five persisted tables from spec §6.3 if absent, then runs the
/// dual-mode column migration on `rc_ew_score_daily`. Safe to call once per
/// connection, before any row operation (spec §5 — "runs before any row
/// operations").
pub async fn ensure_schema(pool: &AnyPool) -> Result<(), SwingError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS rc_run (
            run_id TEXT PRIMARY KEY,
            created_at TEXT NOT NULL,
            engine_version TEXT NOT NULL,
            policy_id TEXT NOT NULL,
            policy_version TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| SwingError::SchemaMissing(format!("rc_run: {e}")))?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS rc_state_daily (
            ticker TEXT NOT NULL,
            date TEXT NOT NULL,
            state TEXT NOT NULL,
            prev_state TEXT,
            reasons_json TEXT NOT NULL,
            confidence REAL,
            age INTEGER NOT NULL,
            state_attrs_json TEXT,
            run_id TEXT NOT NULL,
            PRIMARY KEY (ticker, date)
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| SwingError::SchemaMissing(format!("rc_state_daily: {e}")))?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS rc_transition (
            ticker TEXT NOT NULL,
            date TEXT NOT NULL,
            from_state TEXT NOT NULL,
            to_state TEXT NOT NULL,
            reasons_json TEXT NOT NULL,
            state_attrs_json TEXT,
            run_id TEXT NOT NULL,
            PRIMARY KEY (ticker, date)
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| SwingError::SchemaMissing(format!("rc_transition: {e}")))?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS rc_signal_daily (
            ticker TEXT NOT NULL,
            date TEXT NOT NULL,
            signal_keys_json TEXT NOT NULL,
            run_id TEXT NOT NULL,
            PRIMARY KEY (ticker, date)
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| SwingError::SchemaMissing(format!("rc_signal_daily: {e}")))?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS rc_ew_score_daily (
            ticker TEXT NOT NULL,
            date TEXT NOT NULL,
            score_day3 REAL,
            level_day3 INTEGER,
            rule TEXT,
            inputs_json TEXT,
            created_at TEXT NOT NULL,
            PRIMARY KEY (ticker, date)
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| SwingError::SchemaMissing(format!("rc_ew_score_daily: {e}")))?;

    ensure_ew_score_dual_mode_columns(pool).await?;
    info!("schema ensured");
    Ok(())
}

/// Adds the fastpass/rolling column groups to `rc_ew_score_daily` if they
/// are not already present (spec §4.5, §6.5). Non-destructive: existing
/// columns and data are never touched. Fails with `SchemaMissing` if the
/// base table does not exist yet — callers must run [`ensure_schema`]'s
/// base-table creation (or an equivalent prior migration) first.
pub async fn ensure_ew_score_dual_mode_columns(pool: &AnyPool) -> Result<(), SwingError> {
    let existing = table_columns(pool, "rc_ew_score_daily").await?;
    if existing.is_empty() {
        return Err(SwingError::SchemaMissing(
            "rc_ew_score_daily base table is absent".to_string(),
        ));
    }

    let dual_mode_columns: &[(&str, &str)] = &[
        ("score_fastpass", "REAL"),
        ("level_fastpass", "INTEGER"),
        ("rule_fastpass", "TEXT"),
        ("inputs_json_fastpass", "TEXT"),
        ("score_rolling", "REAL"),
        ("level_rolling", "INTEGER"),
        ("rule_rolling", "TEXT"),
        ("inputs_json_rolling", "TEXT"),
    ];

    for (name, sql_type) in dual_mode_columns {
        if !existing.contains(&name.to_string()) {
            debug!(column = name, "adding missing dual-mode column");
            let stmt = format!("ALTER TABLE rc_ew_score_daily ADD COLUMN {name} {sql_type}");
            sqlx::query(&stmt)
                .execute(pool)
                .await
                .map_err(|e| SwingError::SchemaMissing(format!("{name}: {e}")))?;
        }
    }
    Ok(())
}

async fn table_columns(pool: &AnyPool, table: &str) -> Result<Vec<String>, SwingError> {
    let rows = sqlx::query(&format!("PRAGMA table_info({table})"))
        .fetch_all(pool)
        .await
        .map_err(|e| SwingError::SchemaMissing(format!("reading {table} schema: {e}")))?;
    Ok(rows
        .iter()
        .filter_map(|row| row.try_get::<String, _>("name").ok())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_pool() -> AnyPool {
        sqlx::any::install_default_drivers();
        sqlx::any::AnyPoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite")
    }

    #[tokio::test]
    async fn ensure_schema_is_idempotent() {
        let pool = memory_pool().await;
        ensure_schema(&pool).await.unwrap();
        ensure_schema(&pool).await.unwrap();
        let cols = table_columns(&pool, "rc_ew_score_daily").await.unwrap();
        assert!(cols.contains(&"score_fastpass".to_string()));
        assert!(cols.contains(&"score_rolling".to_string()));
    }

    #[tokio::test]
    async fn dual_mode_migration_rejects_missing_base_table() {
        let pool = memory_pool().await;
        let err = ensure_ew_score_dual_mode_columns(&pool).await.unwrap_err();
        assert!(matches!(err, SwingError::SchemaMissing(_)));
    }
}
