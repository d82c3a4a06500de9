use chrono::{NaiveDate, Utc};
use sqlx::AnyPool;
use swing_core::SwingError;
use swing_scoring::{FastpassResult, RollingResult};

const DATE_FMT: &str = "%Y-%m-%d";

/// Ensures a bare `(ticker, date)` row exists (with `created_at` set) before
/// a mode-specific writer runs its column-scoped UPDATE. Only the initial
/// INSERT sets `created_at` — re-running never touches it (spec §3, §4.5).
async fn ensure_row(pool: &AnyPool, ticker: &str, date: NaiveDate) -> Result<(), SwingError> {
    sqlx::query(
        "INSERT INTO rc_ew_score_daily (ticker, date, created_at)
         VALUES (?, ?, ?)
         ON CONFLICT(ticker, date) DO NOTHING",
    )
    .bind(ticker)
    .bind(date.format(DATE_FMT).to_string())
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await
    .map_err(|e| SwingError::InvariantViolation(format!("ensure rc_ew_score_daily row: {e}")))?;
    Ok(())
}

/// Writes a fastpass result, touching only the fastpass column group
/// (spec §3, §4.5 write discipline). Never modifies `created_at`, legacy,
/// or rolling columns.
pub async fn write_fastpass(
    pool: &AnyPool,
    ticker: &str,
    date: NaiveDate,
    result: &FastpassResult,
) -> Result<(), SwingError> {
    ensure_row(pool, ticker, date).await?;
    sqlx::query(
        "UPDATE rc_ew_score_daily SET
            score_fastpass = ?, level_fastpass = ?, rule_fastpass = ?, inputs_json_fastpass = ?
         WHERE ticker = ? AND date = ?",
    )
    .bind(result.score)
    .bind(result.level as i64)
    .bind(result.rule_id)
    .bind(result.inputs_json.to_string())
    .bind(ticker)
    .bind(date.format(DATE_FMT).to_string())
    .execute(pool)
    .await
    .map_err(|e| SwingError::InvariantViolation(format!("write fastpass columns: {e}")))?;
    Ok(())
}

/// Writes a rolling result, touching only the rolling column group.
pub async fn write_rolling(
    pool: &AnyPool,
    ticker: &str,
    date: NaiveDate,
    result: &RollingResult,
) -> Result<(), SwingError> {
    ensure_row(pool, ticker, date).await?;
    sqlx::query(
        "UPDATE rc_ew_score_daily SET
            score_rolling = ?, level_rolling = ?, rule_rolling = ?, inputs_json_rolling = ?
         WHERE ticker = ? AND date = ?",
    )
    .bind(result.score)
    .bind(result.level as i64)
    .bind(result.rule_id)
    .bind(result.inputs_json.to_string())
    .bind(ticker)
    .bind(date.format(DATE_FMT).to_string())
    .execute(pool)
    .await
    .map_err(|e| SwingError::InvariantViolation(format!("write rolling columns: {e}")))?;
    Ok(())
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct EwRow {
    score_fastpass: Option<f64>,
    score_rolling: Option<f64>,
    score_day3: Option<f64>,
}

/// Reads back the raw score columns for one `(ticker, date)` — used by
/// isolation tests and the CLI report writer.
pub async fn fetch_scores(
    pool: &AnyPool,
    ticker: &str,
    date: NaiveDate,
) -> Result<Option<(Option<f64>, Option<f64>, Option<f64>)>, SwingError> {
    let row: Option<EwRow> = sqlx::query_as(
        "SELECT score_fastpass, score_rolling, score_day3 FROM rc_ew_score_daily
         WHERE ticker = ? AND date = ?",
    )
    .bind(ticker)
    .bind(date.format(DATE_FMT).to_string())
    .fetch_optional(pool)
    .await
    .map_err(|e| SwingError::InvariantViolation(format!("fetch_scores: {e}")))?;

    Ok(row.map(|r| (r.score_fastpass, r.score_rolling, r.score_day3)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use swing_scoring::{compute_fastpass, compute_rolling, Market};

    async fn memory_pool() -> AnyPool {
        sqlx::any::install_default_drivers();
        let pool = sqlx::any::AnyPoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::schema::ensure_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn fastpass_write_does_not_touch_rolling_columns() {
        let pool = memory_pool().await;
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let roll = compute_rolling(Market::Omxh, date, date, 100.0, 102.0, 5).unwrap();
        write_rolling(&pool, "ACME", date, &roll).await.unwrap();

        let fp = compute_fastpass(Market::Omxh, date, date, 100.0, 98.0, &BTreeMap::new(), 5);
        write_fastpass(&pool, "ACME", date, &fp).await.unwrap();

        let (fastpass, rolling, _legacy) = fetch_scores(&pool, "ACME", date).await.unwrap().unwrap();
        assert_eq!(fastpass, Some(fp.score));
        assert_eq!(rolling, Some(roll.score));
    }

    #[tokio::test]
    async fn rolling_write_leaves_fastpass_untouched() {
        let pool = memory_pool().await;
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let fp = compute_fastpass(Market::Omxs, date, date, 100.0, 98.0, &BTreeMap::new(), 5);
        write_fastpass(&pool, "ACME", date, &fp).await.unwrap();

        let roll1 = compute_rolling(Market::Omxs, date, date, 100.0, 101.0, 5).unwrap();
        write_rolling(&pool, "ACME", date, &roll1).await.unwrap();
        let roll2 = compute_rolling(Market::Omxs, date, date, 100.0, 105.0, 5).unwrap();
        write_rolling(&pool, "ACME", date, &roll2).await.unwrap();

        let (fastpass, rolling, _) = fetch_scores(&pool, "ACME", date).await.unwrap().unwrap();
        assert_eq!(fastpass, Some(fp.score));
        assert_eq!(rolling, Some(roll2.score));
    }
}
