use std::str::FromStr;

use chrono::NaiveDate;
use sqlx::{AnyPool, Row};
use swing_core::{
    ReasonCode, SignalDailyRow, SignalKey, State, StateAttrs, StateDailyRow, SwingError,
    TransitionRow,
};

const DATE_FMT: &str = "%Y-%m-%d";

fn reasons_to_json(reasons: &[ReasonCode]) -> String {
    serde_json::to_string(&reasons.iter().map(|r| r.code()).collect::<Vec<_>>())
        .expect("reason codes serialize")
}

fn reasons_from_json(raw: &str) -> Result<Vec<ReasonCode>, SwingError> {
    let codes: Vec<String> = serde_json::from_str(raw)
        .map_err(|e| SwingError::InvariantViolation(format!("reasons_json: {e}")))?;
    codes.iter().map(|c| ReasonCode::from_str(c)).collect()
}

/// Upserts one `rc_state_daily` row (spec §3, §6.3). `StateDaily` rows are
/// created on each evaluation and never mutated afterward, but the conflict
/// target still exists to make re-running an already-evaluated date
/// idempotent rather than erroring (spec §8 round-trip property).
pub async fn upsert_state_daily(pool: &AnyPool, row: &StateDailyRow) -> Result<(), SwingError> {
    let reasons = reasons_to_json(&row.reasons);
    let attrs = row.state_attrs_json.as_ref().map(|v| v.to_string());
    sqlx::query(
        "INSERT INTO rc_state_daily
            (ticker, date, state, prev_state, reasons_json, confidence, age, state_attrs_json, run_id)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(ticker, date) DO UPDATE SET
            state = excluded.state,
            prev_state = excluded.prev_state,
            reasons_json = excluded.reasons_json,
            confidence = excluded.confidence,
            age = excluded.age,
            state_attrs_json = excluded.state_attrs_json,
            run_id = excluded.run_id",
    )
    .bind(&row.ticker)
    .bind(row.date.format(DATE_FMT).to_string())
    .bind(row.state.as_str())
    .bind(row.prev_state.map(|s| s.as_str()))
    .bind(reasons)
    .bind(Option::<f64>::None)
    .bind(row.age as i64)
    .bind(attrs)
    .bind(&row.run_id)
    .execute(pool)
    .await
    .map_err(|e| SwingError::InvariantViolation(format!("upsert rc_state_daily: {e}")))?;
    Ok(())
}

/// Inserts one `rc_transition` row — only called when `from_state != to_state`
/// (spec §3).
pub async fn insert_transition(pool: &AnyPool, row: &TransitionRow) -> Result<(), SwingError> {
    let reasons = reasons_to_json(&row.reasons);
    let attrs = row.state_attrs_json.as_ref().map(|v| v.to_string());
    sqlx::query(
        "INSERT INTO rc_transition (ticker, date, from_state, to_state, reasons_json, state_attrs_json, run_id)
         VALUES (?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(ticker, date) DO UPDATE SET
            from_state = excluded.from_state,
            to_state = excluded.to_state,
            reasons_json = excluded.reasons_json,
            state_attrs_json = excluded.state_attrs_json,
            run_id = excluded.run_id",
    )
    .bind(&row.ticker)
    .bind(row.date.format(DATE_FMT).to_string())
    .bind(row.from_state.as_str())
    .bind(row.to_state.as_str())
    .bind(reasons)
    .bind(attrs)
    .bind(&row.run_id)
    .execute(pool)
    .await
    .map_err(|e| SwingError::InvariantViolation(format!("insert rc_transition: {e}")))?;
    Ok(())
}

/// Overwrites just the `state_attrs_json` column on an existing
/// `rc_transition` row — used to mirror `entry_continuation_confirmed` onto
/// the transition that opened the entry window, once it becomes decidable
/// (spec §4.4).
pub async fn update_transition_attrs(
    pool: &AnyPool,
    ticker: &str,
    date: NaiveDate,
    attrs: &StateAttrs,
) -> Result<(), SwingError> {
    sqlx::query("UPDATE rc_transition SET state_attrs_json = ? WHERE ticker = ? AND date = ?")
        .bind(attrs.to_json().map(|v| v.to_string()))
        .bind(ticker)
        .bind(date.format(DATE_FMT).to_string())
        .execute(pool)
        .await
        .map_err(|e| SwingError::InvariantViolation(format!("update rc_transition attrs: {e}")))?;
    Ok(())
}

/// Fetches the `rc_transition` row for `(ticker, date)`, if one was
/// recorded (spec §3 — only recorded when `from_state != to_state`).
pub async fn fetch_transition(
    pool: &AnyPool,
    ticker: &str,
    date: NaiveDate,
) -> Result<Option<TransitionRow>, SwingError> {
    let row = sqlx::query(
        "SELECT ticker, date, from_state, to_state, reasons_json, state_attrs_json, run_id
         FROM rc_transition WHERE ticker = ? AND date = ?",
    )
    .bind(ticker)
    .bind(date.format(DATE_FMT).to_string())
    .fetch_optional(pool)
    .await
    .map_err(|e| SwingError::InvariantViolation(format!("fetch rc_transition: {e}")))?;

    let Some(row) = row else { return Ok(None) };
    let ticker: String = row
        .try_get("ticker")
        .map_err(|e| SwingError::InvariantViolation(e.to_string()))?;
    let date_str: String = row
        .try_get("date")
        .map_err(|e| SwingError::InvariantViolation(e.to_string()))?;
    let date = NaiveDate::parse_from_str(&date_str, DATE_FMT)
        .map_err(|e| SwingError::InvariantViolation(format!("date: {e}")))?;
    let from_state: String = row
        .try_get("from_state")
        .map_err(|e| SwingError::InvariantViolation(e.to_string()))?;
    let to_state: String = row
        .try_get("to_state")
        .map_err(|e| SwingError::InvariantViolation(e.to_string()))?;
    let reasons_json: String = row
        .try_get("reasons_json")
        .map_err(|e| SwingError::InvariantViolation(e.to_string()))?;
    let attrs_json: Option<String> = row
        .try_get("state_attrs_json")
        .map_err(|e| SwingError::InvariantViolation(e.to_string()))?;
    let run_id: String = row
        .try_get("run_id")
        .map_err(|e| SwingError::InvariantViolation(e.to_string()))?;

    Ok(Some(TransitionRow {
        ticker,
        date,
        from_state: State::from_str(&from_state)?,
        to_state: State::from_str(&to_state)?,
        reasons: reasons_from_json(&reasons_json)?,
        state_attrs_json: attrs_json
            .map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(|e| SwingError::InvariantViolation(format!("state_attrs_json: {e}")))?,
        run_id,
    }))
}

/// Fetches the most recent `rc_transition` row with `to_state = ENTRY_WINDOW`
/// at or before `as_of` — the entry-window's opening date, used to compute
/// `entry_continuation_confirmed` (spec §4.4).
pub async fn fetch_latest_entry_window_open(
    pool: &AnyPool,
    ticker: &str,
    as_of: NaiveDate,
) -> Result<Option<NaiveDate>, SwingError> {
    let row = sqlx::query(
        "SELECT date FROM rc_transition
         WHERE ticker = ? AND to_state = 'ENTRY_WINDOW' AND date <= ?
         ORDER BY date DESC LIMIT 1",
    )
    .bind(ticker)
    .bind(as_of.format(DATE_FMT).to_string())
    .fetch_optional(pool)
    .await
    .map_err(|e| SwingError::InvariantViolation(format!("fetch entry window open: {e}")))?;

    row.map(|r| {
        let date_str: String = r
            .try_get("date")
            .map_err(|e| SwingError::InvariantViolation(e.to_string()))?;
        NaiveDate::parse_from_str(&date_str, DATE_FMT)
            .map_err(|e| SwingError::InvariantViolation(format!("date: {e}")))
    })
    .transpose()
}

/// Fetches the most recent date at or before `as_of` on which `key` was
/// present in the persisted `rc_signal_daily` set — used to locate the
/// `last_stab_date` input to fastpass scoring (spec §4.5).
pub async fn fetch_latest_signal_date(
    pool: &AnyPool,
    ticker: &str,
    as_of: NaiveDate,
    key: SignalKey,
) -> Result<Option<NaiveDate>, SwingError> {
    let rows = sqlx::query(
        "SELECT date, signal_keys_json FROM rc_signal_daily
         WHERE ticker = ? AND date <= ?
         ORDER BY date DESC",
    )
    .bind(ticker)
    .bind(as_of.format(DATE_FMT).to_string())
    .fetch_all(pool)
    .await
    .map_err(|e| SwingError::InvariantViolation(format!("fetch signal history: {e}")))?;

    for row in rows {
        let keys_json: String = row
            .try_get("signal_keys_json")
            .map_err(|e| SwingError::InvariantViolation(e.to_string()))?;
        let keys: Vec<String> = serde_json::from_str(&keys_json)
            .map_err(|e| SwingError::InvariantViolation(format!("signal_keys_json: {e}")))?;
        if keys.iter().any(|k| k == key.as_str()) {
            let date_str: String = row
                .try_get("date")
                .map_err(|e| SwingError::InvariantViolation(e.to_string()))?;
            return NaiveDate::parse_from_str(&date_str, DATE_FMT)
                .map(Some)
                .map_err(|e| SwingError::InvariantViolation(format!("date: {e}")));
        }
    }
    Ok(None)
}

/// Upserts one `rc_signal_daily` row.
pub async fn upsert_signal_daily(pool: &AnyPool, row: &SignalDailyRow) -> Result<(), SwingError> {
    let keys: Vec<&str> = row.signal_keys.iter().map(|k| k.as_str()).collect();
    let keys_json = serde_json::to_string(&keys)
        .map_err(|e| SwingError::InvariantViolation(format!("signal_keys_json: {e}")))?;
    sqlx::query(
        "INSERT INTO rc_signal_daily (ticker, date, signal_keys_json, run_id)
         VALUES (?, ?, ?, ?)
         ON CONFLICT(ticker, date) DO UPDATE SET
            signal_keys_json = excluded.signal_keys_json,
            run_id = excluded.run_id",
    )
    .bind(&row.ticker)
    .bind(row.date.format(DATE_FMT).to_string())
    .bind(keys_json)
    .bind(&row.run_id)
    .execute(pool)
    .await
    .map_err(|e| SwingError::InvariantViolation(format!("upsert rc_signal_daily: {e}")))?;
    Ok(())
}

/// Fetches the persisted `StateDaily` row for `(ticker, date)`, the input an
/// evaluator needs to derive `prev_state`/`age` for the next day (spec §5 —
/// evaluations for one ticker serialize by ascending date).
pub async fn fetch_state_daily(
    pool: &AnyPool,
    ticker: &str,
    date: NaiveDate,
) -> Result<Option<StateDailyRow>, SwingError> {
    let row = sqlx::query(
        "SELECT ticker, date, state, prev_state, reasons_json, age, state_attrs_json, run_id
         FROM rc_state_daily WHERE ticker = ? AND date = ?",
    )
    .bind(ticker)
    .bind(date.format(DATE_FMT).to_string())
    .fetch_optional(pool)
    .await
    .map_err(|e| SwingError::InvariantViolation(format!("fetch rc_state_daily: {e}")))?;

    let Some(row) = row else { return Ok(None) };
    row_to_state_daily(&row).map(Some)
}

/// Fetches the most recent `StateDaily` row strictly before `date`, used to
/// seed `prev_state`/`age`/`prev_attrs` for the next evaluation.
pub async fn fetch_latest_before(
    pool: &AnyPool,
    ticker: &str,
    date: NaiveDate,
) -> Result<Option<StateDailyRow>, SwingError> {
    let row = sqlx::query(
        "SELECT ticker, date, state, prev_state, reasons_json, age, state_attrs_json, run_id
         FROM rc_state_daily WHERE ticker = ? AND date < ?
         ORDER BY date DESC LIMIT 1",
    )
    .bind(ticker)
    .bind(date.format(DATE_FMT).to_string())
    .fetch_optional(pool)
    .await
    .map_err(|e| SwingError::InvariantViolation(format!("fetch latest rc_state_daily: {e}")))?;

    let Some(row) = row else { return Ok(None) };
    row_to_state_daily(&row).map(Some)
}

/// Fetches `(from_state, to_state)` pairs for the last `lookback_days` of
/// persisted transitions, newest first — feeds `HistoryContext::recent_transitions`.
pub async fn fetch_recent_transitions(
    pool: &AnyPool,
    ticker: &str,
    date: NaiveDate,
    lookback_days: i64,
) -> Result<Vec<(State, State)>, SwingError> {
    let floor = date - chrono::Duration::days(lookback_days);
    let rows = sqlx::query(
        "SELECT from_state, to_state FROM rc_transition
         WHERE ticker = ? AND date > ? AND date <= ?
         ORDER BY date DESC",
    )
    .bind(ticker)
    .bind(floor.format(DATE_FMT).to_string())
    .bind(date.format(DATE_FMT).to_string())
    .fetch_all(pool)
    .await
    .map_err(|e| SwingError::InvariantViolation(format!("fetch rc_transition history: {e}")))?;

    rows.iter()
        .map(|r| {
            let from: String = r
                .try_get("from_state")
                .map_err(|e| SwingError::InvariantViolation(e.to_string()))?;
            let to: String = r
                .try_get("to_state")
                .map_err(|e| SwingError::InvariantViolation(e.to_string()))?;
            Ok((State::from_str(&from)?, State::from_str(&to)?))
        })
        .collect()
}

/// Fetches the most recent `StateDaily` rows at or before `date`, newest
/// first — feeds the CLI's plain-text per-ticker report (spec §10.6).
pub async fn fetch_recent_state_daily(
    pool: &AnyPool,
    ticker: &str,
    date: NaiveDate,
    limit: i64,
) -> Result<Vec<StateDailyRow>, SwingError> {
    let rows = sqlx::query(
        "SELECT ticker, date, state, prev_state, reasons_json, age, state_attrs_json, run_id
         FROM rc_state_daily WHERE ticker = ? AND date <= ?
         ORDER BY date DESC LIMIT ?",
    )
    .bind(ticker)
    .bind(date.format(DATE_FMT).to_string())
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(|e| SwingError::InvariantViolation(format!("fetch recent rc_state_daily: {e}")))?;

    rows.iter().map(row_to_state_daily).collect()
}

fn row_to_state_daily(row: &sqlx::any::AnyRow) -> Result<StateDailyRow, SwingError> {
    let ticker: String = row
        .try_get("ticker")
        .map_err(|e| SwingError::InvariantViolation(e.to_string()))?;
    let date_str: String = row
        .try_get("date")
        .map_err(|e| SwingError::InvariantViolation(e.to_string()))?;
    let date = NaiveDate::parse_from_str(&date_str, DATE_FMT)
        .map_err(|e| SwingError::InvariantViolation(format!("date: {e}")))?;
    let state_str: String = row
        .try_get("state")
        .map_err(|e| SwingError::InvariantViolation(e.to_string()))?;
    let prev_state_str: Option<String> = row
        .try_get("prev_state")
        .map_err(|e| SwingError::InvariantViolation(e.to_string()))?;
    let reasons_json: String = row
        .try_get("reasons_json")
        .map_err(|e| SwingError::InvariantViolation(e.to_string()))?;
    let age: i64 = row
        .try_get("age")
        .map_err(|e| SwingError::InvariantViolation(e.to_string()))?;
    let attrs_json: Option<String> = row
        .try_get("state_attrs_json")
        .map_err(|e| SwingError::InvariantViolation(e.to_string()))?;
    let run_id: String = row
        .try_get("run_id")
        .map_err(|e| SwingError::InvariantViolation(e.to_string()))?;

    Ok(StateDailyRow {
        ticker,
        date,
        state: State::from_str(&state_str)?,
        prev_state: prev_state_str.map(|s| State::from_str(&s)).transpose()?,
        reasons: reasons_from_json(&reasons_json)?,
        age: age as u32,
        state_attrs_json: attrs_json
            .map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(|e| SwingError::InvariantViolation(format!("state_attrs_json: {e}")))?,
        run_id,
    })
}

/// Deserializes a `StateDailyRow`'s attrs JSON back into a [`StateAttrs`],
/// defaulting to empty when the row has no attrs (spec §3 — empty mapping
/// serializes as `null`).
pub fn attrs_from_row(row: &StateDailyRow) -> Result<StateAttrs, SwingError> {
    match &row.state_attrs_json {
        None => Ok(StateAttrs::default()),
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|e| SwingError::InvariantViolation(format!("state_attrs_json: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swing_core::ReasonCode;

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

    fn sample_row(date: NaiveDate, age: u32) -> StateDailyRow {
        StateDailyRow {
            ticker: "ACME".to_string(),
            date,
            state: State::DowntrendEarly,
            prev_state: Some(State::NoTrade),
            reasons: vec![ReasonCode::TrendStarted],
            age,
            state_attrs_json: None,
            run_id: "run-1".to_string(),
        }
    }

    #[tokio::test]
    async fn upsert_then_fetch_round_trips() {
        let pool = memory_pool().await;
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let row = sample_row(date, 1);
        upsert_state_daily(&pool, &row).await.unwrap();

        let fetched = fetch_state_daily(&pool, "ACME", date).await.unwrap().unwrap();
        assert_eq!(fetched.state, State::DowntrendEarly);
        assert_eq!(fetched.age, 1);
        assert_eq!(fetched.reasons, vec![ReasonCode::TrendStarted]);
    }

    #[tokio::test]
    async fn rerunning_same_date_is_idempotent() {
        let pool = memory_pool().await;
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let row = sample_row(date, 1);
        upsert_state_daily(&pool, &row).await.unwrap();
        upsert_state_daily(&pool, &row).await.unwrap();

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM rc_state_daily")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 1);
    }

    #[tokio::test]
    async fn fetch_latest_before_finds_the_prior_day() {
        let pool = memory_pool().await;
        let d1 = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        upsert_state_daily(&pool, &sample_row(d1, 1)).await.unwrap();

        let prior = fetch_latest_before(&pool, "ACME", d2).await.unwrap().unwrap();
        assert_eq!(prior.date, d1);
        assert!(fetch_latest_before(&pool, "ACME", d1).await.unwrap().is_none());
    }
}
