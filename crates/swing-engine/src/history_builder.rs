use chrono::NaiveDate;
use sqlx::AnyPool;
use swing_core::{ReasonCode, SignalKey, SwingError};
use swing_policy::history::{
    HistoryContext, CHURN_LOOKBACK_DAYS, RECENT_ENTRY_SETUP_LOOKBACK_DAYS, SETUP_FRESH_DAYS,
    STAB_RECENCY_DAYS,
};

const DATE_FMT: &str = "%Y-%m-%d";

/// Assembles the recency facts the policy needs beyond `(prev_state, signals)`
/// (spec §4.3) by reading persisted `rc_transition`/`rc_signal_daily`/
/// `rc_state_daily` rows. The policy itself never queries storage — this is
/// the one place that bridges the two (spec §9 design notes).
pub async fn build_history_context(
    pool: &AnyPool,
    ticker: &str,
    as_of: NaiveDate,
) -> Result<HistoryContext, SwingError> {
    let recent_transitions =
        swing_storage::state_store::fetch_recent_transitions(pool, ticker, as_of, CHURN_LOOKBACK_DAYS as i64)
            .await?;

    let consecutive_fallback_days = count_consecutive_fallback_days(pool, ticker, as_of).await?;
    let stabilization_confirmed_within_recency =
        signal_present_within(pool, ticker, as_of, STAB_RECENCY_DAYS as i64, SignalKey::StabilizationConfirmed)
            .await?;
    let entry_setup_valid_within_freshness =
        signal_present_within(pool, ticker, as_of, SETUP_FRESH_DAYS as i64, SignalKey::EntrySetupValid).await?;
    let entry_setup_valid_within_edge_gone_lookback = signal_present_within(
        pool,
        ticker,
        as_of,
        RECENT_ENTRY_SETUP_LOOKBACK_DAYS as i64,
        SignalKey::EntrySetupValid,
    )
    .await?;

    Ok(HistoryContext {
        recent_transitions,
        consecutive_fallback_days,
        stabilization_confirmed_within_recency,
        entry_setup_valid_within_freshness,
        entry_setup_valid_within_edge_gone_lookback,
    })
}

/// Counts consecutive most-recent evaluations (ending the day before
/// `as_of`, inclusive of `as_of` when already evaluated) whose decision was
/// the bare `NO_SIGNAL` fallback stay, stopping at the first row with any
/// other reason or a state change.
async fn count_consecutive_fallback_days(
    pool: &AnyPool,
    ticker: &str,
    as_of: NaiveDate,
) -> Result<u32, SwingError> {
    // A generous cap bounds the query; SILENT_DECAY_DAYS = 15 is the largest
    // threshold this feeds, so 64 rows is more than enough headroom.
    const MAX_ROWS: i64 = 64;
    let rows = sqlx::query_as::<_, FallbackRow>(
        "SELECT date, state, prev_state, reasons_json FROM rc_state_daily
         WHERE ticker = ? AND date < ?
         ORDER BY date DESC LIMIT ?",
    )
    .bind(ticker)
    .bind(as_of.format(DATE_FMT).to_string())
    .bind(MAX_ROWS)
    .fetch_all(pool)
    .await
    .map_err(|e| SwingError::InvariantViolation(format!("fallback history query: {e}")))?;

    let mut count = 0u32;
    for row in rows {
        let reasons: Vec<String> = serde_json::from_str(&row.reasons_json)
            .map_err(|e| SwingError::InvariantViolation(format!("reasons_json: {e}")))?;
        let is_bare_fallback = reasons == [ReasonCode::NoSignal.code().to_string()]
            && row.prev_state.as_deref() == Some(row.state.as_str());
        if !is_bare_fallback {
            break;
        }
        count += 1;
    }
    Ok(count)
}

#[derive(sqlx::FromRow)]
struct FallbackRow {
    #[allow(dead_code)]
    date: String,
    state: String,
    prev_state: Option<String>,
    reasons_json: String,
}

async fn signal_present_within(
    pool: &AnyPool,
    ticker: &str,
    as_of: NaiveDate,
    lookback_days: i64,
    key: SignalKey,
) -> Result<bool, SwingError> {
    let floor = as_of - chrono::Duration::days(lookback_days);
    let rows = sqlx::query_as::<_, (String,)>(
        "SELECT signal_keys_json FROM rc_signal_daily
         WHERE ticker = ? AND date > ? AND date <= ?",
    )
    .bind(ticker)
    .bind(floor.format(DATE_FMT).to_string())
    .bind(as_of.format(DATE_FMT).to_string())
    .fetch_all(pool)
    .await
    .map_err(|e| SwingError::InvariantViolation(format!("signal history query: {e}")))?;

    for (keys_json,) in rows {
        let keys: Vec<String> = serde_json::from_str(&keys_json)
            .map_err(|e| SwingError::InvariantViolation(format!("signal_keys_json: {e}")))?;
        if keys.iter().any(|k| k == key.as_str()) {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use swing_core::{SignalDailyRow, State, StateDailyRow};

    async fn memory_pool() -> AnyPool {
        sqlx::any::install_default_drivers();
        let pool = sqlx::any::AnyPoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        swing_storage::ensure_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn finds_stabilization_confirmed_in_recent_signal_history() {
        let pool = memory_pool().await;
        let d1 = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 4, 5).unwrap();

        swing_storage::state_store::upsert_signal_daily(
            &pool,
            &SignalDailyRow {
                ticker: "ACME".to_string(),
                date: d1,
                signal_keys: vec![SignalKey::StabilizationConfirmed],
                run_id: "run-1".to_string(),
            },
        )
        .await
        .unwrap();

        let hist = build_history_context(&pool, "ACME", d2).await.unwrap();
        assert!(hist.stabilization_confirmed_within_recency);
    }

    #[tokio::test]
    async fn fallback_streak_breaks_on_a_real_transition() {
        let pool = memory_pool().await;
        let d1 = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
        let d3 = NaiveDate::from_ymd_opt(2024, 4, 3).unwrap();

        swing_storage::state_store::upsert_state_daily(
            &pool,
            &StateDailyRow {
                ticker: "ACME".to_string(),
                date: d1,
                state: State::DowntrendEarly,
                prev_state: Some(State::NoTrade),
                reasons: vec![ReasonCode::TrendStarted],
                age: 1,
                state_attrs_json: None,
                run_id: "run-1".to_string(),
            },
        )
        .await
        .unwrap();
        swing_storage::state_store::upsert_state_daily(
            &pool,
            &StateDailyRow {
                ticker: "ACME".to_string(),
                date: d2,
                state: State::DowntrendEarly,
                prev_state: Some(State::DowntrendEarly),
                reasons: vec![ReasonCode::NoSignal],
                age: 2,
                state_attrs_json: None,
                run_id: "run-1".to_string(),
            },
        )
        .await
        .unwrap();

        let count = count_consecutive_fallback_days(&pool, "ACME", d3).await.unwrap();
        assert_eq!(count, 1);
    }
}
