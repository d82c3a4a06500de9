use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use sqlx::AnyPool;
use swing_core::{
    EntryGate, OhlcSource, SignalDailyRow, SignalKey, State, StateAttrs, StateDailyRow, SwingError,
    TransitionRow,
};
use swing_policy::{decide, EvaluationContext};
use swing_scoring::Market;
use swing_signals::SignalProvider;

use crate::history_builder::build_history_context;

/// Per-ticker EW-scoring routing and provider configuration, assembled by
/// the caller (CLI) — the engine itself never decides which market a
/// ticker belongs to (spec §4.5 names the router, not the ticker→market
/// mapping, which is an operational concern).
#[derive(Debug, Clone, Default)]
pub struct ScoringConfig {
    pub markets: BTreeMap<String, Market>,
    pub default_market: Option<Market>,
}

impl ScoringConfig {
    pub fn market_for(&self, ticker: &str) -> Option<Market> {
        self.markets.get(ticker).copied().or(self.default_market)
    }
}

/// Ties signals → policy → state-attrs → storage together for one
/// `(ticker, date)` at a time, in the orchestration style of
/// `analysis-orchestrator`'s `AnalysisOrchestrator::analyze`.
pub struct Evaluator {
    pool: AnyPool,
    ohlc: Arc<dyn OhlcSource>,
    signals: SignalProvider,
    scoring: ScoringConfig,
    run_id: String,
}

impl Evaluator {
    pub fn new(
        pool: AnyPool,
        ohlc: Arc<dyn OhlcSource>,
        signals: SignalProvider,
        scoring: ScoringConfig,
        run_id: String,
    ) -> Self {
        Self {
            pool,
            ohlc,
            signals,
            scoring,
            run_id,
        }
    }

    /// Evaluates one `(ticker, as_of)` and persists the resulting rows.
    /// Returns the persisted `StateDaily` row.
    pub async fn evaluate_one(&self, ticker: &str, as_of: NaiveDate) -> Result<StateDailyRow, SwingError> {
        let bars = self.ohlc.load(ticker, as_of).await?;
        let signal_set = self.signals.evaluate(&bars, as_of);

        let prev_row = swing_storage::state_store::fetch_latest_before(&self.pool, ticker, as_of).await?;
        let (prev_state, prev_age, prev_attrs) = match &prev_row {
            Some(row) => (
                row.state,
                row.age,
                swing_storage::state_store::attrs_from_row(row)?,
            ),
            None => (State::NoTrade, 0, StateAttrs::default()),
        };

        let history = build_history_context(&self.pool, ticker, as_of).await?;
        let ctx = EvaluationContext {
            prev_state,
            age: prev_age,
            signals: &signal_set,
            prev_attrs: &prev_attrs,
            history,
        };
        let mut decision = decide(&ctx);

        self.maybe_fill_entry_continuation(ticker, as_of, &bars, &mut decision)
            .await?;

        let new_age = if decision.next_state == prev_state {
            prev_age + 1
        } else {
            1
        };

        let state_attrs_json = decision.attrs.to_json();
        let state_row = StateDailyRow {
            ticker: ticker.to_string(),
            date: as_of,
            state: decision.next_state,
            prev_state: Some(prev_state),
            reasons: decision.reasons.clone(),
            age: new_age,
            state_attrs_json: state_attrs_json.clone(),
            run_id: self.run_id.clone(),
        };
        swing_storage::state_store::upsert_state_daily(&self.pool, &state_row).await?;

        if decision.next_state != prev_state {
            let transition_row = TransitionRow {
                ticker: ticker.to_string(),
                date: as_of,
                from_state: prev_state,
                to_state: decision.next_state,
                reasons: decision.reasons.clone(),
                state_attrs_json,
                run_id: self.run_id.clone(),
            };
            swing_storage::state_store::insert_transition(&self.pool, &transition_row).await?;
        }

        let signal_row = SignalDailyRow {
            ticker: ticker.to_string(),
            date: as_of,
            signal_keys: signal_set.iter().copied().collect(),
            run_id: self.run_id.clone(),
        };
        swing_storage::state_store::upsert_signal_daily(&self.pool, &signal_row).await?;

        self.maybe_score_entry_window(ticker, as_of, &bars, prev_state, &decision, &signal_set)
            .await?;

        Ok(state_row)
    }

    /// Evaluates an ascending date range for one ticker, serializing by
    /// date as spec §5 requires. Grounded in `backtest-engine/src/engine.rs`'s
    /// per-date walk loop.
    pub async fn evaluate_range(
        &self,
        ticker: &str,
        dates: &[NaiveDate],
    ) -> Result<Vec<StateDailyRow>, SwingError> {
        let mut out = Vec::with_capacity(dates.len());
        for &date in dates {
            out.push(self.evaluate_one(ticker, date).await?);
        }
        Ok(out)
    }

    /// Fills `entry_continuation_confirmed` on the decision row once the
    /// forward 5-day window from the entry-window's opening is fully known,
    /// and mirrors it onto the originating transition row for audit (spec
    /// §4.4). Write-once: a row that already carries the flag is left alone.
    async fn maybe_fill_entry_continuation(
        &self,
        ticker: &str,
        as_of: NaiveDate,
        bars: &[swing_core::OhlcBar],
        decision: &mut swing_policy::Decision,
    ) -> Result<(), SwingError> {
        if decision.attrs.entry_continuation_confirmed.is_some() {
            return Ok(());
        }

        let Some(entry_open) =
            swing_storage::state_store::fetch_latest_entry_window_open(&self.pool, ticker, as_of).await?
        else {
            return Ok(());
        };

        let Some(entry_idx) = bars.iter().position(|b| b.date == entry_open) else {
            return Ok(());
        };
        let Some(as_of_idx) = bars.iter().rposition(|b| b.date == as_of) else {
            return Ok(());
        };
        if entry_idx + 5 != as_of_idx {
            return Ok(());
        }

        let series: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let Some(confirmed) = swing_policy::compute_entry_continuation(&series, entry_idx) else {
            return Ok(());
        };

        decision.attrs.entry_continuation_confirmed = Some(confirmed);

        if let Some(transition) =
            swing_storage::state_store::fetch_transition(&self.pool, ticker, entry_open).await?
        {
            let mut attrs = transition
                .state_attrs_json
                .as_ref()
                .map(|v| serde_json::from_value::<StateAttrs>(v.clone()))
                .transpose()
                .map_err(|e| SwingError::InvariantViolation(format!("state_attrs_json: {e}")))?
                .unwrap_or_default();
            attrs.entry_continuation_confirmed = Some(confirmed);
            swing_storage::state_store::update_transition_attrs(
                &self.pool,
                ticker,
                entry_open,
                &attrs,
            )
            .await?;
        }

        Ok(())
    }

    /// Dispatches EW scoring writes: fastpass once at entry-window open,
    /// rolling on every day the window stays open (spec §4.5).
    async fn maybe_score_entry_window(
        &self,
        ticker: &str,
        as_of: NaiveDate,
        bars: &[swing_core::OhlcBar],
        prev_state: State,
        decision: &swing_policy::Decision,
        signals: &swing_core::SignalSet,
    ) -> Result<(), SwingError> {
        let Some(market) = self.scoring.market_for(ticker) else {
            return Ok(());
        };

        let just_opened = decision.next_state == State::EntryWindow && prev_state != State::EntryWindow;
        let still_open = decision.next_state == State::EntryWindow;

        if !just_opened && !still_open {
            return Ok(());
        }

        let Some(entry_open) =
            swing_storage::state_store::fetch_latest_entry_window_open(&self.pool, ticker, as_of).await?
        else {
            return Ok(());
        };
        let Some(entry_idx) = bars.iter().position(|b| b.date == entry_open) else {
            return Ok(());
        };
        let Some(as_of_idx) = bars.iter().rposition(|b| b.date == as_of) else {
            return Ok(());
        };
        let rows_total = (as_of_idx - entry_idx + 1) as u32;
        let close_entry = bars[entry_idx].close;
        let close_today = bars[as_of_idx].close;

        if just_opened && market.fastpass_enabled() {
            let last_stab_date = swing_storage::state_store::fetch_latest_signal_date(
                &self.pool,
                ticker,
                entry_open,
                SignalKey::StabilizationConfirmed,
            )
            .await?
            .unwrap_or(entry_open);
            let close_last_stab = bars
                .iter()
                .find(|b| b.date == last_stab_date)
                .map(|b| b.close)
                .unwrap_or(close_entry);

            let mut categorical_inputs = BTreeMap::new();
            match decision.attrs.entry_gate {
                Some(EntryGate::EarlyStabMa20Hl) => {
                    categorical_inputs.insert("gate_quality_a".to_string(), 1.0);
                }
                Some(EntryGate::EarlyStabMa20) => {
                    categorical_inputs.insert("gate_quality_b".to_string(), 1.0);
                }
                Some(EntryGate::LegacyEntrySetupValid) | None => {
                    categorical_inputs.insert("gate_quality_legacy".to_string(), 1.0);
                }
            }
            if signals.contains(SignalKey::HigherLowConfirmed) {
                categorical_inputs.insert("higher_low_confirmed".to_string(), 1.0);
            }
            if signals.contains(SignalKey::VolatilityCompressionDetected) {
                categorical_inputs.insert("volatility_compression".to_string(), 1.0);
            }

            let fastpass = swing_scoring::compute_fastpass(
                market,
                entry_open,
                last_stab_date,
                close_entry,
                close_last_stab,
                &categorical_inputs,
                rows_total,
            );
            swing_storage::ew_score_store::write_fastpass(&self.pool, ticker, as_of, &fastpass).await?;
        }

        if still_open && market.rolling_enabled() {
            if let Some(rolling) =
                swing_scoring::compute_rolling(market, entry_open, as_of, close_entry, close_today, rows_total)
            {
                swing_storage::ew_score_store::write_rolling(&self.pool, ticker, as_of, &rolling).await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use swing_core::ReasonCode;

    struct FixedSource {
        bars: Vec<swing_core::OhlcBar>,
    }

    #[async_trait]
    impl OhlcSource for FixedSource {
        async fn load(&self, _ticker: &str, as_of: NaiveDate) -> Result<Vec<swing_core::OhlcBar>, SwingError> {
            Ok(self.bars.iter().filter(|b| b.date <= as_of).cloned().collect())
        }
    }

    fn flat_bars(n: usize, start: NaiveDate, close: f64) -> Vec<swing_core::OhlcBar> {
        (0..n)
            .map(|i| swing_core::OhlcBar {
                date: start + Duration::days(i as i64),
                open: close,
                high: close * 1.003,
                low: close * 0.997,
                close,
            })
            .collect()
    }

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
    async fn evaluate_one_persists_a_no_signal_row_on_a_flat_series() {
        let pool = memory_pool().await;
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = flat_bars(60, start, 100.0);
        let as_of = bars.last().unwrap().date;
        let source = Arc::new(FixedSource { bars });

        let evaluator = Evaluator::new(
            pool.clone(),
            source,
            SignalProvider::new(swing_signals::ProviderConfig::default()),
            ScoringConfig::default(),
            "run-1".to_string(),
        );

        let row = evaluator.evaluate_one("ACME", as_of).await.unwrap();
        assert_eq!(row.state, State::NoTrade);
        assert_eq!(row.reasons, vec![ReasonCode::NoSignal]);

        let fetched = swing_storage::state_store::fetch_state_daily(&pool, "ACME", as_of)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.state, State::NoTrade);
    }

    #[tokio::test]
    async fn evaluate_range_serializes_by_ascending_date() {
        let pool = memory_pool().await;
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = flat_bars(70, start, 100.0);
        let source = Arc::new(FixedSource { bars: bars.clone() });

        let evaluator = Evaluator::new(
            pool.clone(),
            source,
            SignalProvider::new(swing_signals::ProviderConfig::default()),
            ScoringConfig::default(),
            "run-1".to_string(),
        );

        let dates: Vec<NaiveDate> = bars[60..65].iter().map(|b| b.date).collect();
        let rows = evaluator.evaluate_range("ACME", &dates).await.unwrap();
        assert_eq!(rows.len(), 5);
        for (row, date) in rows.iter().zip(dates.iter()) {
            assert_eq!(row.date, *date);
        }
    }

    #[tokio::test]
    async fn age_resets_to_one_on_a_state_change_and_never_to_zero() {
        let pool = memory_pool().await;
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        // A declining series long enough to eventually fire TREND_STARTED or
        // SLOW_DECLINE_STARTED out of NO_TRADE for at least one evaluated day.
        let mut bars = flat_bars(40, start, 100.0);
        let decline_start = bars.last().unwrap().date + Duration::days(1);
        for i in 0..40 {
            let close = 100.0 - i as f64 * 0.6;
            bars.push(swing_core::OhlcBar {
                date: decline_start + Duration::days(i as i64),
                open: close,
                high: close * 1.01,
                low: close * 0.985,
                close,
            });
        }
        let source = Arc::new(FixedSource { bars: bars.clone() });

        let evaluator = Evaluator::new(
            pool.clone(),
            source,
            SignalProvider::new(swing_signals::ProviderConfig::default()),
            ScoringConfig::default(),
            "run-1".to_string(),
        );

        let dates: Vec<NaiveDate> = bars[60..].iter().map(|b| b.date).collect();
        let rows = evaluator.evaluate_range("ACME", &dates).await.unwrap();
        for row in &rows {
            assert!(row.age >= 1, "age must never be 0, got {}", row.age);
        }
        // At least one state change should have age == 1 right after it.
        let any_reset_to_one = rows
            .windows(2)
            .any(|w| w[0].state != w[1].state && w[1].age == 1);
        assert!(
            rows.iter().any(|r| r.state != State::NoTrade),
            "expected the decline to move off NO_TRADE at least once"
        );
        assert!(any_reset_to_one || rows[0].age == 1);
    }
}
