use swing_core::State;

/// Lookback/threshold constants behind the history-aware helpers (spec §4.3,
/// §9 Open Questions — resolved per the grounding ledger).
pub const CHURN_LOOKBACK_DAYS: u32 = 10;
pub const CHURN_MAX_REPEATS: usize = 1;
pub const STAB_RECENCY_DAYS: u32 = 10;
pub const SETUP_FRESH_DAYS: u32 = 5;
pub const SILENT_DECAY_DAYS: u32 = 15;
pub const ENTRY_WINDOW_EDGE_GONE_AGE: u32 = 9;
pub const STABILIZING_EDGE_GONE_AGE: u32 = 20;
pub const RECENT_ENTRY_SETUP_LOOKBACK_DAYS: u32 = 10;

/// Recency facts the policy needs beyond `(prev_state, signals)` — all
/// derived by the caller from persisted `StateDaily`/`Transition`/
/// `SignalDaily` history, never recomputed inside the policy itself.
#[derive(Debug, Clone, Default)]
pub struct HistoryContext {
    /// `(from, to)` pairs of the most recent transitions within
    /// `CHURN_LOOKBACK_DAYS`, newest first.
    pub recent_transitions: Vec<(State, State)>,
    /// Consecutive most-recent evaluations whose decision was the bare
    /// `NO_SIGNAL` fallback stay (reset to 0 on any other reason).
    pub consecutive_fallback_days: u32,
    /// `STABILIZATION_CONFIRMED` appeared (same-day or historically) within
    /// `STAB_RECENCY_DAYS`.
    pub stabilization_confirmed_within_recency: bool,
    /// `ENTRY_SETUP_VALID` appeared within `SETUP_FRESH_DAYS`.
    pub entry_setup_valid_within_freshness: bool,
    /// `ENTRY_SETUP_VALID` appeared within `RECENT_ENTRY_SETUP_LOOKBACK_DAYS`
    /// — used by the `STABILIZING` `EDGE_GONE` exception.
    pub entry_setup_valid_within_edge_gone_lookback: bool,
}

impl HistoryContext {
    /// True iff the exact `(from, to)` pair already occurred at least
    /// `CHURN_MAX_REPEATS` times within the lookback window.
    pub fn churns(&self, from: State, to: State) -> bool {
        self.recent_transitions
            .iter()
            .filter(|&&(f, t)| f == from && t == to)
            .count()
            >= CHURN_MAX_REPEATS
    }
}
