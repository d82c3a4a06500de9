//! Deterministic state-transition policy: v1 base rules, v2 overlays, the
//! transition-graph guard, and the v3 entry-gate override, wired into one
//! `decide` entry point. The policy itself holds no state across calls —
//! all recency facts are supplied by the caller via [`HistoryContext`].

pub mod continuation;
pub mod decision;
pub mod graph;
pub mod history;
mod v1;
mod v2;
mod v3;

pub use continuation::compute_entry_continuation;
pub use decision::Decision;
pub use history::HistoryContext;

use swing_core::{SignalSet, State, StateAttrs};

/// Everything one evaluation of the policy needs, beyond the day's signals.
#[derive(Debug, Clone)]
pub struct EvaluationContext<'a> {
    pub prev_state: State,
    /// Number of consecutive days `prev_state` has already been held.
    pub age: u32,
    pub signals: &'a SignalSet,
    pub prev_attrs: &'a StateAttrs,
    pub history: HistoryContext,
}

/// Runs the full v1 → v2 → guard → v3 pipeline and returns the final,
/// guard-resolved decision with merged state-attrs.
pub fn decide(ctx: &EvaluationContext<'_>) -> Decision {
    let v1 = v1::decide(ctx.prev_state, ctx.age, ctx.signals, &ctx.history);
    let v2 = v2::postprocess(ctx.prev_state, ctx.signals, v1);
    let guarded = graph::guard(ctx.prev_state, ctx.age, v2);
    v3::postprocess(ctx.prev_state, ctx.age, ctx.signals, ctx.prev_attrs, guarded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use swing_core::{ReasonCode, SignalKey};

    fn signals(keys: &[SignalKey]) -> SignalSet {
        keys.iter().copied().collect()
    }

    #[test]
    fn full_pipeline_promotes_no_trade_to_downtrend_early() {
        let sig = signals(&[SignalKey::TrendStarted]);
        let attrs = StateAttrs::default();
        let ctx = EvaluationContext {
            prev_state: State::NoTrade,
            age: 3,
            signals: &sig,
            prev_attrs: &attrs,
            history: HistoryContext::default(),
        };
        let d = decide(&ctx);
        assert_eq!(d.next_state, State::DowntrendEarly);
        assert_eq!(d.reasons, vec![ReasonCode::TrendStarted]);
        assert_eq!(d.attrs.downtrend_origin, Some(swing_core::DowntrendOrigin::Trend));
    }

    #[test]
    fn full_pipeline_blocks_early_transition_with_min_state_age_lock() {
        let sig = signals(&[SignalKey::StabilizationConfirmed]);
        let attrs = StateAttrs::default();
        let ctx = EvaluationContext {
            prev_state: State::DowntrendEarly,
            age: 0,
            signals: &sig,
            prev_attrs: &attrs,
            history: HistoryContext::default(),
        };
        let d = decide(&ctx);
        assert_eq!(d.next_state, State::DowntrendEarly);
        assert_eq!(d.reasons, vec![ReasonCode::MinStateAgeLock]);
    }

    #[test]
    fn full_pipeline_applies_gate_a_from_stabilizing() {
        let sig = signals(&[SignalKey::Ma20Reclaimed, SignalKey::HigherLowConfirmed]);
        let attrs = StateAttrs::default();
        let ctx = EvaluationContext {
            prev_state: State::Stabilizing,
            age: 3,
            signals: &sig,
            prev_attrs: &attrs,
            history: HistoryContext::default(),
        };
        let d = decide(&ctx);
        assert_eq!(d.next_state, State::EntryWindow);
        assert_eq!(
            d.attrs.entry_gate,
            Some(swing_core::EntryGate::EarlyStabMa20Hl)
        );
    }

    #[test]
    fn full_pipeline_invalidation_from_stabilizing_falls_to_no_trade() {
        let sig = signals(&[SignalKey::DowNewLl]);
        let attrs = StateAttrs::default();
        let ctx = EvaluationContext {
            prev_state: State::Stabilizing,
            age: 5,
            signals: &sig,
            prev_attrs: &attrs,
            history: HistoryContext::default(),
        };
        let d = decide(&ctx);
        assert_eq!(d.next_state, State::NoTrade);
        assert_eq!(d.reasons, vec![ReasonCode::Invalidated]);
    }

    #[test]
    fn full_pipeline_entry_window_edge_gone_moves_to_pass() {
        let sig = signals(&[SignalKey::EntrySetupValid]);
        let attrs = StateAttrs::default();
        let ctx = EvaluationContext {
            prev_state: State::EntryWindow,
            age: 9,
            signals: &sig,
            prev_attrs: &attrs,
            history: HistoryContext::default(),
        };
        let d = decide(&ctx);
        assert_eq!(d.next_state, State::Pass);
        assert_eq!(d.reasons, vec![ReasonCode::EdgeGone]);
    }
}
