use swing_core::{ReasonCode, SignalKey, SignalSet, State};

use crate::decision::Decision;
use crate::history;
use crate::history::{HistoryContext, SILENT_DECAY_DAYS};

/// Base layer: hard exclusions, then helpers in priority order, then
/// per-state rules, then the `NO_SIGNAL` fallback (spec §4.3). Returns an
/// unguarded proposal — the caller applies `graph::guard` afterward.
pub fn decide(prev: State, age: u32, signals: &SignalSet, hist: &HistoryContext) -> Decision {
    if signals.contains(SignalKey::DataInsufficient) {
        return Decision {
            next_state: State::NoTrade,
            reasons: vec![ReasonCode::DataInsufficient],
            attrs: Default::default(),
        };
    }
    if signals.contains(SignalKey::Invalidated) {
        return Decision {
            next_state: State::NoTrade,
            reasons: vec![ReasonCode::Invalidated],
            attrs: Default::default(),
        };
    }

    let tentative = per_state_rule(prev, signals);

    if let Some(decision) = edge_gone(prev, age, hist) {
        return decision;
    }
    if tentative.next_state != prev && hist.churns(prev, tentative.next_state) {
        return Decision::stay(prev, ReasonCode::ChurnGuard);
    }
    if let Some(decision) = entry_conditions_met(prev, signals, hist) {
        return decision;
    }
    if reset_to_neutral_applies(prev, hist) {
        return Decision::transition(State::NoTrade, ReasonCode::ResetToNeutral);
    }

    tentative
}

fn per_state_rule(prev: State, signals: &SignalSet) -> Decision {
    match prev {
        State::NoTrade => {
            if signals.contains(SignalKey::TrendStarted) {
                Decision::transition(State::DowntrendEarly, ReasonCode::TrendStarted)
            } else {
                Decision::stay(prev, ReasonCode::NoSignal)
            }
        }
        State::DowntrendEarly => {
            if signals.contains(SignalKey::TrendMatured) {
                Decision::transition(State::DowntrendLate, ReasonCode::TrendMatured)
            } else if signals.contains(SignalKey::StabilizationConfirmed) {
                Decision::transition(State::Stabilizing, ReasonCode::StabilizationConfirmed)
            } else if signals.contains(SignalKey::SellingPressureEased) {
                Decision::transition(State::Stabilizing, ReasonCode::SellingPressureEased)
            } else {
                Decision::stay(prev, ReasonCode::NoSignal)
            }
        }
        State::DowntrendLate => {
            if signals.contains(SignalKey::StabilizationConfirmed) {
                Decision::transition(State::Stabilizing, ReasonCode::StabilizationConfirmed)
            } else if signals.contains(SignalKey::SellingPressureEased) {
                Decision::transition(State::Stabilizing, ReasonCode::SellingPressureEased)
            } else {
                Decision::stay(prev, ReasonCode::NoSignal)
            }
        }
        State::Stabilizing => {
            if signals.contains(SignalKey::StabilizationConfirmed) {
                Decision::stay(prev, ReasonCode::StabilizationConfirmed)
            } else {
                Decision::stay(prev, ReasonCode::NoSignal)
            }
        }
        State::EntryWindow => {
            if signals.contains(SignalKey::EntrySetupValid) {
                Decision::stay(prev, ReasonCode::NoSignal)
            } else {
                Decision::transition(State::Pass, ReasonCode::EntryWindowCompleted)
            }
        }
        State::Pass => Decision::transition(State::NoTrade, ReasonCode::PassCompleted),
    }
}

fn edge_gone(prev: State, age: u32, hist: &HistoryContext) -> Option<Decision> {
    match prev {
        State::EntryWindow if age >= history::ENTRY_WINDOW_EDGE_GONE_AGE => {
            Some(Decision::transition(State::Pass, ReasonCode::EdgeGone))
        }
        State::Stabilizing
            if age >= history::STABILIZING_EDGE_GONE_AGE
                && !hist.entry_setup_valid_within_edge_gone_lookback =>
        {
            Some(Decision::transition(State::NoTrade, ReasonCode::EdgeGone))
        }
        _ => None,
    }
}

fn entry_conditions_met(
    prev: State,
    signals: &SignalSet,
    hist: &HistoryContext,
) -> Option<Decision> {
    if prev != State::Stabilizing {
        return None;
    }
    let blocked = [
        SignalKey::DataInsufficient,
        SignalKey::Invalidated,
        SignalKey::EdgeGone,
        SignalKey::NoSignal,
        SignalKey::TrendStarted,
        SignalKey::TrendMatured,
    ]
    .iter()
    .any(|k| signals.contains(*k));
    if blocked {
        return None;
    }

    if !signals.contains(SignalKey::EntrySetupValid) {
        return None;
    }
    let stabilization_context = signals.contains(SignalKey::StabilizationConfirmed)
        || hist.stabilization_confirmed_within_recency;
    if !stabilization_context {
        return None;
    }
    if !hist.entry_setup_valid_within_freshness {
        return None;
    }

    Some(Decision::transition(
        State::EntryWindow,
        ReasonCode::EntryConditionsMet,
    ))
}

fn reset_to_neutral_applies(prev: State, hist: &HistoryContext) -> bool {
    matches!(
        prev,
        State::DowntrendEarly | State::DowntrendLate | State::Stabilizing
    ) && hist.consecutive_fallback_days >= SILENT_DECAY_DAYS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(keys: &[SignalKey]) -> SignalSet {
        keys.iter().copied().collect()
    }

    #[test]
    fn no_trade_starts_downtrend_on_trend_started() {
        let hist = HistoryContext::default();
        let d = decide(
            State::NoTrade,
            5,
            &signals(&[SignalKey::TrendStarted]),
            &hist,
        );
        assert_eq!(d.next_state, State::DowntrendEarly);
        assert_eq!(d.reasons, vec![ReasonCode::TrendStarted]);
    }

    #[test]
    fn data_insufficient_overrides_everything() {
        let hist = HistoryContext::default();
        let d = decide(
            State::EntryWindow,
            5,
            &signals(&[SignalKey::DataInsufficient, SignalKey::EntrySetupValid]),
            &hist,
        );
        assert_eq!(d.next_state, State::NoTrade);
        assert_eq!(d.reasons, vec![ReasonCode::DataInsufficient]);
    }

    #[test]
    fn entry_window_edge_gone_forces_pass() {
        let hist = HistoryContext::default();
        let d = decide(
            State::EntryWindow,
            9,
            &signals(&[SignalKey::EntrySetupValid]),
            &hist,
        );
        assert_eq!(d.next_state, State::Pass);
        assert_eq!(d.reasons, vec![ReasonCode::EdgeGone]);
    }

    #[test]
    fn entry_conditions_met_promotes_from_stabilizing() {
        let mut hist = HistoryContext::default();
        hist.entry_setup_valid_within_freshness = true;
        let d = decide(
            State::Stabilizing,
            3,
            &signals(&[
                SignalKey::EntrySetupValid,
                SignalKey::StabilizationConfirmed,
            ]),
            &hist,
        );
        assert_eq!(d.next_state, State::EntryWindow);
        assert_eq!(d.reasons, vec![ReasonCode::EntryConditionsMet]);
    }

    #[test]
    fn pass_always_resets_to_no_trade() {
        let hist = HistoryContext::default();
        let d = decide(State::Pass, 1, &signals(&[]), &hist);
        assert_eq!(d.next_state, State::NoTrade);
        assert_eq!(d.reasons, vec![ReasonCode::PassCompleted]);
    }
}
