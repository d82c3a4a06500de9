use swing_core::{ReasonCode, SignalKey, SignalSet, State};

use crate::decision::Decision;

/// v2 additions layered on top of the v1 proposal (spec §4.3). Still
/// unguarded — the caller runs `graph::guard` on the result.
pub fn postprocess(prev: State, signals: &SignalSet, mut decision: Decision) -> Decision {
    if matches!(prev, State::Stabilizing | State::EntryWindow) && signals.contains(SignalKey::DowNewLl)
    {
        return Decision::transition(State::NoTrade, ReasonCode::Invalidated);
    }

    if prev == State::NoTrade
        && decision.next_state == State::NoTrade
        && decision.reasons == [ReasonCode::NoSignal]
        && signals.contains(SignalKey::SlowDeclineStarted)
        && !signals.contains(SignalKey::DowTrendUp)
    {
        return Decision::transition(State::DowntrendEarly, ReasonCode::SlowDeclineStarted);
    }

    if prev == State::Stabilizing
        && decision.next_state == State::Stabilizing
        && signals.contains(SignalKey::TrendStarted)
    {
        decision.push_reason(ReasonCode::TrendStarted);
    }

    decision
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(keys: &[SignalKey]) -> SignalSet {
        keys.iter().copied().collect()
    }

    #[test]
    fn dow_new_ll_injects_invalidated_from_stabilizing() {
        let base = Decision::stay(State::Stabilizing, ReasonCode::NoSignal);
        let d = postprocess(
            State::Stabilizing,
            &signals(&[SignalKey::DowNewLl]),
            base,
        );
        assert_eq!(d.next_state, State::NoTrade);
        assert_eq!(d.reasons, vec![ReasonCode::Invalidated]);
    }

    #[test]
    fn slow_decline_started_opens_downtrend_when_base_was_no_signal() {
        let base = Decision::stay(State::NoTrade, ReasonCode::NoSignal);
        let d = postprocess(
            State::NoTrade,
            &signals(&[SignalKey::SlowDeclineStarted]),
            base,
        );
        assert_eq!(d.next_state, State::DowntrendEarly);
        assert_eq!(d.reasons, vec![ReasonCode::SlowDeclineStarted]);
    }

    #[test]
    fn slow_decline_started_blocked_by_dow_trend_up() {
        let base = Decision::stay(State::NoTrade, ReasonCode::NoSignal);
        let d = postprocess(
            State::NoTrade,
            &signals(&[SignalKey::SlowDeclineStarted, SignalKey::DowTrendUp]),
            base.clone(),
        );
        assert_eq!(d, base);
    }

    #[test]
    fn trend_started_reason_retained_on_stabilizing_no_op() {
        let base = Decision::stay(State::Stabilizing, ReasonCode::NoSignal);
        let d = postprocess(
            State::Stabilizing,
            &signals(&[SignalKey::TrendStarted]),
            base,
        );
        assert_eq!(d.next_state, State::Stabilizing);
        assert!(d.reasons.contains(&ReasonCode::TrendStarted));
        assert!(d.reasons.contains(&ReasonCode::NoSignal));
    }
}
