use swing_core::{
    DeclineProfile, DowntrendEntryType, DowntrendOrigin, EntryGate, ReasonCode, SignalKey,
    SignalSet, StabilizationPhase, State, StateAttrs,
};

use crate::decision::Decision;
use crate::graph;

/// v3: applies the entry-gate override from `STABILIZING` to the already
/// v1+v2+guarded decision, re-guards the resulting promotion (a fresh
/// proposal the earlier guard pass never saw), and merges state-attrs
/// (spec §4.3, §4.4). Introduces no new reason codes.
pub fn postprocess(
    prev: State,
    age: u32,
    signals: &SignalSet,
    prev_attrs: &StateAttrs,
    guarded: Decision,
) -> Decision {
    let (gated, gate) = apply_gate_override(prev, age, signals, guarded);
    let mut attrs = merge_attrs(prev, gated.next_state, signals, prev_attrs);

    if let Some(gate) = gate {
        attrs.entry_gate = Some(gate);
        attrs.entry_quality = Some(gate.entry_quality().to_string());
    } else if prev == State::Stabilizing
        && gated.next_state == State::EntryWindow
        && gated.reasons.contains(&ReasonCode::EntryConditionsMet)
    {
        attrs.entry_gate = Some(EntryGate::LegacyEntrySetupValid);
        attrs.entry_quality = Some(EntryGate::LegacyEntrySetupValid.entry_quality().to_string());
    }

    Decision {
        next_state: gated.next_state,
        reasons: gated.reasons,
        attrs,
    }
}

/// Gate override only fires on a same-state `STABILIZING` stay: a real
/// transition already decided by v1/v2 is left untouched. Returns the
/// (possibly overridden and re-guarded) decision plus which gate fired, if
/// any.
fn apply_gate_override(
    prev: State,
    age: u32,
    signals: &SignalSet,
    guarded: Decision,
) -> (Decision, Option<EntryGate>) {
    if prev != State::Stabilizing || guarded.next_state != State::Stabilizing {
        return (guarded, None);
    }
    if signals.contains(SignalKey::Invalidated) {
        return (guarded, None);
    }
    if !signals.contains(SignalKey::Ma20Reclaimed) {
        return (guarded, None);
    }

    let gate = if signals.contains(SignalKey::HigherLowConfirmed) {
        EntryGate::EarlyStabMa20Hl
    } else {
        EntryGate::EarlyStabMa20
    };

    let proposed = Decision {
        next_state: State::EntryWindow,
        reasons: guarded.reasons.clone(),
        attrs: guarded.attrs.clone(),
    };
    let reguarded = graph::guard(prev, age, proposed);
    if reguarded.next_state == State::EntryWindow {
        (reguarded, Some(gate))
    } else {
        (reguarded, None)
    }
}

fn merge_attrs(
    prev: State,
    final_next: State,
    signals: &SignalSet,
    prev_attrs: &StateAttrs,
) -> StateAttrs {
    let mut attrs = prev_attrs.clone();

    let opening_downtrend = prev == State::NoTrade && final_next == State::DowntrendEarly;

    // downtrend_origin
    if opening_downtrend {
        if signals.contains(SignalKey::TrendStarted) {
            attrs.downtrend_origin = Some(DowntrendOrigin::Trend);
        } else if signals.contains(SignalKey::SlowDeclineStarted) {
            attrs.downtrend_origin = Some(DowntrendOrigin::Slow);
        }
    }

    // downtrend_entry_type: write-once
    if attrs.downtrend_entry_type.is_none() && opening_downtrend {
        let slow = signals.contains(SignalKey::SlowDeclineStarted);
        let trend = signals.contains(SignalKey::TrendStarted);
        let structural = signals.contains(SignalKey::StructuralDowntrendDetected)
            || signals.contains(SignalKey::DowTrendDown)
            || signals.contains(SignalKey::DowNewLl)
            || signals.contains(SignalKey::DowBosBreakDown);
        attrs.downtrend_entry_type = Some(if slow && structural {
            DowntrendEntryType::SlowStructural
        } else if slow {
            DowntrendEntryType::SlowSoft
        } else if trend && structural {
            DowntrendEntryType::TrendStructural
        } else if trend {
            DowntrendEntryType::TrendSoft
        } else {
            DowntrendEntryType::Unknown
        });
    }

    // decline_profile: resets at the start of a new downtrend phase, then
    // monotone within it.
    if opening_downtrend {
        attrs.decline_profile = None;
    }
    let candidate = if signals.contains(SignalKey::SlowDriftDetected) {
        Some(DeclineProfile::SlowDrift)
    } else if signals.contains(SignalKey::SharpSellOffDetected) {
        Some(DeclineProfile::SharpSellOff)
    } else if signals.contains(SignalKey::StructuralDowntrendDetected)
        || signals.contains(SignalKey::TrendMatured)
        || signals.contains(SignalKey::DowTrendDown)
    {
        Some(DeclineProfile::StructuralDowntrend)
    } else {
        None
    };
    if let Some(candidate) = candidate {
        attrs.decline_profile = Some(match attrs.decline_profile {
            None => candidate,
            Some(prev_val) if prev_val.allows_transition_to(candidate) => candidate,
            Some(prev_val) => prev_val,
        });
    }

    // stabilization_phase
    let invalidated = signals.contains(SignalKey::Invalidated);
    if final_next == State::Stabilizing {
        attrs.stabilization_phase = Some(
            if signals.contains(SignalKey::EntrySetupValid) && !invalidated {
                StabilizationPhase::EarlyReversal
            } else if signals.contains(SignalKey::StabilizationConfirmed)
                && signals.contains(SignalKey::VolatilityCompressionDetected)
                && !invalidated
            {
                StabilizationPhase::BaseBuilding
            } else {
                StabilizationPhase::EarlyStabilization
            },
        );
    } else if final_next == State::EntryWindow {
        attrs.stabilization_phase = Some(StabilizationPhase::EarlyReversal);
    }
    // Invariant fix: stabilizing legacy-invalidated fall to NO_TRADE forces
    // EARLY_STABILIZATION regardless of the branch above.
    if prev == State::Stabilizing
        && final_next == State::NoTrade
        && signals.contains(SignalKey::EntrySetupValid)
        && invalidated
    {
        attrs.stabilization_phase = Some(StabilizationPhase::EarlyStabilization);
    }

    attrs
}
