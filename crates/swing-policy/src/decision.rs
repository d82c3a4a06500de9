use swing_core::{ReasonCode, State, StateAttrs};

/// The output of one policy evaluation: the proposed (and, by the time the
/// engine persists it, guard-resolved) next state, the ordered reason codes
/// that justify it, and the merged state-attrs for the row (spec §3, §9).
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub next_state: State,
    pub reasons: Vec<ReasonCode>,
    pub attrs: StateAttrs,
}

impl Decision {
    pub fn stay(state: State, reason: ReasonCode) -> Self {
        Self {
            next_state: state,
            reasons: vec![reason],
            attrs: StateAttrs::default(),
        }
    }

    pub fn transition(to: State, reason: ReasonCode) -> Self {
        Self {
            next_state: to,
            reasons: vec![reason],
            attrs: StateAttrs::default(),
        }
    }

    pub fn push_reason(&mut self, reason: ReasonCode) {
        if !self.reasons.contains(&reason) {
            self.reasons.push(reason);
        }
    }
}
