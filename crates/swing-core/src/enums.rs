use serde::{Deserialize, Serialize};
use std::fmt;

/// The downtrend→stabilization→entry→pass lifecycle (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum State {
    NoTrade,
    DowntrendEarly,
    DowntrendLate,
    Stabilizing,
    EntryWindow,
    Pass,
}

impl State {
    pub fn as_str(&self) -> &'static str {
        match self {
            State::NoTrade => "NO_TRADE",
            State::DowntrendEarly => "DOWNTREND_EARLY",
            State::DowntrendLate => "DOWNTREND_LATE",
            State::Stabilizing => "STABILIZING",
            State::EntryWindow => "ENTRY_WINDOW",
            State::Pass => "PASS",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for State {
    type Err = crate::error::SwingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "NO_TRADE" => State::NoTrade,
            "DOWNTREND_EARLY" => State::DowntrendEarly,
            "DOWNTREND_LATE" => State::DowntrendLate,
            "STABILIZING" => State::Stabilizing,
            "ENTRY_WINDOW" => State::EntryWindow,
            "PASS" => State::Pass,
            other => {
                return Err(crate::error::SwingError::InvariantViolation(format!(
                    "unknown State: {other}"
                )))
            }
        })
    }
}

/// The closed `SignalKey` set (spec §6.1), including Dow-theory facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SignalKey {
    SlowDeclineStarted,
    SlowDriftDetected,
    SharpSellOffDetected,
    StructuralDowntrendDetected,
    VolatilityCompressionDetected,
    Ma20Reclaimed,
    HigherLowConfirmed,
    StructureBreakoutUpConfirmed,
    TrendStarted,
    TrendMatured,
    SellingPressureEased,
    StabilizationConfirmed,
    EntrySetupValid,
    EdgeGone,
    Invalidated,
    DataInsufficient,
    NoSignal,

    DowTrendUp,
    DowTrendDown,
    DowTrendNeutral,
    DowTrendChangeUpToNeutral,
    DowTrendChangeDownToNeutral,
    DowTrendChangeNeutralToUp,
    DowTrendChangeNeutralToDown,
    DowLastLowL,
    DowLastLowHl,
    DowLastLowLl,
    DowLastHighH,
    DowLastHighHh,
    DowLastHighLh,
    DowNewLl,
    DowNewHh,
    DowReset,
    DowBosBreakUp,
    DowBosBreakDown,
}

impl SignalKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKey::SlowDeclineStarted => "SLOW_DECLINE_STARTED",
            SignalKey::SlowDriftDetected => "SLOW_DRIFT_DETECTED",
            SignalKey::SharpSellOffDetected => "SHARP_SELL_OFF_DETECTED",
            SignalKey::StructuralDowntrendDetected => "STRUCTURAL_DOWNTREND_DETECTED",
            SignalKey::VolatilityCompressionDetected => "VOLATILITY_COMPRESSION_DETECTED",
            SignalKey::Ma20Reclaimed => "MA20_RECLAIMED",
            SignalKey::HigherLowConfirmed => "HIGHER_LOW_CONFIRMED",
            SignalKey::StructureBreakoutUpConfirmed => "STRUCTURE_BREAKOUT_UP_CONFIRMED",
            SignalKey::TrendStarted => "TREND_STARTED",
            SignalKey::TrendMatured => "TREND_MATURED",
            SignalKey::SellingPressureEased => "SELLING_PRESSURE_EASED",
            SignalKey::StabilizationConfirmed => "STABILIZATION_CONFIRMED",
            SignalKey::EntrySetupValid => "ENTRY_SETUP_VALID",
            SignalKey::EdgeGone => "EDGE_GONE",
            SignalKey::Invalidated => "INVALIDATED",
            SignalKey::DataInsufficient => "DATA_INSUFFICIENT",
            SignalKey::NoSignal => "NO_SIGNAL",
            SignalKey::DowTrendUp => "DOW_TREND_UP",
            SignalKey::DowTrendDown => "DOW_TREND_DOWN",
            SignalKey::DowTrendNeutral => "DOW_TREND_NEUTRAL",
            SignalKey::DowTrendChangeUpToNeutral => "DOW_TREND_CHANGE_UP_TO_NEUTRAL",
            SignalKey::DowTrendChangeDownToNeutral => "DOW_TREND_CHANGE_DOWN_TO_NEUTRAL",
            SignalKey::DowTrendChangeNeutralToUp => "DOW_TREND_CHANGE_NEUTRAL_TO_UP",
            SignalKey::DowTrendChangeNeutralToDown => "DOW_TREND_CHANGE_NEUTRAL_TO_DOWN",
            SignalKey::DowLastLowL => "DOW_LAST_LOW_L",
            SignalKey::DowLastLowHl => "DOW_LAST_LOW_HL",
            SignalKey::DowLastLowLl => "DOW_LAST_LOW_LL",
            SignalKey::DowLastHighH => "DOW_LAST_HIGH_H",
            SignalKey::DowLastHighHh => "DOW_LAST_HIGH_HH",
            SignalKey::DowLastHighLh => "DOW_LAST_HIGH_LH",
            SignalKey::DowNewLl => "DOW_NEW_LL",
            SignalKey::DowNewHh => "DOW_NEW_HH",
            SignalKey::DowReset => "DOW_RESET",
            SignalKey::DowBosBreakUp => "DOW_BOS_BREAK_UP",
            SignalKey::DowBosBreakDown => "DOW_BOS_BREAK_DOWN",
        }
    }
}

impl SignalKey {
    /// True for the Dow-structure facts: descriptive metadata about trend
    /// shape, never a triggering event on their own (spec §4.1, §6.1).
    pub fn is_dow_fact(&self) -> bool {
        matches!(
            self,
            SignalKey::DowTrendUp
                | SignalKey::DowTrendDown
                | SignalKey::DowTrendNeutral
                | SignalKey::DowTrendChangeUpToNeutral
                | SignalKey::DowTrendChangeDownToNeutral
                | SignalKey::DowTrendChangeNeutralToUp
                | SignalKey::DowTrendChangeNeutralToDown
                | SignalKey::DowLastLowL
                | SignalKey::DowLastLowHl
                | SignalKey::DowLastLowLl
                | SignalKey::DowLastHighH
                | SignalKey::DowLastHighHh
                | SignalKey::DowLastHighLh
                | SignalKey::DowNewLl
                | SignalKey::DowNewHh
                | SignalKey::DowReset
                | SignalKey::DowBosBreakUp
                | SignalKey::DowBosBreakDown
        )
    }
}

impl fmt::Display for SignalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SignalKey {
    type Err = crate::error::SwingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "SLOW_DECLINE_STARTED" => SignalKey::SlowDeclineStarted,
            "SLOW_DRIFT_DETECTED" => SignalKey::SlowDriftDetected,
            "SHARP_SELL_OFF_DETECTED" => SignalKey::SharpSellOffDetected,
            "STRUCTURAL_DOWNTREND_DETECTED" => SignalKey::StructuralDowntrendDetected,
            "VOLATILITY_COMPRESSION_DETECTED" => SignalKey::VolatilityCompressionDetected,
            "MA20_RECLAIMED" => SignalKey::Ma20Reclaimed,
            "HIGHER_LOW_CONFIRMED" => SignalKey::HigherLowConfirmed,
            "STRUCTURE_BREAKOUT_UP_CONFIRMED" => SignalKey::StructureBreakoutUpConfirmed,
            "TREND_STARTED" => SignalKey::TrendStarted,
            "TREND_MATURED" => SignalKey::TrendMatured,
            "SELLING_PRESSURE_EASED" => SignalKey::SellingPressureEased,
            "STABILIZATION_CONFIRMED" => SignalKey::StabilizationConfirmed,
            "ENTRY_SETUP_VALID" => SignalKey::EntrySetupValid,
            "EDGE_GONE" => SignalKey::EdgeGone,
            "INVALIDATED" => SignalKey::Invalidated,
            "DATA_INSUFFICIENT" => SignalKey::DataInsufficient,
            "NO_SIGNAL" => SignalKey::NoSignal,
            "DOW_TREND_UP" => SignalKey::DowTrendUp,
            "DOW_TREND_DOWN" => SignalKey::DowTrendDown,
            "DOW_TREND_NEUTRAL" => SignalKey::DowTrendNeutral,
            "DOW_TREND_CHANGE_UP_TO_NEUTRAL" => SignalKey::DowTrendChangeUpToNeutral,
            "DOW_TREND_CHANGE_DOWN_TO_NEUTRAL" => SignalKey::DowTrendChangeDownToNeutral,
            "DOW_TREND_CHANGE_NEUTRAL_TO_UP" => SignalKey::DowTrendChangeNeutralToUp,
            "DOW_TREND_CHANGE_NEUTRAL_TO_DOWN" => SignalKey::DowTrendChangeNeutralToDown,
            "DOW_LAST_LOW_L" => SignalKey::DowLastLowL,
            "DOW_LAST_LOW_HL" => SignalKey::DowLastLowHl,
            "DOW_LAST_LOW_LL" => SignalKey::DowLastLowLl,
            "DOW_LAST_HIGH_H" => SignalKey::DowLastHighH,
            "DOW_LAST_HIGH_HH" => SignalKey::DowLastHighHh,
            "DOW_LAST_HIGH_LH" => SignalKey::DowLastHighLh,
            "DOW_NEW_LL" => SignalKey::DowNewLl,
            "DOW_NEW_HH" => SignalKey::DowNewHh,
            "DOW_RESET" => SignalKey::DowReset,
            "DOW_BOS_BREAK_UP" => SignalKey::DowBosBreakUp,
            "DOW_BOS_BREAK_DOWN" => SignalKey::DowBosBreakDown,
            other => {
                return Err(crate::error::SwingError::InvariantViolation(format!(
                    "unknown SignalKey: {other}"
                )))
            }
        })
    }
}

/// The closed `ReasonCode` set (spec §6.2). Serialized with a `POLICY:` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReasonCode {
    SlowDeclineStarted,
    TrendStarted,
    TrendMatured,
    SellingPressureEased,
    StabilizationConfirmed,
    EntryConditionsMet,
    EdgeGone,
    Invalidated,
    InvalidationBlockedByLock,
    DisallowedTransition,
    PassCompleted,
    EntryWindowCompleted,
    ResetToNeutral,
    ChurnGuard,
    MinStateAgeLock,
    DataInsufficient,
    NoSignal,
}

impl ReasonCode {
    pub fn code(&self) -> &'static str {
        match self {
            ReasonCode::SlowDeclineStarted => "SLOW_DECLINE_STARTED",
            ReasonCode::TrendStarted => "TREND_STARTED",
            ReasonCode::TrendMatured => "TREND_MATURED",
            ReasonCode::SellingPressureEased => "SELLING_PRESSURE_EASED",
            ReasonCode::StabilizationConfirmed => "STABILIZATION_CONFIRMED",
            ReasonCode::EntryConditionsMet => "ENTRY_CONDITIONS_MET",
            ReasonCode::EdgeGone => "EDGE_GONE",
            ReasonCode::Invalidated => "INVALIDATED",
            ReasonCode::InvalidationBlockedByLock => "INVALIDATION_BLOCKED_BY_LOCK",
            ReasonCode::DisallowedTransition => "DISALLOWED_TRANSITION",
            ReasonCode::PassCompleted => "PASS_COMPLETED",
            ReasonCode::EntryWindowCompleted => "ENTRY_WINDOW_COMPLETED",
            ReasonCode::ResetToNeutral => "RESET_TO_NEUTRAL",
            ReasonCode::ChurnGuard => "CHURN_GUARD",
            ReasonCode::MinStateAgeLock => "MIN_STATE_AGE_LOCK",
            ReasonCode::DataInsufficient => "DATA_INSUFFICIENT",
            ReasonCode::NoSignal => "NO_SIGNAL",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "POLICY:{}", self.code())
    }
}

impl std::str::FromStr for ReasonCode {
    type Err = crate::error::SwingError;

    /// Accepts both the bare code and the `POLICY:`-prefixed serialized form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.strip_prefix("POLICY:").unwrap_or(s);
        Ok(match code {
            "SLOW_DECLINE_STARTED" => ReasonCode::SlowDeclineStarted,
            "TREND_STARTED" => ReasonCode::TrendStarted,
            "TREND_MATURED" => ReasonCode::TrendMatured,
            "SELLING_PRESSURE_EASED" => ReasonCode::SellingPressureEased,
            "STABILIZATION_CONFIRMED" => ReasonCode::StabilizationConfirmed,
            "ENTRY_CONDITIONS_MET" => ReasonCode::EntryConditionsMet,
            "EDGE_GONE" => ReasonCode::EdgeGone,
            "INVALIDATED" => ReasonCode::Invalidated,
            "INVALIDATION_BLOCKED_BY_LOCK" => ReasonCode::InvalidationBlockedByLock,
            "DISALLOWED_TRANSITION" => ReasonCode::DisallowedTransition,
            "PASS_COMPLETED" => ReasonCode::PassCompleted,
            "ENTRY_WINDOW_COMPLETED" => ReasonCode::EntryWindowCompleted,
            "RESET_TO_NEUTRAL" => ReasonCode::ResetToNeutral,
            "CHURN_GUARD" => ReasonCode::ChurnGuard,
            "MIN_STATE_AGE_LOCK" => ReasonCode::MinStateAgeLock,
            "DATA_INSUFFICIENT" => ReasonCode::DataInsufficient,
            "NO_SIGNAL" => ReasonCode::NoSignal,
            other => {
                return Err(crate::error::SwingError::InvariantViolation(format!(
                    "unknown ReasonCode: {other}"
                )))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_code_serializes_with_policy_prefix() {
        assert_eq!(ReasonCode::EdgeGone.to_string(), "POLICY:EDGE_GONE");
    }

    #[test]
    fn state_names_round_trip_through_as_str() {
        for s in [
            State::NoTrade,
            State::DowntrendEarly,
            State::DowntrendLate,
            State::Stabilizing,
            State::EntryWindow,
            State::Pass,
        ] {
            assert!(!s.as_str().is_empty());
        }
    }

    #[test]
    fn state_round_trips_through_display_and_from_str() {
        use std::str::FromStr;
        for s in [
            State::NoTrade,
            State::DowntrendEarly,
            State::DowntrendLate,
            State::Stabilizing,
            State::EntryWindow,
            State::Pass,
        ] {
            assert_eq!(State::from_str(s.as_str()).unwrap(), s);
        }
        assert!(State::from_str("BOGUS").is_err());
    }

    #[test]
    fn signal_key_round_trips_through_display_and_from_str() {
        use std::str::FromStr;
        for k in [
            SignalKey::SlowDeclineStarted,
            SignalKey::DowNewLl,
            SignalKey::DowBosBreakDown,
            SignalKey::NoSignal,
        ] {
            assert_eq!(SignalKey::from_str(k.as_str()).unwrap(), k);
        }
        assert!(SignalKey::from_str("BOGUS").is_err());
    }

    #[test]
    fn reason_code_round_trips_with_or_without_prefix() {
        use std::str::FromStr;
        assert_eq!(
            ReasonCode::from_str("POLICY:EDGE_GONE").unwrap(),
            ReasonCode::EdgeGone
        );
        assert_eq!(
            ReasonCode::from_str("EDGE_GONE").unwrap(),
            ReasonCode::EdgeGone
        );
        assert!(ReasonCode::from_str("BOGUS").is_err());
    }
}
