use crate::enums::{ReasonCode, SignalKey, State};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

/// `rc_state_daily` — created on each evaluation, mutated never (spec §3, §6.3).
#[derive(Debug, Clone)]
pub struct StateDailyRow {
    pub ticker: String,
    pub date: NaiveDate,
    pub state: State,
    pub prev_state: Option<State>,
    pub reasons: Vec<ReasonCode>,
    pub age: u32,
    pub state_attrs_json: Option<Value>,
    pub run_id: String,
}

/// `rc_transition` — recorded only when `from_state != to_state`.
#[derive(Debug, Clone)]
pub struct TransitionRow {
    pub ticker: String,
    pub date: NaiveDate,
    pub from_state: State,
    pub to_state: State,
    pub reasons: Vec<ReasonCode>,
    pub state_attrs_json: Option<Value>,
    pub run_id: String,
}

/// `rc_signal_daily`.
#[derive(Debug, Clone)]
pub struct SignalDailyRow {
    pub ticker: String,
    pub date: NaiveDate,
    pub signal_keys: Vec<SignalKey>,
    pub run_id: String,
}

/// `rc_ew_score_daily` — three isolated column groups (spec §3, §4.5).
#[derive(Debug, Clone, Default)]
pub struct EwScoreDailyRow {
    pub ticker: String,
    pub date: NaiveDate,

    pub score_day3: Option<f64>,
    pub level_day3: Option<i32>,
    pub rule: Option<String>,
    pub inputs_json: Option<Value>,

    pub score_fastpass: Option<f64>,
    pub level_fastpass: Option<i32>,
    pub rule_fastpass: Option<String>,
    pub inputs_json_fastpass: Option<Value>,

    pub score_rolling: Option<f64>,
    pub level_rolling: Option<i32>,
    pub rule_rolling: Option<String>,
    pub inputs_json_rolling: Option<Value>,
}

impl EwScoreDailyRow {
    pub fn empty(ticker: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            ticker: ticker.into(),
            date,
            ..Default::default()
        }
    }
}

/// `rc_run` — one row per evaluation run (spec §6.3, §6.4).
#[derive(Debug, Clone)]
pub struct RunRow {
    pub run_id: String,
    pub created_at: DateTime<Utc>,
    pub engine_version: String,
    pub policy_id: String,
    pub policy_version: String,
}
