use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde_json::json;

use crate::level::level;
use crate::market::Market;
use crate::rules::{FASTPASS_FIN, FASTPASS_SE, FASTPASS_USA_SMALL, FastpassModel};

/// One fastpass computation's output: the score/level pair plus the rule
/// id and audit JSON to write into the isolated fastpass column group
/// (spec §3, §4.5).
#[derive(Debug, Clone, PartialEq)]
pub struct FastpassResult {
    pub rule_id: &'static str,
    pub score: f64,
    pub level: i32,
    pub inputs_json: serde_json::Value,
}

fn model_for(market: Market) -> &'static FastpassModel {
    match market {
        Market::Omxh => &FASTPASS_FIN,
        Market::Omxs => &FASTPASS_SE,
        Market::Usa => &FASTPASS_USA_SMALL,
    }
}

/// Computes the fastpass score at entry-window open (spec §4.5). `r_stab_to_entry_pct`
/// is the return from `close_last_stab` to `close_entry`; `categorical_inputs`
/// carries the categorical model features (entry-gate quality, structure
/// facts) as 0/1-valued entries keyed by feature name.
pub fn compute_fastpass(
    market: Market,
    entry_date: NaiveDate,
    last_stab_date: NaiveDate,
    close_entry: f64,
    close_last_stab: f64,
    categorical_inputs: &BTreeMap<String, f64>,
    rows_total: u32,
) -> FastpassResult {
    let model = model_for(market);
    let r_stab_to_entry_pct = if close_last_stab != 0.0 {
        (close_entry - close_last_stab) / close_last_stab
    } else {
        0.0
    };
    let (score_raw_z, score) = model.score(r_stab_to_entry_pct, categorical_inputs);
    let threshold = market.fastpass_threshold();
    let lvl = level(score, rows_total, threshold);

    let inputs_json = json!({
        "rule_id": model.rule_id,
        "beta0": model.beta0,
        "threshold": threshold,
        "entry_date": entry_date,
        "last_stab_date": last_stab_date,
        "close_entry": close_entry,
        "close_last_stab": close_last_stab,
        "r_stab_to_entry_pct": r_stab_to_entry_pct,
        "categorical_inputs": categorical_inputs,
        "rows_total": rows_total,
        "score_raw_z": score_raw_z,
    });

    FastpassResult {
        rule_id: model.rule_id,
        score,
        level: lvl,
        inputs_json,
    }
}
