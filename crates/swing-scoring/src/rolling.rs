use chrono::NaiveDate;
use serde_json::json;

use crate::level::level;
use crate::market::Market;
use crate::rules::{ROLLING_FIN, ROLLING_SE, RollingModel};

/// One rolling computation's output (spec §3, §4.5). `None` from
/// [`compute_rolling`] when the market has rolling disabled (`usa`).
#[derive(Debug, Clone, PartialEq)]
pub struct RollingResult {
    pub rule_id: &'static str,
    pub score: f64,
    pub level: i32,
    pub inputs_json: serde_json::Value,
}

fn model_for(market: Market) -> Option<&'static RollingModel> {
    match market {
        Market::Omxh => Some(&ROLLING_FIN),
        Market::Omxs => Some(&ROLLING_SE),
        Market::Usa => None,
    }
}

/// Recomputes the rolling score from the entry-window open through
/// `as_of_date` using the prefix return `close_day0 → close_today`
/// (spec §4.5). Returns `None` for markets with rolling disabled.
pub fn compute_rolling(
    market: Market,
    entry_date: NaiveDate,
    as_of_date: NaiveDate,
    close_day0: f64,
    close_today: f64,
    rows_total: u32,
) -> Option<RollingResult> {
    let model = model_for(market)?;
    let r_prefix_pct = if close_day0 != 0.0 {
        (close_today - close_day0) / close_day0
    } else {
        0.0
    };
    let (score_raw_z, score) = model.score(r_prefix_pct);
    let threshold = market
        .rolling_threshold()
        .expect("rolling_threshold present whenever model_for returns Some");
    let lvl = level(score, rows_total, threshold);

    let inputs_json = json!({
        "rule_id": model.rule_id,
        "beta0": model.beta0,
        "beta1": model.beta1,
        "threshold": threshold,
        "entry_date": entry_date,
        "as_of_date": as_of_date,
        "close_day0": close_day0,
        "close_today": close_today,
        "r_prefix_pct": r_prefix_pct,
        "rows_total": rows_total,
        "score_raw_z": score_raw_z,
    });

    Some(RollingResult {
        rule_id: model.rule_id,
        score,
        level: lvl,
        inputs_json,
    })
}
