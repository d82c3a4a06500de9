//! EW scoring engine (spec §2, §4.5): dual-mode (fastpass/rolling) score
//! computation with per-market routing, the uniform 0/1/2/3 level contract,
//! and locked rule-id coefficient tables. Computation here is pure — callers
//! (swing-storage) own the isolated-UPSERT write discipline into
//! `rc_ew_score_daily`'s three column groups.

pub mod fastpass;
pub mod level;
pub mod market;
pub mod rolling;
pub mod rules;

pub use fastpass::{compute_fastpass, FastpassResult};
pub use level::level;
pub use market::Market;
pub use rolling::{compute_rolling, RollingResult};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    #[test]
    fn router_skips_rolling_for_usa_but_always_runs_fastpass() {
        let entry = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let inputs = BTreeMap::new();

        let fp = compute_fastpass(Market::Usa, entry, entry, 40.0, 38.0, &inputs, 3);
        assert_eq!(fp.rule_id, "EW_SCORE_FASTPASS_V1_USA_SMALL");

        let roll = compute_rolling(Market::Usa, entry, today, 40.0, 41.0, 3);
        assert!(roll.is_none());
    }

    #[test]
    fn omxh_and_omxs_run_both_modes_with_distinct_rule_ids() {
        let entry = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let inputs = BTreeMap::new();

        for market in [Market::Omxh, Market::Omxs] {
            let fp = compute_fastpass(market, entry, entry, 40.0, 38.0, &inputs, 3);
            let roll = compute_rolling(market, entry, today, 40.0, 41.0, 3).unwrap();
            assert_ne!(fp.rule_id, roll.rule_id);
        }
    }
}
