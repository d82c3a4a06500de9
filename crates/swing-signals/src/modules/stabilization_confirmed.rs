use swing_core::{OhlcWindow, SignalKey};

use crate::config::{ProviderConfig, SWEEP_EPS};
use crate::util::median;

const RECENT_WINDOW: usize = 7;
const BASELINE_WINDOW: usize = 20;
const RANGE_SHRINK_MAX_RATIO: f64 = 0.75;
const WIDE_DAY_MULT: f64 = 1.5;
const WIDE_DAY_MAX_SHARE: f64 = 0.20;
const MAX_SWEEPS: usize = 1;
const UPPER_CLOSE_MIN_RATIO: f64 = 0.55;
const UPPER_CLOSE_MIN_DAYS: usize = 3;

/// A quieting range (recent 7 days vs. the prior 20-day baseline), few wide
/// days, no fresh significant low beyond at most one shallow sweep, and
/// closes favoring the upper half of the daily range on most recent days
/// (spec §4.1).
///
/// `baseline_median` in both the range-shrink and wide-day checks is read as
/// the median of the baseline window's own range-to-close ratios, keeping
/// both comparisons on the same normalized scale; the "new low" floor is the
/// baseline window's low, with a day below it by more than `SWEEP_EPS`
/// counted as significant and a shallower undercut tolerated as a sweep —
/// documented as a grounding decision in DESIGN.md.
pub fn evaluate(window: &OhlcWindow, _cfg: &ProviderConfig) -> Option<SignalKey> {
    let recent_highs = window.highs(RECENT_WINDOW)?;
    let recent_lows = window.lows(RECENT_WINDOW)?;
    let recent_closes = window.closes(RECENT_WINDOW)?;

    let baseline = window.from_offset(RECENT_WINDOW);
    let baseline_highs = baseline.highs(BASELINE_WINDOW)?;
    let baseline_lows = baseline.lows(BASELINE_WINDOW)?;
    let baseline_closes = baseline.closes(BASELINE_WINDOW)?;

    let recent_ratios = range_ratios(&recent_highs, &recent_lows, &recent_closes);
    let baseline_ratios = range_ratios(&baseline_highs, &baseline_lows, &baseline_closes);

    let recent_median = median(&recent_ratios);
    let baseline_median = median(&baseline_ratios);
    if baseline_median <= 0.0 || recent_median > RANGE_SHRINK_MAX_RATIO * baseline_median {
        return None;
    }

    let wide_days = recent_ratios.iter().filter(|&&r| r >= WIDE_DAY_MULT * baseline_median).count();
    if wide_days as f64 / RECENT_WINDOW as f64 > WIDE_DAY_MAX_SHARE {
        return None;
    }

    let floor = crate::util::min(&baseline_lows);
    let mut significant_new_lows = 0usize;
    let mut sweeps = 0usize;
    for &low in &recent_lows {
        if low < floor * (1.0 - SWEEP_EPS) {
            significant_new_lows += 1;
        } else if low < floor {
            sweeps += 1;
        }
    }
    if significant_new_lows > 0 || sweeps > MAX_SWEEPS {
        return None;
    }

    let upper_close_days = (0..RECENT_WINDOW)
        .filter(|&i| {
            let range = recent_highs[i] - recent_lows[i];
            range > 0.0 && (recent_closes[i] - recent_lows[i]) / range >= UPPER_CLOSE_MIN_RATIO
        })
        .count();
    if upper_close_days < UPPER_CLOSE_MIN_DAYS {
        return None;
    }

    Some(SignalKey::StabilizationConfirmed)
}

fn range_ratios(highs: &[f64], lows: &[f64], closes: &[f64]) -> Vec<f64> {
    highs
        .iter()
        .zip(lows.iter())
        .zip(closes.iter())
        .map(|((h, l), c)| if *c > 0.0 { (h - l) / c } else { 0.0 })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use swing_core::OhlcBar;

    fn bar(date: NaiveDate, high: f64, low: f64, close: f64) -> OhlcBar {
        OhlcBar { date, open: close, high, low, close }
    }

    #[test]
    fn fires_on_tight_recent_range_with_upper_closes_above_the_floor() {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut rows = Vec::new();
        for i in 0..20 {
            rows.push(bar(base + chrono::Duration::days(i), 103.0, 97.0, 100.0));
        }
        for i in 20..27 {
            rows.push(bar(base + chrono::Duration::days(i), 100.6, 99.8, 100.5));
        }
        let w = OhlcWindow::new(&rows);
        assert_eq!(
            evaluate(&w, &ProviderConfig::default()),
            Some(SignalKey::StabilizationConfirmed)
        );
    }

    #[test]
    fn no_fire_when_a_fresh_significant_low_prints() {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut rows = Vec::new();
        for i in 0..20 {
            rows.push(bar(base + chrono::Duration::days(i), 103.0, 97.0, 100.0));
        }
        for i in 20..26 {
            rows.push(bar(base + chrono::Duration::days(i), 100.6, 99.8, 100.5));
        }
        rows.push(bar(base + chrono::Duration::days(26), 99.0, 90.0, 91.0));
        let w = OhlcWindow::new(&rows);
        assert_eq!(evaluate(&w, &ProviderConfig::default()), None);
    }

    #[test]
    fn no_fire_when_recent_range_has_not_shrunk() {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let rows: Vec<OhlcBar> = (0..27)
            .map(|i| bar(base + chrono::Duration::days(i), 103.0, 97.0, 100.0))
            .collect();
        let w = OhlcWindow::new(&rows);
        assert_eq!(evaluate(&w, &ProviderConfig::default()), None);
    }
}
