use swing_core::{OhlcWindow, SignalKey};

use crate::config::ProviderConfig;
use crate::util::min;

/// A decisive break below the prior `invalidation_lookback`-day floor,
/// compared on the low rather than the close — the stabilization or entry
/// thesis no longer holds (spec §4.1).
pub fn evaluate(window: &OhlcWindow, cfg: &ProviderConfig) -> Option<SignalKey> {
    let lows = window.lows(cfg.invalidation_lookback + 1)?;
    let prior_floor = min(&lows[1..]);

    if lows[0] < prior_floor {
        Some(SignalKey::Invalidated)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use swing_core::OhlcBar;

    fn bars(lows: &[f64]) -> Vec<OhlcBar> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        lows.iter()
            .enumerate()
            .map(|(i, &l)| OhlcBar {
                date: base + chrono::Duration::days(i as i64),
                open: l + 0.3,
                high: l + 0.6,
                low: l,
                close: l + 0.3,
            })
            .collect()
    }

    #[test]
    fn fires_on_fresh_break_below_the_floor() {
        let mut lows = vec![100.0; 10];
        lows.push(90.0);
        let rows = bars(&lows);
        let w = OhlcWindow::new(&rows);
        assert_eq!(
            evaluate(&w, &ProviderConfig::default()),
            Some(SignalKey::Invalidated)
        );
    }

    #[test]
    fn no_fire_while_holding_the_floor() {
        let rows = bars(&vec![100.0; 11]);
        let w = OhlcWindow::new(&rows);
        assert_eq!(evaluate(&w, &ProviderConfig::default()), None);
    }

    #[test]
    fn no_fire_on_an_exact_tie_with_the_floor() {
        let mut lows = vec![100.0; 10];
        lows.push(100.0);
        let rows = bars(&lows);
        let w = OhlcWindow::new(&rows);
        assert_eq!(evaluate(&w, &ProviderConfig::default()), None);
    }
}
