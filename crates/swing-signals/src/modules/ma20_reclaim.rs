use swing_core::{OhlcWindow, SignalKey};

use crate::config::{ProviderConfig, SMA_LEN};
use crate::util::mean;

/// Price crosses from at-or-below SMA20 yesterday to above it today
/// (spec §4.1).
pub fn evaluate(window: &OhlcWindow, _cfg: &ProviderConfig) -> Option<SignalKey> {
    let sma_today = mean(&window.closes(SMA_LEN)?);
    let sma_yesterday = mean(&window.from_offset(1).closes(SMA_LEN)?);
    let price_today = window.close(0)?;
    let price_yesterday = window.close(1)?;

    if price_yesterday <= sma_yesterday && price_today > sma_today {
        Some(SignalKey::Ma20Reclaimed)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use swing_core::OhlcBar;

    fn bars(closes: &[f64]) -> Vec<OhlcBar> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| OhlcBar {
                date: base + chrono::Duration::days(i as i64),
                open: c,
                high: c + 0.2,
                low: c - 0.2,
                close: c,
            })
            .collect()
    }

    #[test]
    fn fires_on_crossover_above_sma20() {
        let mut closes = vec![100.0; 20];
        closes.push(98.0);
        closes.push(108.0);
        let rows = bars(&closes);
        let w = OhlcWindow::new(&rows);
        assert_eq!(
            evaluate(&w, &ProviderConfig::default()),
            Some(SignalKey::Ma20Reclaimed)
        );
    }

    #[test]
    fn no_fire_when_already_above() {
        let rows = bars(&vec![101.0; 22]);
        let w = OhlcWindow::new(&rows);
        assert_eq!(evaluate(&w, &ProviderConfig::default()), None);
    }
}
