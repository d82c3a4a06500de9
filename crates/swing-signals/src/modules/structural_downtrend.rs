use swing_core::{OhlcWindow, SignalKey, SignalSet};

const PIVOT_LOOKBACK: usize = 30;

/// Primary path: Dow structure already flags a downtrend or a fresh lower
/// low. Fallback path (no clean Dow read yet): a lower-highs/lower-lows
/// structure found via a 1-step pivot scan over the last 30 closes (spec
/// §4.1).
pub fn evaluate(window: &OhlcWindow, dow: &SignalSet) -> Option<SignalKey> {
    if dow.contains(SignalKey::DowTrendDown) || dow.contains(SignalKey::DowNewLl) {
        return Some(SignalKey::StructuralDowntrendDetected);
    }

    // Scan over the last `PIVOT_LOOKBACK` closes, or fewer if the window is
    // shorter — a 1-step pivot still needs only 3 rows to register.
    let count = window.len().min(PIVOT_LOOKBACK);
    if count < 3 {
        return None;
    }
    let mut closes = window.closes(count)?;
    closes.reverse(); // chronological, oldest first

    let mut pivot_highs = Vec::new();
    let mut pivot_lows = Vec::new();
    for i in 1..closes.len() - 1 {
        if closes[i] > closes[i - 1] && closes[i] > closes[i + 1] {
            pivot_highs.push(closes[i]);
        }
        if closes[i] < closes[i - 1] && closes[i] < closes[i + 1] {
            pivot_lows.push(closes[i]);
        }
    }

    if pivot_highs.len() < 2 || pivot_lows.len() < 2 {
        return None;
    }
    let highs_descending = pivot_highs[pivot_highs.len() - 2] > pivot_highs[pivot_highs.len() - 1];
    let lows_descending = pivot_lows[pivot_lows.len() - 2] > pivot_lows[pivot_lows.len() - 1];

    if highs_descending && lows_descending {
        Some(SignalKey::StructuralDowntrendDetected)
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
    fn fallback_fires_on_descending_pivot_highs_and_lows() {
        // Chronological zig-zag with each successive swing lower than the last.
        let chron = vec![
            100.0, 95.0, 99.0, 90.0, 94.0, 85.0, 89.0, 80.0, 84.0, 76.0, 79.0, 72.0, 75.0, 70.0,
        ];
        let rows = bars(&chron);
        let w = OhlcWindow::new(&rows);
        let dow = SignalSet::new();
        assert_eq!(
            evaluate(&w, &dow),
            Some(SignalKey::StructuralDowntrendDetected)
        );
    }

    #[test]
    fn dow_primary_path_overrides_fallback() {
        let rows = bars(&vec![100.0; 31]);
        let w = OhlcWindow::new(&rows);
        let mut dow = SignalSet::new();
        dow.insert(SignalKey::DowNewLl);
        assert_eq!(
            evaluate(&w, &dow),
            Some(SignalKey::StructuralDowntrendDetected)
        );
    }

    #[test]
    fn no_fire_on_flat_series_without_pivots() {
        let rows = bars(&vec![100.0; 31]);
        let w = OhlcWindow::new(&rows);
        let dow = SignalSet::new();
        assert_eq!(evaluate(&w, &dow), None);
    }
}
