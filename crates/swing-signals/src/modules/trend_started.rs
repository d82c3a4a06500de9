use swing_core::{OhlcWindow, SignalKey, SignalSet};

use crate::config::{
    ProviderConfig, ABOVE_RATIO_MIN, BREAK_LOW_WINDOW, DEBOUNCE_DAYS, REGIME_WINDOW,
    SLOPE_LOOKBACK, SMA_LEN,
};
use crate::util::{mean, min};

/// Dow override: a trend stepping down from up-to-neutral while the last
/// pivot low is already a lower low is always a trend start. Otherwise a
/// regime read: most of the last `REGIME_WINDOW` days spent above a rising
/// SMA20, a fresh downward SMA cross, a clean debounce window, and a
/// breakdown below the last `BREAK_LOW_WINDOW` closes (spec §4.1).
pub fn evaluate(window: &OhlcWindow, _cfg: &ProviderConfig, dow: &SignalSet) -> Option<SignalKey> {
    if dow.contains(SignalKey::DowTrendChangeUpToNeutral) && dow.contains(SignalKey::DowLastLowLl) {
        return Some(SignalKey::TrendStarted);
    }

    let closes = window.closes(SMA_LEN + REGIME_WINDOW - 1)?;
    let sma20 = |offset: usize| mean(&closes[offset..offset + SMA_LEN]);

    let mut above_count = 0usize;
    for offset in 0..REGIME_WINDOW {
        if closes[offset] > sma20(offset) {
            above_count += 1;
        }
    }
    let ratio = above_count as f64 / REGIME_WINDOW as f64;
    let slope_positive = sma20(0) - sma20(SLOPE_LOOKBACK) > 0.0;

    let yest_close = closes[1];
    let yest_sma = sma20(1);
    let today_close = closes[0];
    let today_sma = sma20(0);
    let crossed_down = yest_close >= yest_sma && today_close < today_sma;

    let debounced = (1..=DEBOUNCE_DAYS).all(|offset| closes[offset] >= sma20(offset));

    let breakdown = today_close < min(&closes[1..BREAK_LOW_WINDOW]);

    if ratio >= ABOVE_RATIO_MIN && slope_positive && crossed_down && debounced && breakdown {
        Some(SignalKey::TrendStarted)
    } else {
        None
    }
}
