use swing_core::{OhlcWindow, SignalKey};

use crate::config::ProviderConfig;
use crate::util::max;

const ATR_PCT_OFFSETS: usize = 20;

/// `atr_pct[o] = ATR14(ohlc[o:]) / close[o]` over offsets `0..20`: today's
/// volatility-as-a-fraction-of-price has compressed below both its 5-day-ago
/// and 10-day-ago readings, and sits at or below 75% of its own 20-day range
/// (spec §4.1).
pub fn evaluate(window: &OhlcWindow, cfg: &ProviderConfig) -> Option<SignalKey> {
    let mut atr_pct = Vec::with_capacity(ATR_PCT_OFFSETS);
    for offset in 0..ATR_PCT_OFFSETS {
        let sub = window.from_offset(offset);
        let atr = sub.atr(cfg.atr_window)?;
        let close = sub.close(0)?;
        if close <= 0.0 {
            return None;
        }
        atr_pct.push(atr / close);
    }

    let today = atr_pct[0];
    let compressed_vs_5 = today < atr_pct[5];
    let compressed_vs_10 = today < atr_pct[10];
    let compressed_vs_range = today <= 0.75 * max(&atr_pct);

    if compressed_vs_5 && compressed_vs_10 && compressed_vs_range {
        Some(SignalKey::VolatilityCompressionDetected)
    } else {
        None
    }
}
