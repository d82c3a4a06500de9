use swing_core::{OhlcWindow, SignalKey};

use crate::config::ProviderConfig;
use crate::util::pct_change;

/// ATR-relative break: today's 1-day or 3-day return is a large multiple of
/// today's own volatility-as-a-fraction-of-price, rather than a fixed
/// percentage (spec §4.1).
pub fn evaluate(window: &OhlcWindow, cfg: &ProviderConfig) -> Option<SignalKey> {
    let price = window.close(0)?;
    if price <= 0.0 {
        return None;
    }
    let atr = window.atr(cfg.atr_window)?;
    let atr_pct = atr / price;

    let ret1 = pct_change(window.close(1)?, price);
    if ret1 <= -2.5 * atr_pct {
        return Some(SignalKey::SharpSellOffDetected);
    }

    let ret3 = pct_change(window.close(3)?, price);
    if ret3 <= -3.5 * atr_pct {
        return Some(SignalKey::SharpSellOffDetected);
    }

    None
}
