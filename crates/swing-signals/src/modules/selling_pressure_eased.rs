use swing_core::{OhlcWindow, SignalKey};

use crate::config::ProviderConfig;
use crate::util::pct_change;

/// Rate-of-change deceleration on the downside: a deep 20-day decline whose
/// most recent 10 days have slowed to well under half the prior pace.
pub fn evaluate(window: &OhlcWindow, _cfg: &ProviderConfig) -> Option<SignalKey> {
    let price = window.close(0)?;
    let roc20 = pct_change(window.close(20)?, price) * 100.0;
    let roc10 = pct_change(window.close(10)?, price) * 100.0;

    if roc20 < -10.0 && roc10 > roc20 * 0.4 {
        Some(SignalKey::SellingPressureEased)
    } else {
        None
    }
}
