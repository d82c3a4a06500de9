use swing_core::{OhlcWindow, SignalKey};

use crate::config::ProviderConfig;
use crate::util::mean;

/// Monotone step-down at offsets 10/5/2/0, a modest cumulative decline, and
/// both the 5- and 10-day MAs confirming the drift (spec §4.1).
pub fn evaluate(window: &OhlcWindow, _cfg: &ProviderConfig) -> Option<SignalKey> {
    let closes = window.closes(11)?;
    let c0 = closes[0];
    let c2 = closes[2];
    let c5 = closes[5];
    let c10 = closes[10];

    let monotone = c10 > c5 && c5 > c2 && c2 > c0;
    if !monotone {
        return None;
    }

    if c10 == 0.0 || c0 / c10 - 1.0 > -0.03 {
        return None;
    }

    let ma5 = mean(&closes[0..5]);
    let ma10 = mean(&closes[0..10]);

    if ma5 < ma10 && c0 < ma10 {
        Some(SignalKey::SlowDriftDetected)
    } else {
        None
    }
}
