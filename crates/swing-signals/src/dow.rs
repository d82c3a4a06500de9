//! Dow-structure analyzer: pivot sequence, trend label, BoS/reset markers
//! (spec §2, §4.1). Pivots are re-derived per evaluation — no cross-evaluation
//! state is cached (spec §9 design notes).

use swing_core::{OhlcWindow, SignalKey, SignalSet};

use crate::config::EPS_PCT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PivotKind {
    High,
    Low,
}

#[derive(Debug, Clone, Copy)]
struct Pivot {
    offset: usize,
    price: f64,
    kind: PivotKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trend {
    Up,
    Down,
    Neutral,
}

/// Symmetric `dow_window`-bar pivot scan. Iterates offsets ascending (recent
/// to old), so the first match of a kind is the most recent confirmed pivot
/// of that kind.
fn find_pivots(window: &OhlcWindow, dow_window: usize) -> Vec<Pivot> {
    let n = window.len();
    let mut pivots = Vec::new();
    if n < 2 * dow_window + 1 {
        return pivots;
    }
    for k in dow_window..=(n - 1 - dow_window) {
        let high_k = window.high(k).unwrap();
        let low_k = window.low(k).unwrap();
        let mut is_high = true;
        let mut is_low = true;
        for d in 1..=dow_window {
            let hl = window.high(k - d).unwrap();
            let hr = window.high(k + d).unwrap();
            if hl >= high_k || hr >= high_k {
                is_high = false;
            }
            let ll = window.low(k - d).unwrap();
            let lr = window.low(k + d).unwrap();
            if ll <= low_k || lr <= low_k {
                is_low = false;
            }
        }
        if is_high {
            pivots.push(Pivot {
                offset: k,
                price: high_k,
                kind: PivotKind::High,
            });
        }
        if is_low {
            pivots.push(Pivot {
                offset: k,
                price: low_k,
                kind: PivotKind::Low,
            });
        }
    }
    pivots
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LowLabel {
    L,
    Hl,
    Ll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HighLabel {
    H,
    Hh,
    Lh,
}

fn low_label(last: f64, prior: Option<f64>) -> LowLabel {
    match prior {
        None => LowLabel::L,
        Some(prior) => {
            let diff = (last - prior) / prior;
            if diff > EPS_PCT {
                LowLabel::Hl
            } else if diff < -EPS_PCT {
                LowLabel::Ll
            } else {
                LowLabel::L
            }
        }
    }
}

fn high_label(last: f64, prior: Option<f64>) -> HighLabel {
    match prior {
        None => HighLabel::H,
        Some(prior) => {
            let diff = (last - prior) / prior;
            if diff > EPS_PCT {
                HighLabel::Hh
            } else if diff < -EPS_PCT {
                HighLabel::Lh
            } else {
                HighLabel::H
            }
        }
    }
}

struct Structure {
    trend: Trend,
    low_label: Option<LowLabel>,
    high_label: Option<HighLabel>,
    last_low_price: Option<f64>,
    last_high_price: Option<f64>,
}

fn derive_structure(window: &OhlcWindow, dow_window: usize) -> Structure {
    let pivots = find_pivots(window, dow_window);
    let mut lows = pivots.iter().filter(|p| p.kind == PivotKind::Low);
    let mut highs = pivots.iter().filter(|p| p.kind == PivotKind::High);

    let last_low = lows.next();
    let prior_low = lows.next();
    let last_high = highs.next();
    let prior_high = highs.next();

    let low_label = last_low.map(|l| low_label(l.price, prior_low.map(|p| p.price)));
    let high_label = last_high.map(|h| high_label(h.price, prior_high.map(|p| p.price)));

    let trend = match (high_label, low_label) {
        (Some(HighLabel::Hh), Some(LowLabel::Hl)) => Trend::Up,
        (Some(HighLabel::Lh), Some(LowLabel::Ll)) => Trend::Down,
        _ => Trend::Neutral,
    };

    Structure {
        trend,
        low_label,
        high_label,
        last_low_price: last_low.map(|p| p.price),
        last_high_price: last_high.map(|p| p.price),
    }
}

fn trend_keys(trend: Trend) -> SignalKey {
    match trend {
        Trend::Up => SignalKey::DowTrendUp,
        Trend::Down => SignalKey::DowTrendDown,
        Trend::Neutral => SignalKey::DowTrendNeutral,
    }
}

/// Computes the full Dow-facts subset of `SignalKey` for the as-of window.
pub fn analyze_dow(window: &OhlcWindow, dow_window: usize) -> SignalSet {
    let mut set = SignalSet::new();
    let today = derive_structure(window, dow_window);

    set.insert(trend_keys(today.trend));

    match today.low_label {
        Some(LowLabel::L) => {
            set.insert(SignalKey::DowLastLowL);
        }
        Some(LowLabel::Hl) => {
            set.insert(SignalKey::DowLastLowHl);
        }
        Some(LowLabel::Ll) => {
            set.insert(SignalKey::DowLastLowLl);
            set.insert(SignalKey::DowNewLl);
        }
        None => {}
    }

    match today.high_label {
        Some(HighLabel::H) => {
            set.insert(SignalKey::DowLastHighH);
        }
        Some(HighLabel::Hh) => {
            set.insert(SignalKey::DowLastHighHh);
            set.insert(SignalKey::DowNewHh);
        }
        Some(HighLabel::Lh) => {
            set.insert(SignalKey::DowLastHighLh);
        }
        None => {}
    }

    // Trend-change markers: only meaningful once there's a prior day's window.
    if window.len() > 1 {
        let yesterday = derive_structure(&window.from_offset(1), dow_window);
        if yesterday.trend != today.trend {
            let change = match (yesterday.trend, today.trend) {
                (Trend::Up, Trend::Neutral) => Some(SignalKey::DowTrendChangeUpToNeutral),
                (Trend::Down, Trend::Neutral) => Some(SignalKey::DowTrendChangeDownToNeutral),
                (Trend::Neutral, Trend::Up) => Some(SignalKey::DowTrendChangeNeutralToUp),
                (Trend::Neutral, Trend::Down) => Some(SignalKey::DowTrendChangeNeutralToDown),
                _ => None,
            };
            if let Some(change) = change {
                set.insert(change);
            }
        }

        // Break-of-structure: price breaks the opposing-extreme pivot that
        // defined yesterday's established trend, resetting that trend.
        if let Some(close0) = window.close(0) {
            if yesterday.trend == Trend::Down {
                if let Some(last_high) = yesterday.last_high_price {
                    if close0 > last_high {
                        set.insert(SignalKey::DowBosBreakUp);
                        set.insert(SignalKey::DowReset);
                    }
                }
            } else if yesterday.trend == Trend::Up {
                if let Some(last_low) = yesterday.last_low_price {
                    if close0 < last_low {
                        set.insert(SignalKey::DowBosBreakDown);
                        set.insert(SignalKey::DowReset);
                    }
                }
            }
        }
    }

    set
}
