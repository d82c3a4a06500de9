use swing_core::{OhlcWindow, SignalKey};

use crate::config::{ProviderConfig, SMA_LEN};
use crate::util::{max, mean, min};

const BASE_WINDOW: usize = 10;
const BASE_RANGE_MAX_PCT: f64 = 0.06;
const LOW_DRIFT_EPS: f64 = 0.003;
const RECLAIM_CLOSE_POSITION_MIN: f64 = 0.55;
const RECLAIM_INVALIDATION_WINDOW: usize = 6;
const RISK_ATR_MULT_MAX: f64 = 2.5;
const RISK_NO_ATR_PCT_MAX: f64 = 0.06;
const SUPPORT_LOOKBACK: usize = 3;

/// `(close - low) / (high - low)` at `offset`, the fraction of the day's
/// range the close occupies (spec §4.1, shared with `STABILIZATION_CONFIRMED`'s
/// upper-close ratio).
fn close_position(window: &OhlcWindow, offset: usize) -> Option<f64> {
    let bar = window.bar(offset)?;
    let range = bar.high - bar.low;
    if range <= 0.0 {
        return None;
    }
    Some((bar.close - bar.low) / range)
}

/// Two independent setups, each producing its own `invalidation` level; then
/// a shared `entry > invalidation` test, a risk-per-share check against ATR
/// (or a flat percentage when ATR is unavailable), and a support check that
/// the last few closes haven't already broken the level (spec §4.1).
pub fn evaluate(window: &OhlcWindow, cfg: &ProviderConfig) -> Option<SignalKey> {
    let invalidation = base_range_invalidation(window)
        .or_else(|| reclaim_ma20_invalidation(window))?;

    let entry = window.close(0)?;
    if entry <= invalidation {
        return None;
    }

    let risk_per_share = entry - invalidation;
    let risk_ok = match window.atr(cfg.atr_window) {
        Some(atr) if atr > 0.0 => risk_per_share / atr <= RISK_ATR_MULT_MAX,
        _ => entry > 0.0 && risk_per_share / entry <= RISK_NO_ATR_PCT_MAX,
    };
    if !risk_ok {
        return None;
    }

    let support_floor = invalidation * (1.0 - LOW_DRIFT_EPS);
    let support_ok = (0..SUPPORT_LOOKBACK).all(|o| window.close(o).map(|c| c >= support_floor).unwrap_or(false));
    if !support_ok {
        return None;
    }

    Some(SignalKey::EntrySetupValid)
}

/// (a) base-range path: a tight 10-day range (≤6% of price) whose lows
/// aren't still drifting down — the most recent half's low isn't more than
/// `LOW_DRIFT_EPS` below the older half's low. Invalidation is the window
/// low.
///
/// `min_first`/`min_second` are not spelled out further in the spec beyond
/// "low-drift bound"; read here as the two halves of the 10-day base window
/// (older 5 days vs. most recent 5 days) — documented as a grounding
/// decision in DESIGN.md.
fn base_range_invalidation(window: &OhlcWindow) -> Option<f64> {
    let highs = window.highs(BASE_WINDOW)?;
    let lows = window.lows(BASE_WINDOW)?;
    let close0 = window.close(0)?;
    if close0 <= 0.0 {
        return None;
    }

    let base_high = max(&highs);
    let base_low = min(&lows);
    if (base_high - base_low) / close0 > BASE_RANGE_MAX_PCT {
        return None;
    }

    let min_second = min(&lows[0..5]);
    let min_first = min(&lows[5..10]);
    if min_second < min_first * (1.0 - LOW_DRIFT_EPS) {
        return None;
    }

    Some(base_low)
}

/// (b) reclaim-MA20 path: yesterday at-or-below SMA20, today above it, with
/// today's close sitting in the upper part of its range. Invalidation is the
/// low of the last 6 days.
fn reclaim_ma20_invalidation(window: &OhlcWindow) -> Option<f64> {
    let sma_today = mean(&window.closes(SMA_LEN)?);
    let sma_yesterday = mean(&window.from_offset(1).closes(SMA_LEN)?);
    let close_today = window.close(0)?;
    let close_yesterday = window.close(1)?;

    if close_yesterday > sma_yesterday || close_today <= sma_today {
        return None;
    }
    if close_position(window, 0)? < RECLAIM_CLOSE_POSITION_MIN {
        return None;
    }

    let lows = window.lows(RECLAIM_INVALIDATION_WINDOW)?;
    Some(min(&lows))
}
