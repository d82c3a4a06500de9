use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One OHLC row. Prices are assumed finite and positive — callers constructing
/// a series from an external feed are responsible for filtering out rows that
/// violate that (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OhlcBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Read-only, windowed view over an ascending-by-date OHLC series. Offset `0`
/// is the latest (as-of) row, offset `1` the previous, and so on — matching
/// the offset convention used throughout spec §4.1.
#[derive(Debug, Clone, Copy)]
pub struct OhlcWindow<'a> {
    bars: &'a [OhlcBar],
}

impl<'a> OhlcWindow<'a> {
    pub fn new(bars: &'a [OhlcBar]) -> Self {
        Self { bars }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    fn index_of(&self, offset: usize) -> Option<usize> {
        let n = self.bars.len();
        if offset >= n {
            None
        } else {
            Some(n - 1 - offset)
        }
    }

    pub fn bar(&self, offset: usize) -> Option<&'a OhlcBar> {
        self.index_of(offset).map(|i| &self.bars[i])
    }

    pub fn date(&self, offset: usize) -> Option<NaiveDate> {
        self.bar(offset).map(|b| b.date)
    }

    pub fn close(&self, offset: usize) -> Option<f64> {
        self.bar(offset).map(|b| b.close)
    }

    pub fn open(&self, offset: usize) -> Option<f64> {
        self.bar(offset).map(|b| b.open)
    }

    pub fn high(&self, offset: usize) -> Option<f64> {
        self.bar(offset).map(|b| b.high)
    }

    pub fn low(&self, offset: usize) -> Option<f64> {
        self.bar(offset).map(|b| b.low)
    }

    /// `count` closes, offset-indexed ascending (`vec[k]` = close at offset
    /// `k`). `None` if fewer than `count` rows are available.
    pub fn closes(&self, count: usize) -> Option<Vec<f64>> {
        if self.bars.len() < count {
            return None;
        }
        Some((0..count).map(|o| self.close(o).unwrap()).collect())
    }

    pub fn highs(&self, count: usize) -> Option<Vec<f64>> {
        if self.bars.len() < count {
            return None;
        }
        Some((0..count).map(|o| self.high(o).unwrap()).collect())
    }

    pub fn lows(&self, count: usize) -> Option<Vec<f64>> {
        if self.bars.len() < count {
            return None;
        }
        Some((0..count).map(|o| self.low(o).unwrap()).collect())
    }

    /// Sub-window that drops the most recent `offset` rows, i.e. `ohlc[offset:]`
    /// in the spec's slicing notation: the new offset-0 row is this window's
    /// row at `offset`.
    pub fn from_offset(&self, offset: usize) -> OhlcWindow<'a> {
        let end = self.bars.len().saturating_sub(offset);
        OhlcWindow {
            bars: &self.bars[..end],
        }
    }

    /// True range at `offset` (requires `offset+1` rows, i.e. a previous close).
    fn true_range(&self, offset: usize) -> Option<f64> {
        let bar = self.bar(offset)?;
        let prev_close = self.close(offset + 1)?;
        Some(
            (bar.high - bar.low)
                .max((bar.high - prev_close).abs())
                .max((bar.low - prev_close).abs()),
        )
    }

    /// Average True Range over `period` days ending at offset 0. Requires at
    /// least `period + 1` rows (spec §4.1).
    pub fn atr(&self, period: usize) -> Option<f64> {
        if period == 0 || self.bars.len() < period + 1 {
            return None;
        }
        let sum: f64 = (0..period).map(|o| self.true_range(o)).collect::<Option<Vec<_>>>()?.iter().sum();
        Some(sum / period as f64)
    }
}
