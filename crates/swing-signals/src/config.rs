/// Provider configuration (spec §4.1, §6.5). Centralized default constants,
/// passed as an explicit immutable struct so no signal module reaches for an
/// environment variable or global (spec §9 design notes).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProviderConfig {
    pub sma_window: usize,
    pub momentum_lookback: usize,
    pub atr_window: usize,
    pub stabilization_days: usize,
    pub entry_sma_window: usize,
    pub invalidation_lookback: usize,
    pub dow_window: usize,
    pub safety_margin_rows: usize,
    /// When set, the provider emits `DATA_INSUFFICIENT` unless the latest
    /// row's date equals the as-of date.
    pub require_row_on_date: bool,
}

/// Constants behind `TREND_STARTED` / `TREND_MATURED` (spec §4.1). Not part
/// of `ProviderConfig` because they are fixed by the rule definition itself,
/// not tunable provider behavior — mirroring how the teacher keeps indicator
/// periods (`rsi(&closes, 14)`) as call-site literals rather than config.
pub const SMA_LEN: usize = 20;
pub const SLOPE_LOOKBACK: usize = 5;
pub const REGIME_WINDOW: usize = 30;
pub const ABOVE_RATIO_MIN: f64 = 0.70;
pub const BREAK_LOW_WINDOW: usize = 10;
pub const DEBOUNCE_DAYS: usize = 5;
/// Offsets scanned by `VOLATILITY_COMPRESSION_DETECTED`'s `atr_pct` array
/// (spec §4.1: `0..19`, i.e. 20 offsets).
pub const VOL_COMPRESSION_ATR_PCT_OFFSETS: usize = 20;

pub const EPS_PCT: f64 = 0.0001;
pub const SWEEP_EPS: f64 = 0.003;

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            sma_window: 20,
            momentum_lookback: 1,
            atr_window: 14,
            stabilization_days: 5,
            entry_sma_window: 5,
            invalidation_lookback: 10,
            dow_window: 3,
            safety_margin_rows: 2,
            require_row_on_date: true,
        }
    }
}

impl ProviderConfig {
    /// The minimum number of OHLC rows needed before the provider will
    /// attempt to evaluate any signal (spec §4.1).
    pub fn required_rows(&self) -> usize {
        let candidates = [
            self.sma_window + self.momentum_lookback,
            self.sma_window + 5,
            self.atr_window + 1,
            self.stabilization_days.saturating_add(1).max(self.entry_sma_window),
            self.invalidation_lookback + 1,
            2 * self.dow_window + 1,
            SMA_LEN + REGIME_WINDOW - 1,
            SMA_LEN + SLOPE_LOOKBACK,
            BREAK_LOW_WINDOW + 1,
            (VOL_COMPRESSION_ATR_PCT_OFFSETS - 1) + self.atr_window + 1,
        ];
        candidates.into_iter().max().unwrap() + self.safety_margin_rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_required_rows_matches_spec_worked_example() {
        let cfg = ProviderConfig::default();
        assert_eq!(cfg.required_rows(), 51);
    }
}
