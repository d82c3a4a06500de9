use chrono::NaiveDate;
use tracing::debug;

use swing_core::{OhlcBar, OhlcWindow, SignalKey, SignalSet};

use crate::config::ProviderConfig;
use crate::dow::analyze_dow;
use crate::modules;

/// Assembles the full `SignalSet` for one `(ticker, date)` evaluation.
/// Owns no state across calls — every evaluation re-derives everything
/// from the OHLC series handed to it (spec §4.1, §9).
#[derive(Debug, Clone)]
pub struct SignalProvider {
    config: ProviderConfig,
}

impl SignalProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }

    /// `bars` must be sorted ascending by date. Returns a `SignalSet`
    /// containing only `DATA_INSUFFICIENT` when `as_of` has no matching row
    /// (and `config.require_row_on_date`) or fewer than `required_rows()`
    /// rows are available up to and including it.
    pub fn evaluate(&self, bars: &[OhlcBar], as_of: NaiveDate) -> SignalSet {
        let mut set = SignalSet::new();

        let as_of_index = bars.iter().rposition(|b| b.date == as_of);
        let slice_end = match as_of_index {
            Some(i) => i + 1,
            None => {
                if self.config.require_row_on_date {
                    debug!(%as_of, "no OHLC row on as-of date");
                    set.insert(SignalKey::DataInsufficient);
                    return set;
                }
                bars.iter().position(|b| b.date > as_of).unwrap_or(bars.len())
            }
        };

        let sliced = &bars[..slice_end];
        if sliced.len() < self.config.required_rows() {
            debug!(
                rows = sliced.len(),
                required = self.config.required_rows(),
                "insufficient OHLC history"
            );
            set.insert(SignalKey::DataInsufficient);
            return set;
        }

        let window = OhlcWindow::new(sliced);
        let dow_facts = analyze_dow(&window, self.config.dow_window);

        for key in dow_facts.iter() {
            set.insert(*key);
        }

        if let Some(key) = modules::slow_drift::evaluate(&window, &self.config) {
            set.insert(key);
            set.insert(SignalKey::SlowDeclineStarted);
        }
        if let Some(key) = modules::sharp_selloff::evaluate(&window, &self.config) {
            set.insert(key);
        }
        if let Some(key) = modules::volatility_compression::evaluate(&window, &self.config) {
            set.insert(key);
        }
        if let Some(key) = modules::ma20_reclaim::evaluate(&window, &self.config) {
            set.insert(key);
        }
        if let Some(key) = modules::structural_downtrend::evaluate(&window, &dow_facts) {
            set.insert(key);
        }
        if let Some(key) = modules::trend_started::evaluate(&window, &self.config, &dow_facts) {
            set.insert(key);
        }
        if let Some(key) = modules::trend_matured::evaluate(&window, &self.config, &dow_facts) {
            set.insert(key);
        }
        if let Some(key) = modules::selling_pressure_eased::evaluate(&window, &self.config) {
            set.insert(key);
        }
        if let Some(key) = modules::stabilization_confirmed::evaluate(&window, &self.config) {
            set.insert(key);
        }
        if let Some(key) = modules::entry_setup_valid::evaluate(&window, &self.config) {
            set.insert(key);
        }
        if let Some(key) = modules::invalidated::evaluate(&window, &self.config) {
            set.insert(key);
        }

        if dow_facts.contains(SignalKey::DowLastLowHl) {
            set.insert(SignalKey::HigherLowConfirmed);
        }
        if dow_facts.contains(SignalKey::DowBosBreakUp) {
            set.insert(SignalKey::StructureBreakoutUpConfirmed);
        }

        set.enforce_invalidation_invariant();
        set.finalize_no_signal();
        set
    }
}
