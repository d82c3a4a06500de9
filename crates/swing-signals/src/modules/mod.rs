//! Individual signal-detection modules. Each evaluates independently off
//! the as-of `OhlcWindow` (and, where noted, the Dow-structure facts) and
//! returns at most one `SignalKey` — the provider owns assembling these
//! into a `SignalSet` (spec §4.1, §9).

pub mod entry_setup_valid;
pub mod invalidated;
pub mod ma20_reclaim;
pub mod selling_pressure_eased;
pub mod sharp_selloff;
pub mod slow_drift;
pub mod stabilization_confirmed;
pub mod structural_downtrend;
pub mod trend_matured;
pub mod trend_started;
pub mod volatility_compression;
