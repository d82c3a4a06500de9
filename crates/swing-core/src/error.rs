use thiserror::Error;

/// Closed error taxonomy for the evaluation pipeline (spec §7).
///
/// `StorageConflict` is deliberately not a variant here: conflicts on
/// `(ticker, date)` resolve via the write-discipline UPSERT (swing-storage)
/// and are never surfaced as failures.
#[derive(Error, Debug)]
pub enum SwingError {
    /// Surfaced in-band as the `DATA_INSUFFICIENT` signal; never fatal.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Fatal at orchestration entry — evaluation must not begin.
    #[error("incompatible versions: {0}")]
    IncompatibleVersions(String),

    /// Fatal during migration-ensure when the base table is absent.
    #[error("schema missing: {0}")]
    SchemaMissing(String),

    /// Bug class: allowed-transition violation or a state-attrs key outside
    /// the closed set. Must abort the evaluation, never silently degrade.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}
