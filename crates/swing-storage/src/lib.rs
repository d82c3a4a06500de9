//! Persistence for the five tables in spec §6.3, over `sqlx::AnyPool` in the
//! style of `backtest-engine/src/db.rs` and `risk-manager/src/manager.rs`:
//! the idempotent schema-ensure step, the `StateDaily`/`Transition`/
//! `SignalDaily` upserts, and the isolated-UPSERT write discipline for
//! `rc_ew_score_daily`'s three column groups.

pub mod ew_score_store;
pub mod run_store;
pub mod schema;
pub mod state_store;

pub use schema::{ensure_ew_score_dual_mode_columns, ensure_schema};
