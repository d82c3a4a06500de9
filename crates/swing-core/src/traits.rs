use crate::error::SwingError;
use crate::ohlc::OhlcBar;
use async_trait::async_trait;
use chrono::NaiveDate;

/// OHLC data source adapter — out of scope per spec §1, named here only as
/// the interface the core consumes. Mirrors the `BrokerClient` pattern of
/// naming an external collaborator as a trait (broker-trait crate) rather
/// than coupling the core to a concrete feed.
#[async_trait]
pub trait OhlcSource: Send + Sync {
    /// Loads an ascending-by-date OHLC series for `ticker` ending no later
    /// than `as_of`. Implementations decide how much history to return; the
    /// signal provider enforces the required-rows precondition itself.
    async fn load(&self, ticker: &str, as_of: NaiveDate) -> Result<Vec<OhlcBar>, SwingError>;
}
