use std::collections::BTreeMap;

use serde::Deserialize;
use swing_scoring::Market;

/// Optional TOML config (the teacher's `backtest-engine`/`api-server` read
/// TOML-ish config the same way): ticker→market routing for EW scoring and
/// the data/db paths. Everything has a sensible default so the CLI runs
/// with no config file at all.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CliConfig {
    #[serde(default)]
    pub db_path: Option<String>,
    #[serde(default)]
    pub ohlc_dir: Option<String>,
    #[serde(default)]
    pub markets: BTreeMap<String, MarketName>,
    #[serde(default)]
    pub default_market: Option<MarketName>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketName {
    Omxh,
    Omxs,
    Usa,
}

impl From<MarketName> for Market {
    fn from(m: MarketName) -> Self {
        match m {
            MarketName::Omxh => Market::Omxh,
            MarketName::Omxs => Market::Omxs,
            MarketName::Usa => Market::Usa,
        }
    }
}

impl CliConfig {
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p)?;
                Ok(toml::from_str(&raw)?)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn to_scoring_config(&self) -> swing_engine::ScoringConfig {
        swing_engine::ScoringConfig {
            markets: self
                .markets
                .iter()
                .map(|(ticker, market)| (ticker.clone(), (*market).into()))
                .collect(),
            default_market: self.default_market.map(Into::into),
        }
    }
}
