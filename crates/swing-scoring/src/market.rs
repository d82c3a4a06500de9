use serde::{Deserialize, Serialize};

/// Market a ticker routes through for EW scoring (spec §4.5). Each market
/// has its own fastpass/rolling enablement and, where enabled, its own
/// locked rule id and threshold — never shared across markets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Market {
    Omxh,
    Omxs,
    Usa,
}

impl Market {
    pub fn rolling_enabled(self) -> bool {
        matches!(self, Market::Omxh | Market::Omxs)
    }

    pub fn fastpass_enabled(self) -> bool {
        true
    }

    pub fn rolling_rule_id(self) -> Option<&'static str> {
        match self {
            Market::Omxh => Some("EW_SCORE_ROLLING_V2_FIN"),
            Market::Omxs => Some("EW_SCORE_ROLLING_V2_SE"),
            Market::Usa => None,
        }
    }

    pub fn fastpass_rule_id(self) -> &'static str {
        match self {
            Market::Omxh => "EW_SCORE_FASTPASS_V1_FIN",
            Market::Omxs => "EW_SCORE_FASTPASS_V1_SE",
            Market::Usa => "EW_SCORE_FASTPASS_V1_USA_SMALL",
        }
    }

    pub fn fastpass_threshold(self) -> f64 {
        match self {
            Market::Omxh => 0.60,
            Market::Omxs => 0.65,
            Market::Usa => 0.60,
        }
    }

    pub fn rolling_threshold(self) -> Option<f64> {
        match self {
            Market::Omxh => Some(0.45),
            Market::Omxs => Some(0.47),
            Market::Usa => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usa_has_no_rolling_rule() {
        assert!(!Market::Usa.rolling_enabled());
        assert_eq!(Market::Usa.rolling_rule_id(), None);
        assert_eq!(Market::Usa.rolling_threshold(), None);
    }

    #[test]
    fn fin_and_se_both_roll() {
        assert!(Market::Omxh.rolling_enabled());
        assert!(Market::Omxs.rolling_enabled());
        assert_eq!(Market::Omxh.rolling_rule_id(), Some("EW_SCORE_ROLLING_V2_FIN"));
        assert_eq!(Market::Omxs.rolling_rule_id(), Some("EW_SCORE_ROLLING_V2_SE"));
    }

    #[test]
    fn every_market_has_fastpass() {
        for m in [Market::Omxh, Market::Omxs, Market::Usa] {
            assert!(m.fastpass_enabled());
            assert!(!m.fastpass_rule_id().is_empty());
        }
    }
}
