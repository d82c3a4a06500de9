use std::collections::BTreeMap;

/// Locked coefficients behind one fastpass rule id. A coefficient change
/// is a new rule id, never an in-place edit of these constants (spec §4.5,
/// §6.5 — "Rule immutability (LOCKED)").
pub struct FastpassModel {
    pub rule_id: &'static str,
    pub beta0: f64,
    /// Weight applied to `r_stab_to_entry_pct`.
    pub beta_stab_to_entry: f64,
    /// Weight per named categorical model input. Inputs absent from this
    /// table are still recorded in the audit JSON but contribute 0 to the
    /// raw score — new categorical features are additive, never silently
    /// reinterpreted.
    pub categorical_weights: &'static [(&'static str, f64)],
}

/// Locked coefficients behind one rolling rule id.
pub struct RollingModel {
    pub rule_id: &'static str,
    pub beta0: f64,
    pub beta1: f64,
}

pub const FASTPASS_FIN: FastpassModel = FastpassModel {
    rule_id: "EW_SCORE_FASTPASS_V1_FIN",
    beta0: -0.20,
    beta_stab_to_entry: 4.5,
    categorical_weights: &[
        ("gate_quality_a", 0.85),
        ("gate_quality_b", 0.35),
        ("gate_quality_legacy", 0.10),
        ("higher_low_confirmed", 0.40),
        ("volatility_compression", 0.25),
    ],
};

pub const FASTPASS_SE: FastpassModel = FastpassModel {
    rule_id: "EW_SCORE_FASTPASS_V1_SE",
    beta0: -0.25,
    beta_stab_to_entry: 4.2,
    categorical_weights: &[
        ("gate_quality_a", 0.80),
        ("gate_quality_b", 0.30),
        ("gate_quality_legacy", 0.05),
        ("higher_low_confirmed", 0.45),
        ("volatility_compression", 0.20),
    ],
};

pub const FASTPASS_USA_SMALL: FastpassModel = FastpassModel {
    rule_id: "EW_SCORE_FASTPASS_V1_USA_SMALL",
    beta0: -0.15,
    beta_stab_to_entry: 3.8,
    categorical_weights: &[
        ("gate_quality_a", 0.70),
        ("gate_quality_b", 0.25),
        ("gate_quality_legacy", 0.05),
        ("higher_low_confirmed", 0.30),
        ("volatility_compression", 0.15),
    ],
};

pub const ROLLING_FIN: RollingModel = RollingModel {
    rule_id: "EW_SCORE_ROLLING_V2_FIN",
    beta0: -0.10,
    beta1: 3.2,
};

pub const ROLLING_SE: RollingModel = RollingModel {
    rule_id: "EW_SCORE_ROLLING_V2_SE",
    beta0: -0.12,
    beta1: 3.0,
};

/// Logistic link from a raw linear score to the `[0, 1]` probability-like
/// score the router compares against a threshold.
pub fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl FastpassModel {
    /// Computes `beta0 + beta_stab_to_entry * r_stab_to_entry_pct +
    /// sum(weight[k] * categorical_inputs[k])`, then applies the logistic
    /// link. Categorical keys with no matching weight entry contribute 0.
    pub fn score(&self, r_stab_to_entry_pct: f64, categorical_inputs: &BTreeMap<String, f64>) -> (f64, f64) {
        let weights: BTreeMap<&str, f64> = self.categorical_weights.iter().copied().collect();
        let mut raw_z = self.beta0 + self.beta_stab_to_entry * r_stab_to_entry_pct;
        for (key, value) in categorical_inputs {
            if let Some(weight) = weights.get(key.as_str()) {
                raw_z += weight * value;
            }
        }
        (raw_z, sigmoid(raw_z))
    }
}

impl RollingModel {
    pub fn score(&self, r_prefix_pct: f64) -> (f64, f64) {
        let raw_z = self.beta0 + self.beta1 * r_prefix_pct;
        (raw_z, sigmoid(raw_z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_is_bounded_and_monotone() {
        assert!(sigmoid(-10.0) < sigmoid(0.0));
        assert!(sigmoid(0.0) < sigmoid(10.0));
        assert!(sigmoid(0.0) > 0.0 && sigmoid(0.0) < 1.0);
    }

    #[test]
    fn unknown_categorical_key_contributes_nothing() {
        let mut inputs = BTreeMap::new();
        inputs.insert("not_a_real_feature".to_string(), 1.0);
        let (raw_z, _) = FASTPASS_FIN.score(0.0, &inputs);
        assert_eq!(raw_z, FASTPASS_FIN.beta0);
    }

    #[test]
    fn known_categorical_key_shifts_raw_z() {
        let mut inputs = BTreeMap::new();
        inputs.insert("gate_quality_a".to_string(), 1.0);
        let (raw_z, _) = FASTPASS_FIN.score(0.0, &inputs);
        assert_eq!(raw_z, FASTPASS_FIN.beta0 + 0.85);
    }

    #[test]
    fn rolling_score_uses_beta1_on_prefix_return() {
        let (raw_z, _) = ROLLING_FIN.score(0.02);
        assert_eq!(raw_z, ROLLING_FIN.beta0 + ROLLING_FIN.beta1 * 0.02);
    }
}
