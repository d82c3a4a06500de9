use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `downtrend_origin`: set on the `NO_TRADE → DOWNTREND_EARLY` transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DowntrendOrigin {
    Trend,
    Slow,
}

/// `downtrend_entry_type`: written once, never overwritten (spec §4.4, §8.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DowntrendEntryType {
    SlowStructural,
    SlowSoft,
    TrendStructural,
    TrendSoft,
    Unknown,
}

/// `decline_profile`: monotone within a downtrend phase (spec §8.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeclineProfile {
    SlowDrift,
    SharpSellOff,
    StructuralDowntrend,
    Unknown,
}

impl DeclineProfile {
    /// `UNKNOWN → specific` is an upgrade; `specific → specific` only if
    /// identical; `specific → UNKNOWN` is forbidden (enforced by the caller,
    /// this just answers whether `next` is a legal successor to `self`).
    pub fn allows_transition_to(self, next: DeclineProfile) -> bool {
        match (self, next) {
            (DeclineProfile::Unknown, _) => true,
            (a, b) => a == b,
        }
    }
}

/// `stabilization_phase` (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StabilizationPhase {
    EarlyReversal,
    BaseBuilding,
    EarlyStabilization,
}

/// `entry_gate` values assigned by the v3 gate override (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryGate {
    #[serde(rename = "EARLY_STAB_MA20_HL")]
    EarlyStabMa20Hl,
    #[serde(rename = "EARLY_STAB_MA20")]
    EarlyStabMa20,
    #[serde(rename = "LEGACY_ENTRY_SETUP_VALID")]
    LegacyEntrySetupValid,
}

impl EntryGate {
    pub fn entry_quality(self) -> &'static str {
        match self {
            EntryGate::EarlyStabMa20Hl => "A",
            EntryGate::EarlyStabMa20 => "B",
            EntryGate::LegacyEntrySetupValid => "LEGACY",
        }
    }
}

/// `StateAttrs.status` — the merged metadata mapping for one `(ticker, date)`
/// row (spec §3, §4.4). Keys with no value are omitted on serialization; if
/// the resulting mapping is empty the attrs field is null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateAttrs {
    pub downtrend_origin: Option<DowntrendOrigin>,
    pub downtrend_entry_type: Option<DowntrendEntryType>,
    pub decline_profile: Option<DeclineProfile>,
    pub stabilization_phase: Option<StabilizationPhase>,
    pub entry_gate: Option<EntryGate>,
    pub entry_quality: Option<String>,
    pub entry_continuation_confirmed: Option<bool>,
}

impl StateAttrs {
    /// Serializes the closed key set, sorted lexicographically, to stabilize
    /// row bytes for idempotence tests (spec §9). Returns `None` (→ SQL
    /// `NULL`) when every key is absent.
    pub fn to_json(&self) -> Option<Value> {
        let mut map = serde_json::Map::new();
        if let Some(v) = &self.downtrend_entry_type {
            map.insert(
                "downtrend_entry_type".to_string(),
                serde_json::to_value(v).unwrap(),
            );
        }
        if let Some(v) = &self.downtrend_origin {
            map.insert(
                "downtrend_origin".to_string(),
                serde_json::to_value(v).unwrap(),
            );
        }
        if let Some(v) = &self.decline_profile {
            map.insert(
                "decline_profile".to_string(),
                serde_json::to_value(v).unwrap(),
            );
        }
        if let Some(v) = self.entry_continuation_confirmed {
            map.insert("entry_continuation_confirmed".to_string(), Value::Bool(v));
        }
        if let Some(v) = &self.entry_gate {
            map.insert("entry_gate".to_string(), serde_json::to_value(v).unwrap());
        }
        if let Some(v) = &self.entry_quality {
            map.insert(
                "entry_quality".to_string(),
                Value::String(v.clone()),
            );
        }
        if let Some(v) = &self.stabilization_phase {
            map.insert(
                "stabilization_phase".to_string(),
                serde_json::to_value(v).unwrap(),
            );
        }
        if map.is_empty() {
            return None;
        }
        let sorted: serde_json::Map<String, Value> = {
            let mut keys: Vec<_> = map.keys().cloned().collect();
            keys.sort();
            keys.into_iter().map(|k| (k.clone(), map[&k].clone())).collect()
        };
        Some(Value::Object(sorted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_attrs_serialize_to_none() {
        assert_eq!(StateAttrs::default().to_json(), None);
    }

    #[test]
    fn keys_are_sorted_lexicographically() {
        let attrs = StateAttrs {
            stabilization_phase: Some(StabilizationPhase::EarlyReversal),
            downtrend_origin: Some(DowntrendOrigin::Trend),
            ..Default::default()
        };
        let json = attrs.to_json().unwrap();
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn decline_profile_upgrade_allowed_downgrade_forbidden() {
        assert!(DeclineProfile::Unknown.allows_transition_to(DeclineProfile::SlowDrift));
        assert!(!DeclineProfile::SlowDrift.allows_transition_to(DeclineProfile::Unknown));
        assert!(DeclineProfile::SlowDrift.allows_transition_to(DeclineProfile::SlowDrift));
        assert!(!DeclineProfile::SlowDrift.allows_transition_to(DeclineProfile::SharpSellOff));
    }
}
