use swing_core::SwingError;

/// The `v3` signal layer and `v3` policy layer were built together; mixing a
/// `v3` layer with a pre-`v3` one is a configuration error the orchestrator
/// must catch before touching storage (spec §6.4).
pub fn check_version_compatibility(signal_version: &str, policy_version: &str) -> Result<(), SwingError> {
    let signal_is_v3 = signal_version == "v3";
    let policy_is_v3 = policy_version == "v3";
    if signal_is_v3 == policy_is_v3 {
        Ok(())
    } else {
        Err(SwingError::IncompatibleVersions(
            "Incompatible versions: signal-version and policy-version must both be v3, or both non-v3."
                .to_string(),
        ))
    }
}
