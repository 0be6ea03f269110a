use std::collections::BTreeSet;
use trustgate_types::{AttestationSource, PolicyMode, Waiver};

/// A validated profile. Parsing and schema checks live in the settings crate.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub description: String,
    /// Rule names. Non-empty means every other rule is dropped.
    pub allow: Vec<String>,
    /// Rule names (exact) or severity tokens (case-insensitive).
    pub ignore: Vec<String>,
    pub warnings_show: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttestationRequirements {
    pub enabled: bool,
    pub min_count: u32,
    pub sources: BTreeSet<AttestationSource>,
    pub require_digest_match: bool,
    pub require_valid_schema: bool,
    pub require_results_hash_match: bool,
    /// `warn` makes an unmet threshold advisory.
    pub mode: PolicyMode,
    /// Key IDs allowed to sign. Empty accepts any self-consistent key.
    pub trusted_keys: Vec<String>,
}

impl Default for AttestationRequirements {
    fn default() -> Self {
        Self {
            enabled: true,
            min_count: 1,
            sources: BTreeSet::from([AttestationSource::Local]),
            require_digest_match: true,
            require_valid_schema: true,
            require_results_hash_match: true,
            mode: PolicyMode::Enforce,
            trusted_keys: Vec::new(),
        }
    }
}

impl AttestationRequirements {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Everything the orchestrator needs besides evidence.
#[derive(Clone, Debug, Default)]
pub struct GateConfig {
    pub profile: Option<Profile>,
    pub waivers: Vec<Waiver>,
    pub attestation: AttestationRequirements,
}
