use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// `trustgate.toml` schema v1.
///
/// This is a *user-facing* config model: every field is optional and unknown keys are
/// tolerated so newer config files still load.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrustConfigV1 {
    /// Optional schema string for tooling (`trustgate.config.v1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(default)]
    pub policy: PolicySection,

    #[serde(default)]
    pub evidence: EvidenceSection,

    #[serde(default)]
    pub waivers: WaiversSection,

    #[serde(default)]
    pub attestation: AttestationSection,

    #[serde(default)]
    pub state: StateSection,

    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PolicySection {
    /// `enforce` (default) or `warn`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    /// Profile name (`lenient`, or a file under `.trustgate/profiles/`) or a path to a YAML file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EvidenceSection {
    /// SBOM location relative to the project root. Default `sbom.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sbom: Option<String>,

    /// Rule-evaluator output (JSON array of violations). Default `violations.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub violations: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WaiversSection {
    /// Default `.trustgate/waivers.yaml`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AttestationSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_count: Option<u32>,

    /// Any of `local`, `remote`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_digest_match: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_valid_schema: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_results_hash_match: Option<bool>,

    /// `enforce` (default) or `warn`; `warn` makes an unmet threshold advisory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    /// Key IDs (`ed25519:...`) allowed to sign attestations.
    #[serde(default)]
    pub trusted_keys: Vec<String>,

    /// Default `.trustgate/attestations`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_dir: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_timeout_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_retries: Option<u32>,

    /// Signing key file used by `attest` when no environment channel is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_key: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StateSection {
    /// Default `.trustgate/state/last-decision.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OutputSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<bool>,
}
