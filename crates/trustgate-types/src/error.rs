//! Gate error taxonomy.
//!
//! Every variant names the rule(s) or gate that caused it so a failure is never an opaque denial.

use crate::ids;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    /// Required evidence (the SBOM) is missing.
    #[error("evidence unavailable: {detail} (rule `{rule}`)")]
    EvidenceUnavailable { rule: String, detail: String },

    /// One or more waivers relied upon by this run have expired.
    #[error("expired waiver for rule(s): {}", .rules.join(", "))]
    WaiverExpired { rules: Vec<String> },

    /// Resolved blocking findings from the policy gate.
    #[error("blocking policy violation(s): {}", .rules.join(", "))]
    PolicyViolation { rules: Vec<String> },

    /// Promotion requested but not enough valid attestations were found.
    #[error("attestation threshold unmet: {valid} valid of {required} required (rule `{rule}`)")]
    AttestationThresholdUnmet {
        rule: String,
        required: u32,
        valid: u32,
    },

    #[error("signing key resolution failed: {0}")]
    KeyResolution(String),

    /// Unknown profile field, bad schema version, or otherwise invalid profile. Fails closed.
    #[error("profile schema error: {0}")]
    ProfileSchema(String),

    /// Never fatal to a decision; surfaced to logs only.
    #[error("decision state persistence failed: {0}")]
    StatePersist(String),
}

impl GateError {
    /// Name of the gate (or subsystem) that produced this error.
    pub fn gate(&self) -> &'static str {
        match self {
            GateError::EvidenceUnavailable { .. } => ids::GATE_SBOM,
            GateError::WaiverExpired { .. } => ids::GATE_WAIVER,
            GateError::PolicyViolation { .. } => ids::GATE_POLICY,
            GateError::AttestationThresholdUnmet { .. } => ids::GATE_ATTESTATION,
            GateError::KeyResolution(_) => "keys",
            GateError::ProfileSchema(_) => "profile",
            GateError::StatePersist(_) => "state",
        }
    }

    /// Rules responsible for the error, if it is a gate rejection.
    pub fn rules(&self) -> Vec<String> {
        match self {
            GateError::EvidenceUnavailable { rule, .. } => vec![rule.clone()],
            GateError::WaiverExpired { rules } | GateError::PolicyViolation { rules } => {
                rules.clone()
            }
            GateError::AttestationThresholdUnmet { rule, .. } => vec![rule.clone()],
            GateError::KeyResolution(_)
            | GateError::ProfileSchema(_)
            | GateError::StatePersist(_) => Vec::new(),
        }
    }
}
