//! Stable identifiers for gate-emitted rules and the gates themselves.
//!
//! Rule IDs are kebab-case and appear verbatim in `Violation::rule`. Raw
//! violations coming from the external evaluator carry their own rule IDs.

// Rules emitted by the gate itself
pub const RULE_SBOM_REQUIRED: &str = "sbom-required";
pub const RULE_ATTESTATION_REQUIRED: &str = "attestation-required-for-promotion";

// Pseudo-rule used by `explain` for expired-waiver findings (the finding
// itself is keyed by the waived rule ID).
pub const RULE_WAIVER_EXPIRED: &str = "waiver-expired";

// Tool-level
pub const RULE_TOOL_RUNTIME: &str = "tool-runtime";

// Gates, in evaluation order
pub const GATE_SBOM: &str = "sbom";
pub const GATE_WAIVER: &str = "waiver";
pub const GATE_POLICY: &str = "policy";
pub const GATE_ATTESTATION: &str = "attestation";
