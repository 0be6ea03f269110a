use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use time::OffsetDateTime;

/// Stable schema identifier for the persisted decision snapshot.
pub const SCHEMA_DECISION_SNAPSHOT_V1: &str = "trustgate.decision.v1";

/// Severity as reported by the rule evaluator.
///
/// Ordering is most severe first, which is also the display order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Informational,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Informational,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Informational => "informational",
        }
    }

    /// Case-insensitive parse of a severity token.
    pub fn parse(token: &str) -> Option<Severity> {
        let lowered = token.trim().to_ascii_lowercase();
        Severity::ALL.into_iter().find(|s| s.as_str() == lowered)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ViolationResult {
    Fail,
    Warn,
}

/// A single finding. Immutable once produced.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Violation {
    pub rule: String,
    pub severity: Severity,
    pub result: ViolationResult,
    pub message: String,
}

impl Violation {
    pub fn new(
        rule: impl Into<String>,
        severity: Severity,
        result: ViolationResult,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule: rule.into(),
            severity,
            result,
            message: message.into(),
        }
    }

    /// A critical, failing violation. Gate-emitted findings use this shape.
    pub fn critical(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(rule, Severity::Critical, ViolationResult::Fail, message)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DecisionStatus {
    Pass,
    Warn,
    Fail,
}

impl DecisionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DecisionStatus::Pass => "pass",
            DecisionStatus::Warn => "warn",
            DecisionStatus::Fail => "fail",
        }
    }
}

/// Whether a blocking condition aborts the pipeline (`enforce`) or is only reported (`warn`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PolicyMode {
    #[default]
    Enforce,
    Warn,
}

impl PolicyMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PolicyMode::Enforce => "enforce",
            PolicyMode::Warn => "warn",
        }
    }

    pub fn parse(v: &str) -> Option<PolicyMode> {
        match v {
            "enforce" => Some(PolicyMode::Enforce),
            "warn" => Some(PolicyMode::Warn),
            _ => None,
        }
    }
}

fn empty_object() -> JsonValue {
    JsonValue::Object(Default::default())
}

/// The outcome of one verification call.
///
/// `violations` holds blocking findings only; `warnings` holds findings that were
/// demoted (profile ignore, active waiver, advisory attestation shortfall).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub status: DecisionStatus,
    pub allow: bool,
    pub sbom_present: bool,
    pub violations: Vec<Violation>,
    pub warnings: Vec<Violation>,
    #[serde(default)]
    pub attestations_considered: Vec<String>,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,

    /// Gate input summary. Older snapshots omit it; readers get an empty object.
    #[serde(default = "empty_object")]
    pub input: JsonValue,
}

impl Decision {
    /// An empty passing decision, the starting point of every pipeline run.
    pub fn begin(timestamp: OffsetDateTime) -> Self {
        Self {
            status: DecisionStatus::Pass,
            allow: true,
            sbom_present: false,
            violations: Vec::new(),
            warnings: Vec::new(),
            attestations_considered: Vec::new(),
            timestamp,
            input: empty_object(),
        }
    }

    /// Rules of all blocking findings, in emission order, deduplicated.
    pub fn blocking_rules(&self) -> Vec<String> {
        rule_ids(&self.violations)
    }
}

/// Rule IDs of `findings` in order of first appearance.
pub fn rule_ids(findings: &[Violation]) -> Vec<String> {
    let mut rules: Vec<String> = Vec::new();
    for v in findings {
        if !rules.contains(&v.rule) {
            rules.push(v.rule.clone());
        }
    }
    rules
}

/// Persisted snapshot of the most recent decision for a project.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecisionSnapshot {
    #[serde(default = "default_snapshot_schema")]
    pub schema: String,
    pub image_ref: String,
    pub status: DecisionStatus,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub result: Decision,
}

fn default_snapshot_schema() -> String {
    SCHEMA_DECISION_SNAPSHOT_V1.to_string()
}

impl DecisionSnapshot {
    pub fn new(image_ref: impl Into<String>, decision: &Decision) -> Self {
        Self {
            schema: default_snapshot_schema(),
            image_ref: image_ref.into(),
            status: decision.status,
            timestamp: decision.timestamp,
            result: decision.clone(),
        }
    }
}
