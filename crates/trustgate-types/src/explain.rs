//! Explain registry for gate rules and gates.
//!
//! Maps rule IDs and gate names to human-readable explanations with remediation guidance.
//! Rules produced by the external evaluator are not listed here; they explain themselves
//! through their own messages.

use crate::ids;

/// Explanation entry for a rule or gate.
#[derive(Debug, Clone)]
pub struct Explanation {
    /// Short description of the rule/gate.
    pub title: &'static str,
    /// What the rule checks and when it fires.
    pub description: &'static str,
    /// How to resolve it.
    pub remediation: &'static str,
    /// Before/after configuration examples.
    pub examples: ExamplePair,
}

/// Before and after examples.
#[derive(Debug, Clone)]
pub struct ExamplePair {
    /// Configuration that would trigger the rule.
    pub before: &'static str,
    /// Configuration that passes.
    pub after: &'static str,
}

/// Look up an explanation by rule ID or gate name.
///
/// Returns `None` if the identifier is not recognized.
pub fn lookup_explanation(identifier: &str) -> Option<Explanation> {
    match identifier {
        // Rules
        ids::RULE_SBOM_REQUIRED => Some(explain_sbom_required()),
        ids::RULE_ATTESTATION_REQUIRED => Some(explain_attestation_required()),
        ids::RULE_WAIVER_EXPIRED => Some(explain_waiver_expired()),
        ids::RULE_TOOL_RUNTIME => Some(explain_tool_runtime()),

        // Gates
        ids::GATE_SBOM => Some(explain_sbom_required()),
        ids::GATE_WAIVER => Some(explain_waiver_expired()),
        ids::GATE_POLICY => Some(explain_policy_gate()),
        ids::GATE_ATTESTATION => Some(explain_attestation_required()),

        _ => None,
    }
}

/// List all known gate-emitted rule IDs.
pub fn all_rule_ids() -> &'static [&'static str] {
    &[
        ids::RULE_SBOM_REQUIRED,
        ids::RULE_ATTESTATION_REQUIRED,
        ids::RULE_WAIVER_EXPIRED,
        ids::RULE_TOOL_RUNTIME,
    ]
}

/// List all gate names in evaluation order.
pub fn all_gates() -> &'static [&'static str] {
    &[
        ids::GATE_SBOM,
        ids::GATE_WAIVER,
        ids::GATE_POLICY,
        ids::GATE_ATTESTATION,
    ]
}

fn explain_sbom_required() -> Explanation {
    Explanation {
        title: "SBOM Required",
        description: "\
Every artifact must ship with a software bill of materials. The SBOM gate runs first; \
when no SBOM is found for the artifact the gate emits `sbom-required` (critical) and, \
in enforce mode, stops before any other gate runs.",
        remediation: "\
Generate an SBOM for the artifact (CycloneDX or SPDX) and place it at the path \
configured under `[evidence] sbom` in trustgate.toml (default: `sbom.json`).",
        examples: ExamplePair {
            before: "\
[evidence]
sbom = \"build/sbom.json\"   # file does not exist",
            after: "\
[evidence]
sbom = \"build/sbom.json\"   # produced by the build before verify",
        },
    }
}

fn explain_waiver_expired() -> Explanation {
    Explanation {
        title: "Expired Waiver",
        description: "\
A waiver exempts one rule until its expiry. When a waiver for a rule that the evaluator \
reported has expired (or its expiry cannot be parsed), the gate emits a critical finding \
keyed by that rule. Expired waivers always block, in every mode, and cannot be demoted \
by a profile.",
        remediation: "\
Fix the underlying violation, or have the waiver re-approved with a new RFC 3339 expiry. \
An empty expiry means the waiver never expires.",
        examples: ExamplePair {
            before: "\
waivers:
  - ruleId: no-root-user
    justification: legacy base image
    expiry: 2024-01-01T00:00:00Z",
            after: "\
waivers:
  - ruleId: no-root-user
    justification: legacy base image, migration tracked
    expiry: 2027-01-01T00:00:00Z
    approvedBy: security-team",
        },
    }
}

fn explain_policy_gate() -> Explanation {
    Explanation {
        title: "Policy Gate",
        description: "\
Raw violations from the rule evaluator are reclassified by the active profile. Rules \
missing from a non-empty `policies.allow` are dropped; rules or severities listed in \
`violations.ignore` become warnings (when `warnings.show` is true) or are dropped. \
Everything else blocks.",
        remediation: "\
Fix the reported rule violations, add a time-bound waiver, or select a profile that \
reclassifies the finding.",
        examples: ExamplePair {
            before: "\
schemaVersion: 1
name: strict
description: everything blocks",
            after: "\
schemaVersion: 1
name: relaxed
description: low findings are advisory
violations:
  ignore: [low, informational]
warnings:
  show: true",
        },
    }
}

fn explain_attestation_required() -> Explanation {
    Explanation {
        title: "Attestation Required For Promotion",
        description: "\
Promotion needs at least `min_count` valid attestations from the configured sources. \
An attestation is valid when its ed25519 signature verifies, its key ID matches its \
public key (and the trusted-key list, when set), and every enabled check passes: subject \
digest match, payload schema, and results-hash match against the decision being gated.",
        remediation: "\
Run `trustgate attest <artifact>` after a passing verification to produce a signed \
attestation, or lower `min_count` / set `mode = \"warn\"` under `[attestation]`.",
        examples: ExamplePair {
            before: "\
[attestation]
enabled = true
min_count = 1
sources = [\"local\"]   # no attestation written yet",
            after: "\
$ trustgate attest registry.local/app:1.4.0 --digest sha256:...
$ trustgate promote registry.local/app:1.4.0 --digest sha256:... --to prod",
        },
    }
}

fn explain_tool_runtime() -> Explanation {
    Explanation {
        title: "Rule Evaluator Failure",
        description: "\
The rule evaluator's output could not be read (malformed JSON, unknown severity, \
unreadable file). The gate cannot tell which rules passed, so it records a critical \
`tool-runtime` finding through the policy gate instead of assuming a clean result.",
        remediation: "\
Re-run the evaluator and check the file configured under `[evidence] violations`. It must \
be a JSON array of `{rule, severity, result, message}` objects. A missing file means no \
violations.",
        examples: ExamplePair {
            before: "\
{ \"rule\": \"no-root-user\", \"severity\": \"high\" ",
            after: "\
[
  {\"rule\": \"no-root-user\", \"severity\": \"high\", \"result\": \"fail\", \"message\": \"runs as root\"}
]",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_rule_and_gate_is_explained() {
        for id in all_rule_ids().iter().chain(all_gates()) {
            let exp =
                lookup_explanation(id).unwrap_or_else(|| panic!("missing explanation for {id}"));
            assert!(!exp.title.is_empty());
            assert!(!exp.remediation.is_empty());
        }
    }

    #[test]
    fn unknown_identifier_is_none() {
        assert!(lookup_explanation("not-a-rule").is_none());
    }
}
