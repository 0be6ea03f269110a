//! The `explain` use case: rule documentation, or the last persisted decision.

use crate::project::{Project, ProjectInput};
use trustgate_types::explain::{self, Explanation};
use trustgate_types::{DecisionSnapshot, Violation};

/// Output from the explain use case.
#[derive(Clone, Debug)]
pub enum ExplainOutput {
    /// Found an explanation for the identifier.
    Found(Explanation),
    /// Unknown identifier; includes the known rule IDs and gates.
    NotFound {
        identifier: String,
        available_rules: &'static [&'static str],
        available_gates: &'static [&'static str],
    },
}

/// Look up an explanation for a rule ID or gate name.
pub fn run_explain(identifier: &str) -> ExplainOutput {
    match explain::lookup_explanation(identifier) {
        Some(exp) => ExplainOutput::Found(exp),
        None => ExplainOutput::NotFound {
            identifier: identifier.to_string(),
            available_rules: explain::all_rule_ids(),
            available_gates: explain::all_gates(),
        },
    }
}

/// The last persisted decision for the project, `None` when nothing was ever verified.
pub fn run_explain_last(input: &ProjectInput<'_>) -> anyhow::Result<Option<DecisionSnapshot>> {
    let project = Project::open(input)?;
    trustgate_repo::read_snapshot(&project.layout.state())
}

/// Format an explanation for terminal display.
pub fn format_explanation(exp: &Explanation) -> String {
    let mut out = String::new();

    out.push_str(exp.title);
    out.push('\n');
    out.push_str(&"=".repeat(exp.title.len()));
    out.push_str("\n\n");
    out.push_str(exp.description);
    out.push_str("\n\n");
    out.push_str("Remediation\n");
    out.push_str("-----------\n");
    out.push_str(exp.remediation);
    out.push_str("\n\n");
    out.push_str("Examples\n");
    out.push_str("--------\n\n");
    out.push_str("Before (fails):\n");
    out.push_str("```\n");
    out.push_str(exp.examples.before);
    out.push('\n');
    out.push_str("```\n\n");
    out.push_str("After (passes):\n");
    out.push_str("```\n");
    out.push_str(exp.examples.after);
    out.push('\n');
    out.push_str("```\n");

    out
}

/// Format the "not found" error message for terminal display.
pub fn format_not_found(
    identifier: &str,
    rules: &[&'static str],
    gates: &[&'static str],
) -> String {
    let mut out = String::new();

    out.push_str(&format!("Unknown rule or gate: {identifier}\n\n"));
    out.push_str("Known rules:\n");
    for id in rules {
        out.push_str(&format!("  - {id}\n"));
    }
    out.push_str("\nGates:\n");
    for gate in gates {
        out.push_str(&format!("  - {gate}\n"));
    }

    out
}

/// Explain why the last decision came out the way it did.
pub fn format_last_decision(snapshot: &DecisionSnapshot) -> String {
    let d = &snapshot.result;
    let mut out = String::new();

    out.push_str(&format!(
        "Last decision for {}: {} (allow: {})\n",
        snapshot.image_ref,
        d.status.as_str(),
        d.allow
    ));
    out.push_str(&format!("Recorded at {}\n", rfc3339(snapshot.timestamp)));

    let mode = d.input.get("mode").and_then(|v| v.as_str());
    let profile = d.input.get("profile").and_then(|v| v.as_str());
    if mode.is_some() || profile.is_some() {
        out.push_str(&format!(
            "Mode: {}, profile: {}\n",
            mode.unwrap_or("unknown"),
            profile.unwrap_or("none")
        ));
    }

    if d.violations.is_empty() && d.warnings.is_empty() {
        out.push_str("\nNo findings.\n");
        return out;
    }

    if !d.violations.is_empty() {
        out.push_str("\nBlocking:\n");
        for v in &d.violations {
            push_violation(&mut out, v);
        }
    }
    if !d.warnings.is_empty() {
        out.push_str("\nWarnings:\n");
        for v in &d.warnings {
            push_violation(&mut out, v);
        }
    }
    if !d.attestations_considered.is_empty() {
        out.push_str(&format!(
            "\nAttestations considered: {}\n",
            d.attestations_considered.join(", ")
        ));
    }

    out
}

fn push_violation(out: &mut String, v: &Violation) {
    out.push_str(&format!("  - [{}] {}: {}\n", v.severity.as_str(), v.rule, v.message));
    if let Some(exp) = explain::lookup_explanation(&v.rule) {
        out.push_str(&format!("    {}: {}\n", exp.title, first_sentence(exp.remediation)));
        out.push_str(&format!("    (trustgate explain {})\n", v.rule));
    }
}

fn first_sentence(text: &str) -> &str {
    match text.find(". ") {
        Some(i) => &text[..=i],
        None => text,
    }
}

fn rfc3339(t: time::OffsetDateTime) -> String {
    t.format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| t.to_string())
}
