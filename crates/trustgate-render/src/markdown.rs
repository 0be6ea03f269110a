use crate::{RenderableDecision, RenderableFinding};

pub fn render_markdown(decision: &RenderableDecision) -> String {
    let mut out = String::new();

    out.push_str("# Trust gate decision\n\n");
    out.push_str(&format!(
        "- Artifact: `{}`\n- Status: **{}**\n- Mode: {}\n- Promotion: {}\n\n",
        decision.subject,
        decision.status.label(),
        decision.mode,
        if decision.promotion { "yes" } else { "no" }
    ));

    if decision.blocking.is_empty() && decision.warnings.is_empty() {
        out.push_str("No findings.\n\n");
    } else {
        section(&mut out, "Blocking", &decision.blocking);
        section(&mut out, "Warnings", &decision.warnings);
    }

    if decision.promotion {
        out.push_str("## Attestations considered\n\n");
        if decision.attestations.is_empty() {
            out.push_str("None.\n");
        }
        for id in &decision.attestations {
            out.push_str(&format!("- `{id}`\n"));
        }
    }

    let mut out = out.trim_end().to_string();
    out.push('\n');
    out
}

fn section(out: &mut String, title: &str, findings: &[RenderableFinding]) {
    if findings.is_empty() {
        return;
    }
    out.push_str(&format!("## {title}\n\n"));
    for f in findings {
        out.push_str(&format!(
            "- [{}] `{}`: {}\n",
            f.level.to_uppercase(),
            f.rule,
            f.message.replace('\n', " ")
        ));
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RenderableSeverity, RenderableStatus};

    fn decision() -> RenderableDecision {
        RenderableDecision {
            subject: "registry.local/app:1.0".to_string(),
            status: RenderableStatus::Pass,
            mode: "enforce".to_string(),
            promotion: false,
            blocking: Vec::new(),
            warnings: Vec::new(),
            attestations: Vec::new(),
        }
    }

    #[test]
    fn renders_empty_decision() {
        let md = render_markdown(&decision());
        assert!(md.contains("Status: **PASS**"));
        assert!(md.contains("No findings."));
        assert!(!md.contains("Attestations considered"));
    }

    #[test]
    fn renders_promotion_failure() {
        let mut d = decision();
        d.status = RenderableStatus::Fail;
        d.promotion = true;
        d.blocking.push(RenderableFinding {
            severity: RenderableSeverity::Error,
            rule: "attestation-required-for-promotion".to_string(),
            level: "critical".to_string(),
            message: "0 of 1 required attestations are valid".to_string(),
        });
        d.warnings.push(RenderableFinding {
            severity: RenderableSeverity::Warning,
            rule: "pinned-base".to_string(),
            level: "low".to_string(),
            message: "base image tag is mutable".to_string(),
        });

        insta::assert_snapshot!(render_markdown(&d), @r"
        # Trust gate decision

        - Artifact: `registry.local/app:1.0`
        - Status: **FAIL**
        - Mode: enforce
        - Promotion: yes

        ## Blocking

        - [CRITICAL] `attestation-required-for-promotion`: 0 of 1 required attestations are valid

        ## Warnings

        - [LOW] `pinned-base`: base image tag is mutable

        ## Attestations considered

        None.
        ");
    }
}
