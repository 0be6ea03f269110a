use crate::{RenderableDecision, RenderableFinding, RenderableSeverity, RenderableStatus};
use colored::Colorize;

/// Terminal rendering options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextOptions {
    pub color: bool,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self { color: true }
    }
}

/// Human summary for a terminal. With `color: false` the output is plain ASCII apart from
/// what the findings themselves contain.
pub fn render_text(decision: &RenderableDecision, opts: TextOptions) -> String {
    let mut out = String::new();

    let status = decision.status.label();
    let status = if opts.color {
        match decision.status {
            RenderableStatus::Pass => status.green().bold().to_string(),
            RenderableStatus::Warn => status.yellow().bold().to_string(),
            RenderableStatus::Fail => status.red().bold().to_string(),
        }
    } else {
        status.to_string()
    };
    out.push_str(&format!("trustgate: {status} {}", decision.subject));
    if decision.promotion {
        out.push_str(" (promotion)");
    }
    out.push('\n');

    for f in decision.findings() {
        out.push_str(&format!("  {} {}\n", tag(f, opts), f.message));
    }

    if decision.promotion && !decision.attestations.is_empty() {
        out.push_str(&format!(
            "  attestations: {}\n",
            decision.attestations.join(", ")
        ));
    }

    out
}

fn tag(f: &RenderableFinding, opts: TextOptions) -> String {
    let label = format!("[{}] {}:", f.level, f.rule);
    if !opts.color {
        return label;
    }
    match f.severity {
        RenderableSeverity::Error => label.red().to_string(),
        RenderableSeverity::Warning => label.yellow().to_string(),
        RenderableSeverity::Info => label.dimmed().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decision() -> RenderableDecision {
        RenderableDecision {
            subject: "app:1".to_string(),
            status: RenderableStatus::Fail,
            mode: "enforce".to_string(),
            promotion: true,
            blocking: vec![RenderableFinding {
                severity: RenderableSeverity::Error,
                rule: "sbom-required".to_string(),
                level: "critical".to_string(),
                message: "no SBOM".to_string(),
            }],
            warnings: Vec::new(),
            attestations: vec!["build-1".to_string()],
        }
    }

    #[test]
    fn plain_text_has_no_escape_codes() {
        let out = render_text(&decision(), TextOptions { color: false });
        assert_eq!(
            out,
            "trustgate: FAIL app:1 (promotion)\n  [critical] sbom-required: no SBOM\n  attestations: build-1\n"
        );
        assert!(!out.contains('\u{1b}'));
    }

    #[test]
    fn colored_text_keeps_the_content() {
        let out = render_text(&decision(), TextOptions::default());
        assert!(out.contains("FAIL"));
        assert!(out.contains("sbom-required"));
    }
}
