//! Render use cases: decisions to Markdown, annotations and terminal text.

use trustgate_render::{
    RenderableDecision, RenderableFinding, RenderableSeverity, RenderableStatus, TextOptions,
};
use trustgate_types::{Decision, DecisionStatus, Violation};

/// Build the render model. Mode and promotion are read from the decision's input summary,
/// so persisted snapshots render the same way as fresh decisions.
pub fn to_renderable(decision: &Decision, subject: &str) -> RenderableDecision {
    let mode = decision
        .input
        .get("mode")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown")
        .to_string();
    let promotion = decision
        .input
        .get("forPromotion")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    RenderableDecision {
        subject: subject.to_string(),
        status: match decision.status {
            DecisionStatus::Pass => RenderableStatus::Pass,
            DecisionStatus::Warn => RenderableStatus::Warn,
            DecisionStatus::Fail => RenderableStatus::Fail,
        },
        mode,
        promotion,
        blocking: decision
            .violations
            .iter()
            .map(|v| finding(v, RenderableSeverity::Error))
            .collect(),
        warnings: decision
            .warnings
            .iter()
            .map(|v| finding(v, RenderableSeverity::Warning))
            .collect(),
        attestations: decision.attestations_considered.clone(),
    }
}

fn finding(v: &Violation, severity: RenderableSeverity) -> RenderableFinding {
    RenderableFinding {
        severity,
        rule: v.rule.clone(),
        level: v.severity.as_str().to_string(),
        message: v.message.clone(),
    }
}

pub fn render_markdown(decision: &RenderableDecision) -> String {
    trustgate_render::render_markdown(decision)
}

pub fn render_annotations(decision: &RenderableDecision, max: usize) -> Vec<String> {
    trustgate_render::render_github_annotations(decision)
        .into_iter()
        .take(max)
        .collect()
}

pub fn render_text(decision: &RenderableDecision, color: bool) -> String {
    trustgate_render::render_text(decision, TextOptions { color })
}
