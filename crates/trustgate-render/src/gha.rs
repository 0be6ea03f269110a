use crate::{RenderableDecision, RenderableSeverity};

/// Render findings as GitHub Actions workflow command annotations.
///
/// Format: `::{level} title=trustgate {rule}::{message}`
pub fn render_github_annotations(decision: &RenderableDecision) -> Vec<String> {
    decision
        .findings()
        .map(|f| {
            let level = match f.severity {
                RenderableSeverity::Error => "error",
                RenderableSeverity::Warning => "warning",
                RenderableSeverity::Info => "notice",
            };
            let title = escape_property(&format!("trustgate {}", f.rule));
            let message =
                escape_data(&format!("[{}] {}: {}", f.level, decision.subject, f.message));
            format!("::{level} title={title}::{message}")
        })
        .collect()
}

fn escape_data(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn escape_property(s: &str) -> String {
    escape_data(s).replace(':', "%3A").replace(',', "%2C")
}
