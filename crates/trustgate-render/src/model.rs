#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderableSeverity {
    Info,
    Warning,
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderableStatus {
    Pass,
    Warn,
    Fail,
}

impl RenderableStatus {
    pub fn label(self) -> &'static str {
        match self {
            RenderableStatus::Pass => "PASS",
            RenderableStatus::Warn => "WARN",
            RenderableStatus::Fail => "FAIL",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableFinding {
    pub severity: RenderableSeverity,
    pub rule: String,
    /// Rule severity as reported (`critical`, `high`, ...).
    pub level: String,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableDecision {
    pub subject: String,
    pub status: RenderableStatus,
    pub mode: String,
    pub promotion: bool,
    pub blocking: Vec<RenderableFinding>,
    pub warnings: Vec<RenderableFinding>,
    pub attestations: Vec<String>,
}

impl RenderableDecision {
    /// Blocking findings first, then warnings.
    pub fn findings(&self) -> impl Iterator<Item = &RenderableFinding> {
        self.blocking.iter().chain(self.warnings.iter())
    }
}
