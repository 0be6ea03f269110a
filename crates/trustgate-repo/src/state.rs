use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use trustgate_domain::DecisionStore;
use trustgate_types::{DecisionSnapshot, GateError};

/// Write through a sibling temp file and rename, so readers never see a torn file.
pub fn write_atomic(path: &Utf8Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("create {parent}"))?;
    }
    let tmp = Utf8PathBuf::from(format!("{path}.tmp.{}", std::process::id()));
    std::fs::write(&tmp, bytes).with_context(|| format!("write {tmp}"))?;
    std::fs::rename(&tmp, path).with_context(|| format!("rename {tmp} -> {path}"))?;
    Ok(())
}

pub(crate) fn parse_snapshot(text: &str) -> anyhow::Result<DecisionSnapshot> {
    serde_json::from_str(text).context("parse decision snapshot")
}

/// Read the last persisted decision, `None` when nothing was ever persisted.
pub fn read_snapshot(path: &Utf8Path) -> anyhow::Result<Option<DecisionSnapshot>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(path).with_context(|| format!("read {path}"))?;
    parse_snapshot(&text)
        .with_context(|| format!("in {path}"))
        .map(Some)
}

/// Single-slot store: each save replaces the previous snapshot (last writer wins).
#[derive(Clone, Debug)]
pub struct FileDecisionStore {
    path: Utf8PathBuf,
}

impl FileDecisionStore {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl DecisionStore for FileDecisionStore {
    fn save(&self, snapshot: &DecisionSnapshot) -> Result<(), GateError> {
        let write = || -> anyhow::Result<()> {
            let mut bytes = serde_json::to_vec_pretty(snapshot).context("serialize snapshot")?;
            bytes.push(b'\n');
            write_atomic(&self.path, &bytes)
        };
        write().map_err(|e| GateError::StatePersist(format!("{e:#}")))?;
        tracing::debug!(path = %self.path, status = snapshot.status.as_str(), "decision persisted");
        Ok(())
    }
}
