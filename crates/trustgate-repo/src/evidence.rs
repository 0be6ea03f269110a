use crate::attestations::LocalAttestations;
use crate::layout::ProjectLayout;
use crate::remote::RemoteAttestations;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::collections::BTreeSet;
use trustgate_domain::{AttestationSet, EvidenceSource, ViolationProducer};
use trustgate_types::{ArtifactRef, AttestationSource, Violation, Waiver};

/// Evaluator output accepted on disk: a bare array or `{ "violations": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ViolationDoc {
    List(Vec<Violation>),
    Wrapped { violations: Vec<Violation> },
}

pub(crate) fn parse_violations(text: &str) -> anyhow::Result<Vec<Violation>> {
    let doc: ViolationDoc = serde_json::from_str(text).context("parse evaluator output")?;
    Ok(match doc {
        ViolationDoc::List(v) => v,
        ViolationDoc::Wrapped { violations } => violations,
    })
}

/// Raw violations written by an external rule evaluator before the gate runs.
///
/// A missing file means the evaluator reported nothing; an unreadable or malformed one is
/// an evaluator failure.
#[derive(Clone, Debug)]
pub struct JsonViolationFile {
    path: Utf8PathBuf,
}

impl JsonViolationFile {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ViolationProducer for JsonViolationFile {
    fn produce(&self, _artifact: &ArtifactRef) -> Result<Vec<Violation>, String> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path, "no evaluator output");
            return Ok(Vec::new());
        }
        std::fs::read_to_string(&self.path)
            .with_context(|| format!("read {}", self.path))
            .and_then(|text| parse_violations(&text))
            .map_err(|e| format!("{e:#}"))
    }
}

/// Load waivers. Missing or unreadable files degrade to no waivers.
pub fn load_waivers(path: &Utf8Path) -> Vec<Waiver> {
    if !path.exists() {
        tracing::debug!(path = %path, "no waiver file");
        return Vec::new();
    }
    let loaded = std::fs::read_to_string(path)
        .with_context(|| format!("read {path}"))
        .and_then(|text| trustgate_settings::parse_waivers_yaml(&text));
    match loaded {
        Ok(w) => {
            tracing::debug!(path = %path, count = w.len(), "loaded waivers");
            w
        }
        Err(e) => {
            let error = format!("{e:#}");
            tracing::warn!(path = %path, error = %error, "waiver file ignored");
            Vec::new()
        }
    }
}

/// Evidence read from a project directory.
pub struct ProjectEvidence {
    layout: ProjectLayout,
    producer: Box<dyn ViolationProducer>,
    local: LocalAttestations,
    remote: Option<RemoteAttestations>,
}

impl ProjectEvidence {
    pub fn new(
        layout: ProjectLayout,
        producer: Box<dyn ViolationProducer>,
        remote: Option<RemoteAttestations>,
    ) -> Self {
        let local = LocalAttestations::new(layout.attestations_dir());
        Self {
            layout,
            producer,
            local,
            remote,
        }
    }
}

impl EvidenceSource for ProjectEvidence {
    fn sbom_present(&self, _artifact: &ArtifactRef) -> bool {
        let path = self.layout.sbom();
        let present = path.is_file();
        tracing::debug!(path = %path, present, "sbom");
        present
    }

    fn raw_violations(&self, artifact: &ArtifactRef) -> Result<Vec<Violation>, String> {
        self.producer.produce(artifact)
    }

    fn attestations(
        &self,
        artifact: &ArtifactRef,
        sources: &BTreeSet<AttestationSource>,
    ) -> AttestationSet {
        let mut set = AttestationSet::default();
        for source in sources {
            let part = match source {
                AttestationSource::Local => self.local.load(),
                AttestationSource::Remote => match &self.remote {
                    Some(remote) => remote.fetch(artifact.subject()),
                    None => AttestationSet {
                        attestations: Vec::new(),
                        notes: vec!["remote source not configured".to_string()],
                    },
                },
            };
            set.attestations.extend(part.attestations);
            set.notes.extend(part.notes);
        }
        set
    }
}
