use crate::state::write_atomic;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use trustgate_domain::AttestationSet;
use trustgate_types::{Attestation, AttestationEnvelope, AttestationSource};
use walkdir::WalkDir;

/// Attestation envelopes stored as `*.json` files under one directory (recursively).
#[derive(Clone, Debug)]
pub struct LocalAttestations {
    dir: Utf8PathBuf,
}

impl LocalAttestations {
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load every envelope. Unparsable files are skipped with a note; a missing directory
    /// is an empty set.
    pub fn load(&self) -> AttestationSet {
        let mut set = AttestationSet::default();
        if !self.dir.is_dir() {
            tracing::debug!(dir = %self.dir, "no local attestation directory");
            return set;
        }

        let mut files: Vec<Utf8PathBuf> = WalkDir::new(&self.dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| Utf8PathBuf::from_path_buf(e.into_path()).ok())
            .filter(|p| p.extension() == Some("json"))
            .collect();
        files.sort();

        for path in files {
            let id = path
                .strip_prefix(&self.dir)
                .unwrap_or(path.as_path())
                .with_extension("")
                .as_str()
                .replace('\\', "/");
            match read_envelope(&path) {
                Ok(envelope) => set.attestations.push(Attestation {
                    id,
                    source: AttestationSource::Local,
                    envelope,
                }),
                Err(e) => {
                    tracing::warn!(path = %path, "skipping unreadable attestation");
                    set.notes.push(format!("skipped local attestation {id}: {e:#}"));
                }
            }
        }

        tracing::debug!(dir = %self.dir, count = set.attestations.len(), "local attestations");
        set
    }
}

fn read_envelope(path: &Utf8Path) -> anyhow::Result<AttestationEnvelope> {
    let text = std::fs::read_to_string(path).with_context(|| format!("read {path}"))?;
    serde_json::from_str(&text).with_context(|| format!("parse {path}"))
}

/// Write an envelope as `<dir>/<stem>.json`, pretty-printed, atomically.
pub fn write_attestation(
    dir: &Utf8Path,
    stem: &str,
    envelope: &AttestationEnvelope,
) -> anyhow::Result<Utf8PathBuf> {
    let path = dir.join(format!("{stem}.json"));
    let mut bytes = serde_json::to_vec_pretty(envelope).context("serialize attestation")?;
    bytes.push(b'\n');
    write_atomic(&path, &bytes)?;
    tracing::info!(path = %path, "attestation written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn utf8_root(tmp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf8 path")
    }

    fn envelope() -> AttestationEnvelope {
        AttestationEnvelope {
            schema: trustgate_types::SCHEMA_ATTESTATION_V1.to_string(),
            payload: json!({"resultsHash": "sha256:00"}),
            key_id: "ed25519:aaaaaaaaaaaaaaaaaaaaaaaaaa".to_string(),
            public_key: "AAAA".to_string(),
            signature: "AAAA".to_string(),
        }
    }

    #[test]
    fn missing_directory_is_empty() {
        let tmp = TempDir::new().expect("temp dir");
        let set = LocalAttestations::new(utf8_root(&tmp).join("none")).load();
        assert!(set.attestations.is_empty());
        assert!(set.notes.is_empty());
    }

    #[test]
    fn written_envelopes_load_back_in_name_order() {
        let tmp = TempDir::new().expect("temp dir");
        let dir = utf8_root(&tmp).join("att");
        write_attestation(&dir, "b", &envelope()).expect("write b");
        write_attestation(&dir, "a", &envelope()).expect("write a");
        std::fs::write(dir.join("notes.txt"), "ignored").expect("write txt");

        let set = LocalAttestations::new(&dir).load();
        let ids: Vec<_> = set.attestations.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(set.attestations[0].envelope, envelope());
        assert_eq!(set.attestations[0].source, AttestationSource::Local);
    }

    #[test]
    fn corrupt_file_becomes_a_note() {
        let tmp = TempDir::new().expect("temp dir");
        let dir = utf8_root(&tmp);
        std::fs::write(dir.join("bad.json"), "{").expect("write");
        let set = LocalAttestations::new(&dir).load();
        assert!(set.attestations.is_empty());
        assert_eq!(set.notes.len(), 1);
        assert!(set.notes[0].contains("bad"));
    }
}
