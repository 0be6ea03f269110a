use crate::engine::{AttestationSet, DecisionStore, EvidenceSource, results_view};
use crate::policy::{AttestationRequirements, Profile};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use ed25519_dalek::{Signer, SigningKey};
use serde_json::{Value, json};
use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use trustgate_types::{
    ArtifactRef, Attestation, AttestationEnvelope, AttestationSource, Decision, DecisionSnapshot,
    GateError, PolicyMode, SCHEMA_ATTESTATION_V1, Severity, Violation, ViolationResult, Waiver,
};

pub const DIGEST: &str = "sha256:1111111111111111111111111111111111111111111111111111111111111111";
pub const RESULTS_HASH: &str =
    "sha256:2222222222222222222222222222222222222222222222222222222222222222";

pub fn raw(rule: &str, severity: Severity) -> Violation {
    Violation::new(rule, severity, ViolationResult::Fail, format!("{rule} fired"))
}

pub fn waiver(rule: &str, expiry: &str) -> Waiver {
    Waiver {
        rule_id: rule.to_string(),
        justification: "accepted risk".to_string(),
        expiry: expiry.to_string(),
        approved_by: None,
    }
}

pub fn profile(allow: &[&str], ignore: &[&str], warnings_show: bool) -> Profile {
    Profile {
        name: "test".to_string(),
        description: String::new(),
        allow: allow.iter().map(|s| s.to_string()).collect(),
        ignore: ignore.iter().map(|s| s.to_string()).collect(),
        warnings_show,
    }
}

pub fn requirements() -> AttestationRequirements {
    AttestationRequirements::default()
}

pub fn artifact() -> ArtifactRef {
    let parsed = ArtifactRef::parse("registry.local/app:1.0");
    parsed
        .and_then(|a| a.with_digest(DIGEST))
        .unwrap_or_else(|e| panic!("fixture artifact: {e}"))
}

fn signing_key() -> SigningKey {
    SigningKey::from_bytes(&[7u8; 32])
}

pub fn payload(digest: &str, results_hash: &str) -> Value {
    json!({
        "subject": {"name": "registry.local/app:1.0", "digest": digest},
        "resultsHash": results_hash,
        "status": "pass",
        "issuedAt": "2026-06-01T12:00:00Z",
    })
}

pub fn sign(id: &str, source: AttestationSource, payload: Value) -> Attestation {
    sign_with_key(&signing_key(), id, source, payload)
}

fn sign_with_key(
    key: &SigningKey,
    id: &str,
    source: AttestationSource,
    payload: Value,
) -> Attestation {
    let message = trustgate_canon::canonicalize(&payload).unwrap();
    let signature = key.sign(&message);
    Attestation {
        id: id.to_string(),
        source,
        envelope: AttestationEnvelope {
            schema: SCHEMA_ATTESTATION_V1.to_string(),
            payload,
            key_id: trustgate_canon::key_id(key.verifying_key().as_bytes()),
            public_key: trustgate_canon::encode_public_key(&key.verifying_key()),
            signature: BASE64.encode(signature.to_bytes()),
        },
    }
}

pub fn signed(id: &str, source: AttestationSource) -> Attestation {
    sign(id, source, payload(DIGEST, RESULTS_HASH))
}

/// Like [`signed`], but under a key derived from `seed`.
pub fn signed_by(id: &str, source: AttestationSource, seed: u8) -> Attestation {
    let key = SigningKey::from_bytes(&[seed; 32]);
    sign_with_key(&key, id, source, payload(DIGEST, RESULTS_HASH))
}

/// Sign after letting the caller edit the payload.
pub fn signed_with(
    id: &str,
    source: AttestationSource,
    edit: impl FnOnce(&mut Value),
) -> Attestation {
    let mut p = payload(DIGEST, RESULTS_HASH);
    edit(&mut p);
    sign(id, source, p)
}

/// A local attestation bound to `decision` as seen under `mode`.
pub fn attestation_for(
    decision: &Decision,
    art: &ArtifactRef,
    mode: PolicyMode,
    id: &str,
) -> Attestation {
    let hash = trustgate_canon::results_hash(&results_view(decision, art, mode)).unwrap();
    sign(id, AttestationSource::Local, payload(DIGEST, &hash))
}

#[derive(Default)]
pub struct StaticEvidence {
    sbom: bool,
    raw: Option<Result<Vec<Violation>, String>>,
    attestations: Vec<Attestation>,
    notes: Vec<String>,
    raw_calls: Cell<usize>,
    attestation_calls: Cell<usize>,
}

impl StaticEvidence {
    pub fn new(sbom: bool) -> Self {
        Self {
            sbom,
            ..Self::default()
        }
    }

    pub fn with_raw(mut self, raw: Vec<Violation>) -> Self {
        self.raw = Some(Ok(raw));
        self
    }

    pub fn with_raw_error(mut self, msg: &str) -> Self {
        self.raw = Some(Err(msg.to_string()));
        self
    }

    pub fn with_attestations(mut self, attestations: Vec<Attestation>) -> Self {
        self.attestations = attestations;
        self
    }

    pub fn with_note(mut self, note: &str) -> Self {
        self.notes.push(note.to_string());
        self
    }

    pub fn raw_calls(&self) -> usize {
        self.raw_calls.get()
    }

    pub fn attestation_calls(&self) -> usize {
        self.attestation_calls.get()
    }
}

impl EvidenceSource for StaticEvidence {
    fn sbom_present(&self, _artifact: &ArtifactRef) -> bool {
        self.sbom
    }

    fn raw_violations(&self, _artifact: &ArtifactRef) -> Result<Vec<Violation>, String> {
        self.raw_calls.set(self.raw_calls.get() + 1);
        self.raw.clone().unwrap_or_else(|| Ok(Vec::new()))
    }

    fn attestations(
        &self,
        _artifact: &ArtifactRef,
        _sources: &BTreeSet<AttestationSource>,
    ) -> AttestationSet {
        self.attestation_calls.set(self.attestation_calls.get() + 1);
        AttestationSet {
            attestations: self.attestations.clone(),
            notes: self.notes.clone(),
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    saved: RefCell<Vec<DecisionSnapshot>>,
}

impl MemoryStore {
    pub fn saved(&self) -> Vec<DecisionSnapshot> {
        self.saved.borrow().clone()
    }
}

impl DecisionStore for MemoryStore {
    fn save(&self, snapshot: &DecisionSnapshot) -> Result<(), GateError> {
        self.saved.borrow_mut().push(snapshot.clone());
        Ok(())
    }
}

pub struct FailingStore;

impl DecisionStore for FailingStore {
    fn save(&self, _snapshot: &DecisionSnapshot) -> Result<(), GateError> {
        Err(GateError::StatePersist("disk full".to_string()))
    }
}
