//! Attestation threshold evaluation.
//!
//! An attestation counts toward the threshold only when its signature verifies, its key ID
//! is derived from its own public key (and is trusted, when a trust list is configured), and
//! every enabled content check passes. Each signer counts once: a second valid attestation
//! under an already counted key ID is recorded as a duplicate.

use crate::policy::AttestationRequirements;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use ed25519_dalek::{SIGNATURE_LENGTH, Signature};
use std::collections::BTreeSet;
use std::fmt;
use trustgate_types::{
    Attestation, AttestationEnvelope, AttestationPayload, AttestationSource,
    SCHEMA_ATTESTATION_V1,
};

/// Why an attestation did not count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RejectReason {
    BadSignature(String),
    KeyIdMismatch { claimed: String, derived: String },
    UntrustedKey(String),
    InvalidSchema(String),
    DigestUnknown,
    DigestMismatch { found: Option<String> },
    ResultsHashUnavailable,
    ResultsHashMismatch { found: Option<String> },
    /// Valid, but its signer already counted.
    Duplicate { key_id: String },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::BadSignature(e) => write!(f, "signature invalid: {e}"),
            RejectReason::KeyIdMismatch { claimed, derived } => {
                write!(f, "key id {claimed} does not match public key ({derived})")
            }
            RejectReason::UntrustedKey(id) => write!(f, "key {id} is not trusted"),
            RejectReason::InvalidSchema(e) => write!(f, "payload schema invalid: {e}"),
            RejectReason::DigestUnknown => write!(f, "artifact digest unknown"),
            RejectReason::DigestMismatch { found } => write!(
                f,
                "subject digest {} does not match artifact",
                found.as_deref().unwrap_or("<missing>")
            ),
            RejectReason::ResultsHashUnavailable => write!(f, "decision results hash unavailable"),
            RejectReason::ResultsHashMismatch { found } => write!(
                f,
                "results hash {} does not match decision",
                found.as_deref().unwrap_or("<missing>")
            ),
            RejectReason::Duplicate { key_id } => {
                write!(f, "key {key_id} already counted")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectedAttestation {
    pub id: String,
    pub source: AttestationSource,
    pub reason: RejectReason,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ThresholdOutcome {
    pub met: bool,
    /// Requirements disabled; nothing was evaluated.
    pub skipped: bool,
    pub required: u32,
    /// Attestations from configured sources.
    pub considered: usize,
    /// IDs of attestations that passed every check, one per signer, in input order.
    pub valid: Vec<String>,
    pub rejected: Vec<RejectedAttestation>,
    /// Source-level notes (e.g. a remote source that could not be reached).
    pub notes: Vec<String>,
}

impl ThresholdOutcome {
    pub fn valid_count(&self) -> u32 {
        u32::try_from(self.valid.len()).unwrap_or(u32::MAX)
    }

    /// One-line explanation for reports.
    pub fn summary(&self) -> String {
        let mut msg = format!(
            "{} valid attestation(s) of {} required ({} considered)",
            self.valid.len(),
            self.required,
            self.considered
        );
        for r in &self.rejected {
            msg.push_str(&format!("; {} [{}]: {}", r.id, r.source.as_str(), r.reason));
        }
        for n in &self.notes {
            msg.push_str(&format!("; {n}"));
        }
        msg
    }
}

/// Count valid attestations against the requirements.
///
/// `results_hash` is `None` when the decision could not be hashed; with
/// `require_results_hash_match` that rejects every attestation.
pub fn evaluate(
    req: &AttestationRequirements,
    attestations: &[Attestation],
    artifact_digest: Option<&str>,
    results_hash: Option<&str>,
) -> ThresholdOutcome {
    if !req.enabled {
        return ThresholdOutcome {
            met: true,
            skipped: true,
            ..ThresholdOutcome::default()
        };
    }

    let mut out = ThresholdOutcome {
        required: req.min_count,
        ..ThresholdOutcome::default()
    };

    let mut signers = BTreeSet::new();
    for att in attestations.iter().filter(|a| req.sources.contains(&a.source)) {
        out.considered += 1;
        let verdict = check(req, &att.envelope, artifact_digest, results_hash).and_then(|()| {
            if signers.insert(att.envelope.key_id.as_str()) {
                Ok(())
            } else {
                Err(RejectReason::Duplicate {
                    key_id: att.envelope.key_id.clone(),
                })
            }
        });
        match verdict {
            Ok(()) => out.valid.push(att.id.clone()),
            Err(reason) => out.rejected.push(RejectedAttestation {
                id: att.id.clone(),
                source: att.source,
                reason,
            }),
        }
    }

    out.met = out.valid_count() >= req.min_count;
    out
}

fn check(
    req: &AttestationRequirements,
    env: &AttestationEnvelope,
    artifact_digest: Option<&str>,
    results_hash: Option<&str>,
) -> Result<(), RejectReason> {
    verify_envelope(env)?;

    if !req.trusted_keys.is_empty() && !req.trusted_keys.iter().any(|k| *k == env.key_id) {
        return Err(RejectReason::UntrustedKey(env.key_id.clone()));
    }

    if req.require_valid_schema {
        validate_schema(env)?;
    }

    if req.require_digest_match {
        let expected = artifact_digest.ok_or(RejectReason::DigestUnknown)?;
        let found = env.subject_digest();
        if found != Some(expected) {
            return Err(RejectReason::DigestMismatch {
                found: found.map(str::to_string),
            });
        }
    }

    if req.require_results_hash_match {
        let expected = results_hash.ok_or(RejectReason::ResultsHashUnavailable)?;
        let found = env.results_hash();
        if found != Some(expected) {
            return Err(RejectReason::ResultsHashMismatch {
                found: found.map(str::to_string),
            });
        }
    }

    Ok(())
}

/// Verify the envelope signature over the canonical payload and the key ID binding.
pub fn verify_envelope(env: &AttestationEnvelope) -> Result<(), RejectReason> {
    let public = trustgate_canon::decode_public_key(&env.public_key)
        .map_err(RejectReason::BadSignature)?;

    let derived = trustgate_canon::key_id(public.as_bytes());
    if derived != env.key_id {
        return Err(RejectReason::KeyIdMismatch {
            claimed: env.key_id.clone(),
            derived,
        });
    }

    let sig_bytes = BASE64
        .decode(env.signature.trim())
        .map_err(|e| RejectReason::BadSignature(format!("not valid base64: {e}")))?;
    let sig_bytes: [u8; SIGNATURE_LENGTH] = sig_bytes.as_slice().try_into().map_err(|_| {
        RejectReason::BadSignature(format!(
            "expected {SIGNATURE_LENGTH} bytes, got {}",
            sig_bytes.len()
        ))
    })?;
    let signature = Signature::from_bytes(&sig_bytes);

    let message = trustgate_canon::canonicalize(&env.payload)
        .map_err(|e| RejectReason::BadSignature(e.to_string()))?;
    public
        .verify_strict(&message, &signature)
        .map_err(|_| RejectReason::BadSignature("verification failed".to_string()))
}

fn validate_schema(env: &AttestationEnvelope) -> Result<(), RejectReason> {
    if env.schema != SCHEMA_ATTESTATION_V1 {
        return Err(RejectReason::InvalidSchema(format!(
            "unknown schema `{}`",
            env.schema
        )));
    }
    serde_json::from_value::<AttestationPayload>(env.payload.clone())
        .map(|_| ())
        .map_err(|e| RejectReason::InvalidSchema(e.to_string()))
}
