use crate::DecisionStatus;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use time::OffsetDateTime;

/// Stable schema identifier for attestation envelopes.
pub const SCHEMA_ATTESTATION_V1: &str = "trustgate.attestation.v1";

/// Where an attestation was obtained from. Assigned by the loader, never read from the envelope.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum AttestationSource {
    Local,
    Remote,
}

impl AttestationSource {
    pub fn as_str(self) -> &'static str {
        match self {
            AttestationSource::Local => "local",
            AttestationSource::Remote => "remote",
        }
    }

    pub fn parse(v: &str) -> Option<AttestationSource> {
        match v {
            "local" => Some(AttestationSource::Local),
            "remote" => Some(AttestationSource::Remote),
            _ => None,
        }
    }
}

/// Signed envelope as stored on disk or served by a remote source.
///
/// `signature` is ed25519 over the RFC 8785 canonical bytes of `payload`.
/// `payload` stays untyped here so that schema conformance is a check, not a parse precondition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttestationEnvelope {
    pub schema: String,
    pub payload: JsonValue,
    pub key_id: String,
    /// Base64 (standard alphabet) of the 32-byte ed25519 public key.
    pub public_key: String,
    /// Base64 (standard alphabet) of the 64-byte ed25519 signature.
    pub signature: String,
}

impl AttestationEnvelope {
    /// Best-effort read of the subject digest without requiring a schema-valid payload.
    pub fn subject_digest(&self) -> Option<&str> {
        self.payload.pointer("/subject/digest")?.as_str()
    }

    /// Best-effort read of the bound results hash without requiring a schema-valid payload.
    pub fn results_hash(&self) -> Option<&str> {
        self.payload.pointer("/resultsHash")?.as_str()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AttestationSubject {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// The typed attestation claim. Unknown fields are rejected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AttestationPayload {
    pub subject: AttestationSubject,
    pub results_hash: String,
    pub status: DecisionStatus,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub issued_at: OffsetDateTime,
}

/// An envelope together with its provenance.
#[derive(Clone, Debug, PartialEq)]
pub struct Attestation {
    /// Stable identifier for reporting (file stem for local, position-derived for remote).
    pub id: String,
    pub source: AttestationSource,
    pub envelope: AttestationEnvelope,
}
