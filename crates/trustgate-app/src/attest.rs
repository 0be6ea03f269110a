//! The `attest` use case: verify, then sign a claim binding the artifact to the results.

use crate::project::{Project, ProjectInput};
use crate::verify::{VerifyOutput, execute, parse_artifact};
use anyhow::Context;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use camino::Utf8PathBuf;
use time::OffsetDateTime;
use trustgate_canon::{KeySource, encode_public_key};
use trustgate_types::{
    AttestationEnvelope, AttestationPayload, AttestationSubject, DecisionStatus, GateError,
    SCHEMA_ATTESTATION_V1,
};

#[derive(Clone, Debug)]
pub struct AttestInput<'a> {
    pub project: ProjectInput<'a>,
    pub artifact: &'a str,
    pub digest: Option<&'a str>,
    pub now: OffsetDateTime,
}

#[derive(Clone, Debug)]
pub struct WrittenAttestation {
    pub path: Utf8PathBuf,
    pub key_id: String,
    pub key_source: KeySource,
    pub results_hash: String,
}

#[derive(Clone, Debug)]
pub struct AttestOutput {
    pub verify: VerifyOutput,
    /// `None` when the verification failed; nothing is signed for a failing decision.
    pub written: Option<WrittenAttestation>,
}

pub fn run_attest(input: &AttestInput<'_>) -> anyhow::Result<AttestOutput> {
    let project = Project::open(&input.project)?;
    let artifact = parse_artifact(input.artifact, input.digest)?;
    let verify = execute(&project, artifact, None, input.now)?;

    if verify.decision.status == DecisionStatus::Fail {
        tracing::warn!(artifact = %verify.artifact, "verification failed, not attesting");
        return Ok(AttestOutput {
            verify,
            written: None,
        });
    }

    let view = trustgate_domain::results_view(&verify.decision, &verify.artifact, verify.mode);
    let results_hash = trustgate_canon::results_hash(&view).context("hash results view")?;

    let payload = AttestationPayload {
        subject: AttestationSubject {
            name: match verify.artifact.tag() {
                Some(tag) => format!("{}:{tag}", verify.artifact.name()),
                None => verify.artifact.name().to_string(),
            },
            digest: verify.artifact.digest().map(str::to_string),
        },
        results_hash: results_hash.clone(),
        status: verify.decision.status,
        issued_at: input.now,
    };
    let payload = serde_json::to_value(&payload).context("serialize attestation payload")?;
    let message = trustgate_canon::canonicalize(&payload).context("canonicalize payload")?;

    let (key, key_source) = trustgate_canon::resolve_signing_key(&project.key_channels())
        .map_err(|e| GateError::KeyResolution(e.to_string()))?;
    let signature = key.sign(&message);
    tracing::debug!(key_id = %key.key_id, source = %key_source, "signing attestation");

    let envelope = AttestationEnvelope {
        schema: SCHEMA_ATTESTATION_V1.to_string(),
        payload,
        key_id: key.key_id.clone(),
        public_key: encode_public_key(&key.public_key),
        signature: BASE64.encode(signature.to_bytes()),
    };

    let stem = format!(
        "{}-{}",
        input.now.unix_timestamp(),
        results_hash
            .trim_start_matches("sha256:")
            .chars()
            .take(12)
            .collect::<String>()
    );
    let dir = project.layout.attestations_dir();
    let path =
        trustgate_repo::write_attestation(&dir, &stem, &envelope).context("write attestation")?;

    Ok(AttestOutput {
        verify,
        written: Some(WrittenAttestation {
            path,
            key_id: key.key_id,
            key_source,
            results_hash,
        }),
    })
}
