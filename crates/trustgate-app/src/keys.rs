//! Signing-key use cases.

use crate::project::{Project, ProjectInput};
use camino::Utf8PathBuf;
use trustgate_canon::KeySource;
use trustgate_types::GateError;

#[derive(Clone, Debug)]
pub struct KeysEnsureOutput {
    pub path: Utf8PathBuf,
    pub key_id: String,
    pub created: bool,
}

#[derive(Clone, Debug)]
pub struct KeyIdOutput {
    pub key_id: String,
    pub source: KeySource,
}

/// Generate a key pair at the configured (or project) key path unless one is already there.
pub fn run_keys_ensure(input: &ProjectInput<'_>) -> anyhow::Result<KeysEnsureOutput> {
    let project = Project::open(input)?;
    let path = project.key_path();
    let outcome = trustgate_canon::ensure_signing_key(path.as_std_path())
        .map_err(|e| GateError::KeyResolution(e.to_string()))?;
    Ok(KeysEnsureOutput {
        key_id: outcome.key().key_id.clone(),
        created: outcome.created(),
        path,
    })
}

/// Key ID of the key `attest` would sign with.
pub fn run_keys_id(input: &ProjectInput<'_>) -> anyhow::Result<KeyIdOutput> {
    let project = Project::open(input)?;
    let (key, source) = trustgate_canon::resolve_signing_key(&project.key_channels())
        .map_err(|e| GateError::KeyResolution(e.to_string()))?;
    Ok(KeyIdOutput {
        key_id: key.key_id,
        source,
    })
}
