//! Shared test utilities for the trustgate workspace.
//!
//! This crate exists because `xtask` and the CLI integration tests both need
//! `normalize_nondeterministic` outside of `#[cfg(test)]`.

use serde_json::Value;

pub const TIMESTAMP_PLACEHOLDER: &str = "__TIMESTAMP__";
pub const HASH_PLACEHOLDER: &str = "__RESULTS_HASH__";

/// Normalize non-deterministic JSON fields for golden-file comparison.
///
/// 1. **Recursive**: `timestamp` and `issuedAt` are replaced at any depth. Their placeholder
///    values cannot collide with real data.
/// 2. **Envelope only**: `payload.resultsHash` is replaced when the root looks like an
///    attestation envelope (`schema`, `payload`, `keyId`, `publicKey`, `signature`), because
///    it hashes a view that embeds wall-clock dependent findings. `signature` is replaced
///    with it, since it signs over the hash.
pub fn normalize_nondeterministic(mut value: Value) -> Value {
    if let Some(obj) = value.as_object_mut() {
        let is_envelope = ["schema", "payload", "keyId", "publicKey", "signature"]
            .iter()
            .all(|k| obj.contains_key(*k));
        if is_envelope {
            if let Some(payload) = obj.get_mut("payload").and_then(Value::as_object_mut)
                && payload.contains_key("resultsHash")
            {
                payload.insert(
                    "resultsHash".to_string(),
                    Value::String(HASH_PLACEHOLDER.to_string()),
                );
            }
            obj.insert(
                "signature".to_string(),
                Value::String("__SIGNATURE__".to_string()),
            );
        }
    }
    normalize_timestamps_recursive(&mut value);
    value
}

fn normalize_timestamps_recursive(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for key in ["timestamp", "issuedAt"] {
                if map.contains_key(key) {
                    map.insert(
                        key.to_string(),
                        Value::String(TIMESTAMP_PLACEHOLDER.to_string()),
                    );
                }
            }
            for val in map.values_mut() {
                normalize_timestamps_recursive(val);
            }
        }
        Value::Array(arr) => {
            for val in arr.iter_mut() {
                normalize_timestamps_recursive(val);
            }
        }
        _ => {}
    }
}

/// Deterministic ed25519 material. Never use outside tests.
#[cfg(feature = "crypto-fixtures")]
pub mod keys {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use ed25519_dalek::{Signer, SigningKey};
    use serde_json::Value;
    use trustgate_types::{AttestationEnvelope, SCHEMA_ATTESTATION_V1};

    const SEED: [u8; 32] = [7; 32];
    const OTHER_SEED: [u8; 32] = [9; 32];

    pub fn fixture_signing_key() -> SigningKey {
        SigningKey::from_bytes(&SEED)
    }

    /// A second key, for "untrusted signer" scenarios.
    pub fn other_signing_key() -> SigningKey {
        SigningKey::from_bytes(&OTHER_SEED)
    }

    /// The fixture key in the on-disk / environment secret encoding.
    pub fn fixture_secret() -> String {
        trustgate_canon::encode_secret(&fixture_signing_key())
    }

    pub fn fixture_key_id() -> String {
        trustgate_canon::key_id(fixture_signing_key().verifying_key().as_bytes())
    }

    /// Write the fixture key where a project's default key file lives.
    pub fn install_project_key(
        project_root: &std::path::Path,
    ) -> std::io::Result<std::path::PathBuf> {
        let path = project_root.join(trustgate_canon::keys::PROJECT_KEY_PATH);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, fixture_secret())?;
        Ok(path)
    }

    /// Envelope over `payload` signed by `key`, exactly as `attest` would write it.
    pub fn sign_envelope(key: &SigningKey, payload: Value) -> AttestationEnvelope {
        let message = trustgate_canon::canonicalize(&payload)
            .unwrap_or_else(|e| panic!("fixture payload does not canonicalize: {e}"));
        AttestationEnvelope {
            schema: SCHEMA_ATTESTATION_V1.to_string(),
            key_id: trustgate_canon::key_id(key.verifying_key().as_bytes()),
            public_key: trustgate_canon::encode_public_key(&key.verifying_key()),
            signature: BASE64.encode(key.sign(&message).to_bytes()),
            payload,
        }
    }
}
