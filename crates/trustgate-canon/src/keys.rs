//! Signing-key resolution.
//!
//! Keys are stored as base64 of the 64-byte ed25519 keypair (seed followed by public key).
//! Resolution order:
//! 1. inline secret (`TRUSTGATE_SIGNING_KEY`)
//! 2. key file named by `TRUSTGATE_SIGNING_KEY_FILE` (or the config)
//! 3. project key file `.trustgate/keys/signing.key`
//!
//! A resolved key is never cached; every signing operation resolves again.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use ed25519_dalek::{KEYPAIR_LENGTH, PUBLIC_KEY_LENGTH, Signature, Signer, SigningKey, VerifyingKey};
use std::fmt;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::keyid::key_id;

pub const ENV_SIGNING_KEY: &str = "TRUSTGATE_SIGNING_KEY";
pub const ENV_SIGNING_KEY_FILE: &str = "TRUSTGATE_SIGNING_KEY_FILE";
pub const PROJECT_KEY_PATH: &str = ".trustgate/keys/signing.key";

#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("no signing key found (tried: {})", .tried.join(", "))]
    NotFound { tried: Vec<String> },

    #[error("invalid key material from {origin}: {reason}")]
    Invalid { origin: String, reason: String },

    #[error("key file I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A resolved signing key with its derived identity.
pub struct KeyInfo {
    pub private_key: SigningKey,
    pub public_key: VerifyingKey,
    pub key_id: String,
}

impl KeyInfo {
    pub fn from_signing_key(private_key: SigningKey) -> Self {
        let public_key = private_key.verifying_key();
        let key_id = key_id(public_key.as_bytes());
        Self {
            private_key,
            public_key,
            key_id,
        }
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        self.private_key.sign(message)
    }
}

impl fmt::Debug for KeyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyInfo")
            .field("key_id", &self.key_id)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Where a resolved key came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeySource {
    InlineSecret,
    KeyFile(PathBuf),
    ProjectFile(PathBuf),
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySource::InlineSecret => write!(f, "${ENV_SIGNING_KEY}"),
            KeySource::KeyFile(p) => write!(f, "key file {}", p.display()),
            KeySource::ProjectFile(p) => write!(f, "project key {}", p.display()),
        }
    }
}

/// Key material channels, in precedence order.
#[derive(Clone, Debug, Default)]
pub struct KeyChannels {
    pub inline_secret: Option<String>,
    pub key_file: Option<PathBuf>,
    pub project_key_file: PathBuf,
}

impl KeyChannels {
    /// Channels for a project rooted at `project_root`, reading the two environment variables.
    pub fn from_env(project_root: &Path) -> Self {
        Self {
            inline_secret: std::env::var(ENV_SIGNING_KEY)
                .ok()
                .filter(|s| !s.trim().is_empty()),
            key_file: std::env::var_os(ENV_SIGNING_KEY_FILE)
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            project_key_file: project_key_path(project_root),
        }
    }

    /// Replace the file channel when no environment value was set.
    pub fn with_configured_key_file(mut self, path: Option<PathBuf>) -> Self {
        if self.key_file.is_none() {
            self.key_file = path;
        }
        self
    }
}

pub fn project_key_path(project_root: &Path) -> PathBuf {
    project_root.join(PROJECT_KEY_PATH)
}

/// Resolve the signing key from the first channel that is set.
///
/// A set channel with bad material is an error; it does not fall through to the next one.
pub fn resolve_signing_key(channels: &KeyChannels) -> Result<(KeyInfo, KeySource), KeyError> {
    if let Some(secret) = &channels.inline_secret {
        let key = decode_secret(secret).map_err(|reason| KeyError::Invalid {
            origin: format!("${ENV_SIGNING_KEY}"),
            reason,
        })?;
        tracing::debug!("signing key resolved from inline secret");
        return Ok((KeyInfo::from_signing_key(key), KeySource::InlineSecret));
    }

    if let Some(path) = &channels.key_file {
        let key = read_key_file(path)?;
        tracing::debug!(path = %path.display(), "signing key resolved from key file");
        return Ok((KeyInfo::from_signing_key(key), KeySource::KeyFile(path.clone())));
    }

    let project = &channels.project_key_file;
    if project.is_file() {
        let key = read_key_file(project)?;
        tracing::debug!(path = %project.display(), "signing key resolved from project key");
        return Ok((
            KeyInfo::from_signing_key(key),
            KeySource::ProjectFile(project.clone()),
        ));
    }

    Err(KeyError::NotFound {
        tried: vec![
            format!("${ENV_SIGNING_KEY}"),
            format!("${ENV_SIGNING_KEY_FILE}"),
            project.display().to_string(),
        ],
    })
}

/// Outcome of [`ensure_signing_key`].
#[derive(Debug)]
pub enum EnsureOutcome {
    Created(KeyInfo),
    Existing(KeyInfo),
}

impl EnsureOutcome {
    pub fn key(&self) -> &KeyInfo {
        match self {
            EnsureOutcome::Created(k) | EnsureOutcome::Existing(k) => k,
        }
    }

    pub fn created(&self) -> bool {
        matches!(self, EnsureOutcome::Created(_))
    }
}

/// Load the key at `path`, or generate one there if none exists.
///
/// An existing file is never overwritten, even if it does not parse. The new key is written
/// with owner-only permissions; the public half goes to `<path>.pub`.
pub fn ensure_signing_key(path: &Path) -> Result<EnsureOutcome, KeyError> {
    if path.exists() {
        let key = read_key_file(path)?;
        tracing::info!(path = %path.display(), "loaded existing signing key");
        return Ok(EnsureOutcome::Existing(KeyInfo::from_signing_key(key)));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| KeyError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let key = SigningKey::generate(&mut rand::rngs::OsRng);
    write_private(path, format!("{}\n", encode_secret(&key)).as_bytes())?;

    let pub_path = public_key_path(path);
    let public = format!("{}\n", encode_public_key(&key.verifying_key()));
    std::fs::write(&pub_path, public).map_err(|source| KeyError::Io {
        path: pub_path.clone(),
        source,
    })?;

    let info = KeyInfo::from_signing_key(key);
    tracing::info!(path = %path.display(), key_id = %info.key_id, "generated new signing key");
    Ok(EnsureOutcome::Created(info))
}

pub fn public_key_path(private_key_path: &Path) -> PathBuf {
    let mut os = private_key_path.as_os_str().to_owned();
    os.push(".pub");
    PathBuf::from(os)
}

pub fn encode_secret(key: &SigningKey) -> String {
    BASE64.encode(key.to_keypair_bytes())
}

/// Parse base64 of a 64-byte keypair. The embedded public half must match the seed.
pub fn decode_secret(text: &str) -> Result<SigningKey, String> {
    let bytes = BASE64
        .decode(text.trim())
        .map_err(|e| format!("not valid base64: {e}"))?;
    let bytes: [u8; KEYPAIR_LENGTH] = bytes.as_slice().try_into().map_err(|_| {
        format!(
            "expected {KEYPAIR_LENGTH} bytes of ed25519 keypair, got {}",
            bytes.len()
        )
    })?;
    SigningKey::from_keypair_bytes(&bytes).map_err(|e| format!("inconsistent keypair: {e}"))
}

pub fn encode_public_key(key: &VerifyingKey) -> String {
    BASE64.encode(key.as_bytes())
}

pub fn decode_public_key(text: &str) -> Result<VerifyingKey, String> {
    let bytes = BASE64
        .decode(text.trim())
        .map_err(|e| format!("not valid base64: {e}"))?;
    let bytes: [u8; PUBLIC_KEY_LENGTH] = bytes.as_slice().try_into().map_err(|_| {
        format!(
            "expected {PUBLIC_KEY_LENGTH} bytes of ed25519 public key, got {}",
            bytes.len()
        )
    })?;
    VerifyingKey::from_bytes(&bytes).map_err(|e| format!("invalid public key: {e}"))
}

fn read_key_file(path: &Path) -> Result<SigningKey, KeyError> {
    let text = std::fs::read_to_string(path).map_err(|source| KeyError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode_secret(&text).map_err(|reason| KeyError::Invalid {
        origin: path.display().to_string(),
        reason,
    })
}

fn write_private(path: &Path, contents: &[u8]) -> Result<(), KeyError> {
    let io_err = |source: std::io::Error| KeyError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path).map_err(io_err)?;
    file.write_all(contents).map_err(io_err)?;
    file.sync_all().map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::Verifier;

    fn fixed_key() -> SigningKey {
        SigningKey::from_bytes(&[42u8; 32])
    }

    fn channels(dir: &Path) -> KeyChannels {
        KeyChannels {
            inline_secret: None,
            key_file: None,
            project_key_file: project_key_path(dir),
        }
    }

    #[test]
    fn secret_round_trip_preserves_key_id() {
        let key = fixed_key();
        let decoded = decode_secret(&encode_secret(&key)).unwrap();
        assert_eq!(
            KeyInfo::from_signing_key(decoded).key_id,
            KeyInfo::from_signing_key(key).key_id
        );
    }

    #[test]
    fn secret_of_wrong_length_is_rejected() {
        let err = decode_secret(&BASE64.encode([1u8; 32])).unwrap_err();
        assert!(err.contains("expected 64 bytes"), "{err}");
    }

    #[test]
    fn secret_with_mismatched_public_half_is_rejected() {
        let mut bytes = fixed_key().to_keypair_bytes();
        bytes[63] ^= 0xff;
        assert!(decode_secret(&BASE64.encode(bytes)).is_err());
    }

    #[test]
    fn nothing_configured_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let err = resolve_signing_key(&channels(tmp.path())).unwrap_err();
        assert!(matches!(err, KeyError::NotFound { ref tried } if tried.len() == 3));
    }

    #[test]
    fn inline_secret_wins_over_files() {
        let tmp = tempfile::tempdir().unwrap();
        let project = project_key_path(tmp.path());
        ensure_signing_key(&project).unwrap();

        let inline = fixed_key();
        let mut ch = channels(tmp.path());
        ch.inline_secret = Some(encode_secret(&inline));

        let (info, source) = resolve_signing_key(&ch).unwrap();
        assert_eq!(source, KeySource::InlineSecret);
        assert_eq!(info.key_id, KeyInfo::from_signing_key(inline).key_id);
    }

    #[test]
    fn key_file_wins_over_project_file() {
        let tmp = tempfile::tempdir().unwrap();
        ensure_signing_key(&project_key_path(tmp.path())).unwrap();
        let other = tmp.path().join("other.key");
        let created = ensure_signing_key(&other).unwrap();

        let mut ch = channels(tmp.path());
        ch.key_file = Some(other.clone());
        let (info, source) = resolve_signing_key(&ch).unwrap();
        assert_eq!(source, KeySource::KeyFile(other));
        assert_eq!(info.key_id, created.key().key_id);
    }

    #[test]
    fn bad_inline_secret_does_not_fall_through() {
        let tmp = tempfile::tempdir().unwrap();
        ensure_signing_key(&project_key_path(tmp.path())).unwrap();
        let mut ch = channels(tmp.path());
        ch.inline_secret = Some("not base64!".to_string());
        assert!(matches!(
            resolve_signing_key(&ch),
            Err(KeyError::Invalid { .. })
        ));
    }

    #[test]
    fn ensure_creates_once_and_never_replaces() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("keys").join("signing.key");

        let first = ensure_signing_key(&path).unwrap();
        assert!(first.created());
        assert!(public_key_path(&path).is_file());

        let second = ensure_signing_key(&path).unwrap();
        assert!(!second.created());
        assert_eq!(first.key().key_id, second.key().key_id);
    }

    #[test]
    fn ensure_refuses_to_replace_unparsable_key() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("signing.key");
        std::fs::write(&path, "garbage").unwrap();
        assert!(ensure_signing_key(&path).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "garbage");
    }

    #[cfg(unix)]
    #[test]
    fn generated_key_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("signing.key");
        ensure_signing_key(&path).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn signature_verifies_with_public_half() {
        let info = KeyInfo::from_signing_key(fixed_key());
        let sig = info.sign(b"payload");
        let public = decode_public_key(&encode_public_key(&info.public_key)).unwrap();
        assert!(public.verify(b"payload", &sig).is_ok());
    }

    #[test]
    fn debug_redacts_private_key() {
        let shown = format!("{:?}", KeyInfo::from_signing_key(fixed_key()));
        assert!(shown.contains("<redacted>"));
        assert!(shown.contains("ed25519:"));
    }
}
