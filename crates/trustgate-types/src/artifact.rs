use std::fmt;

/// Error returned when an artifact reference or digest is malformed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ArtifactRefError {
    #[error("artifact reference is empty")]
    Empty,
    #[error("invalid digest `{0}` (expected sha256:<64 lowercase hex>)")]
    InvalidDigest(String),
    #[error("artifact reference `{reference}` carries digest {existing}, refusing to replace it with {requested}")]
    DigestConflict {
        reference: String,
        existing: String,
        requested: String,
    },
}

/// A build artifact reference: `name[:tag][@sha256:<hex>]`.
///
/// Normalization rules are intentionally simple:
/// - surrounding whitespace is trimmed
/// - a `:` only introduces a tag when it appears after the last `/` (registry ports stay in the
///   name)
/// - the digest, when present, must be a full sha256 digest
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ArtifactRef {
    reference: String,
    name: String,
    tag: Option<String>,
    digest: Option<String>,
}

impl ArtifactRef {
    pub fn parse(input: &str) -> Result<Self, ArtifactRefError> {
        let reference = input.trim();
        if reference.is_empty() {
            return Err(ArtifactRefError::Empty);
        }

        let (locator, digest) = match reference.split_once('@') {
            Some((locator, digest)) => (locator, Some(validate_digest(digest)?)),
            None => (reference, None),
        };
        if locator.is_empty() {
            return Err(ArtifactRefError::Empty);
        }

        let last_slash = locator.rfind('/').map(|i| i + 1).unwrap_or(0);
        let (name, tag) = match locator[last_slash..].rfind(':') {
            Some(i) => {
                let split = last_slash + i;
                (&locator[..split], Some(locator[split + 1..].to_string()))
            }
            None => (locator, None),
        };

        Ok(Self {
            reference: reference.to_string(),
            name: name.to_string(),
            tag: tag.filter(|t| !t.is_empty()),
            digest,
        })
    }

    /// Attach a digest resolved out-of-band. A matching digest is a no-op; a different one is
    /// refused.
    pub fn with_digest(mut self, digest: &str) -> Result<Self, ArtifactRefError> {
        let digest = validate_digest(digest)?;
        match &self.digest {
            Some(existing) if *existing != digest => Err(ArtifactRefError::DigestConflict {
                reference: self.reference.clone(),
                existing: existing.clone(),
                requested: digest,
            }),
            Some(_) => Ok(self),
            None => {
                self.reference = format!("{}@{}", self.reference, digest);
                self.digest = Some(digest);
                Ok(self)
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.reference
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    /// The stable subject identity: the digest when known, otherwise the reference itself.
    pub fn subject(&self) -> &str {
        self.digest.as_deref().unwrap_or(&self.reference)
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reference)
    }
}

fn validate_digest(digest: &str) -> Result<String, ArtifactRefError> {
    let hex = digest
        .strip_prefix("sha256:")
        .ok_or_else(|| ArtifactRefError::InvalidDigest(digest.to_string()))?;
    let valid = hex.len() == 64 && hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
    if !valid {
        return Err(ArtifactRefError::InvalidDigest(digest.to_string()));
    }
    Ok(digest.to_string())
}
