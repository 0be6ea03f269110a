//! Canonicalization and identity.
//!
//! - [`canonicalize`]: RFC 8785 (JCS) byte serialization of any `Serialize` value
//! - [`results_hash`]: `sha256:<hex>` over canonical bytes, the value attestations bind to
//! - [`key_id`]: deterministic identifier for an ed25519 public key
//! - [`keys`]: signing-key resolution and generation
//!
//! Everything except [`keys`] is pure.

#![forbid(unsafe_code)]

mod jcs;
mod keyid;
pub mod keys;

pub use jcs::{CanonError, canonicalize, canonicalize_value, results_hash, sha256_digest};
pub use keyid::{KEY_ID_PREFIX, key_id};
pub use keys::{
    EnsureOutcome, KeyChannels, KeyError, KeyInfo, KeySource, decode_public_key, decode_secret,
    encode_public_key, encode_secret, ensure_signing_key, resolve_signing_key,
};
