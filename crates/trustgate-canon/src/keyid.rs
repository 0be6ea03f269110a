use data_encoding::BASE32_NOPAD;
use sha2::{Digest, Sha256};

pub const KEY_ID_PREFIX: &str = "ed25519:";

const KEY_ID_HASH_CHARS: usize = 26;

/// `ed25519:` followed by the first 26 lowercase base32 characters of SHA-256(public key).
///
/// The result is always 34 characters, with `[a-z2-7]` after the prefix.
pub fn key_id(public_key: &[u8]) -> String {
    let digest = Sha256::digest(public_key);
    let encoded = BASE32_NOPAD.encode(digest.as_slice()).to_ascii_lowercase();
    format!("{KEY_ID_PREFIX}{}", &encoded[..KEY_ID_HASH_CHARS])
}
