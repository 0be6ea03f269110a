//! Fuzz target for the profile YAML parser.
//!
//! Goal: profile parsing should **never panic**. Malformed documents, unknown fields and
//! wrong schema versions must come back as `ProfileSchema` errors.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_profile_parser
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 64 * 1024 {
        return;
    }
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(profile) = trustgate_settings::parse_profile_yaml(text) {
            assert!(!profile.name.trim().is_empty());
        }
    }
});
