//! Fuzz target for JSON canonicalization.
//!
//! Any document serde_json accepts must canonicalize without panicking, and the canonical
//! bytes must be valid JSON that canonicalizes to itself.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_canonicalize
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 64 * 1024 {
        return;
    }
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let Ok(canonical) = trustgate_canon::canonicalize(&value) else {
        return;
    };
    let reparsed: serde_json::Value =
        serde_json::from_slice(&canonical).expect("canonical output is JSON");
    let again = trustgate_canon::canonicalize(&reparsed).expect("canonical output canonicalizes");
    assert_eq!(canonical, again);
});
