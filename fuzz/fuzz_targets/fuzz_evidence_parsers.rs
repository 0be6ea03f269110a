//! Fuzz target for the on-disk evidence parsers (evaluator output, decision snapshots).
//!
//! Goal: these files are written by other tools and may be truncated or hand-edited;
//! parsing must return errors, never panic.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_evidence_parsers
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 256 * 1024 {
        return;
    }
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = trustgate_repo::fuzz::parse_violations(text);
        let _ = trustgate_repo::fuzz::parse_snapshot(text);
    }
});
