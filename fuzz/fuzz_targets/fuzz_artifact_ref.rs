//! Fuzz target for artifact reference parsing.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_artifact_ref
//! ```

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use trustgate_types::ArtifactRef;

/// Structured input so libFuzzer spends time near the `name:tag@digest` shape.
#[derive(Arbitrary, Debug)]
struct RefInput {
    reference: String,
    digest: Option<String>,
}

fuzz_target!(|input: RefInput| {
    if input.reference.len() > 512 {
        return;
    }
    let Ok(parsed) = ArtifactRef::parse(&input.reference) else {
        return;
    };
    // The subject is the digest when there is one, otherwise the reference.
    match parsed.digest() {
        Some(d) => assert_eq!(parsed.subject(), d),
        None => assert_eq!(parsed.subject(), parsed.as_str()),
    }
    if let Some(digest) = input.digest {
        let _ = parsed.with_digest(&digest);
    }
});
