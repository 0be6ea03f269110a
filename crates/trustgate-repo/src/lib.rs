//! Repository adapters: project layout, evidence files, attestation sources, decision state.
//!
//! This crate is allowed to do filesystem and network IO. It should not spawn external
//! processes; digests must be supplied by the caller.

#![forbid(unsafe_code)]

mod attestations;
mod evidence;
mod layout;
mod profiles;
mod remote;
mod state;

pub use attestations::{LocalAttestations, write_attestation};
pub use evidence::{JsonViolationFile, ProjectEvidence, load_waivers};
pub use layout::{CONFIG_FILE, ProjectLayout, load_config};
pub use profiles::load_profile;
pub use remote::{FetchError, RemoteAttestations, fetch_with_retry};
pub use state::{FileDecisionStore, read_snapshot, write_atomic};

/// Fuzz-friendly API for testing parsing robustness without filesystem access.
/// These functions are designed to never panic on any input.
pub mod fuzz {
    /// Parse arbitrary text as a decision snapshot.
    pub fn parse_snapshot(text: &str) -> anyhow::Result<()> {
        let _ = crate::state::parse_snapshot(text)?;
        Ok(())
    }

    /// Parse arbitrary text as evaluator output.
    pub fn parse_violations(text: &str) -> anyhow::Result<()> {
        let _ = crate::evidence::parse_violations(text)?;
        Ok(())
    }
}
