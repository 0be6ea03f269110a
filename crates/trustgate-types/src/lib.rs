//! Stable DTOs and IDs used across the trustgate workspace.
//!
//! This crate is intentionally boring:
//! - data types for decisions, snapshots, waivers and attestations
//! - stable rule IDs and gate names
//! - the gate error taxonomy
//! - explain registry for remediation guidance

#![forbid(unsafe_code)]

pub mod artifact;
pub mod attestation;
pub mod decision;
pub mod error;
pub mod explain;
pub mod ids;
pub mod waiver;

pub use artifact::{ArtifactRef, ArtifactRefError};
pub use attestation::{
    Attestation, AttestationEnvelope, AttestationPayload, AttestationSource, AttestationSubject,
    SCHEMA_ATTESTATION_V1,
};
pub use decision::{
    Decision, DecisionSnapshot, DecisionStatus, PolicyMode, SCHEMA_DECISION_SNAPSHOT_V1, Severity,
    Violation, ViolationResult, rule_ids,
};
pub use error::GateError;
pub use explain::{ExamplePair, Explanation, lookup_explanation};
pub use waiver::{Waiver, WaiverExpiry, WaiverFile};
