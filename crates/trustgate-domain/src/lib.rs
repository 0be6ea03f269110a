//! Pure gate evaluation (no IO).
//!
//! Input: an evidence source, a resolved gate configuration and the clock reading.
//! Output: a decision, persisted through the store capability before returning.

#![forbid(unsafe_code)]

pub mod attestation;
pub mod policy;
pub mod profile;
pub mod waiver;

mod engine;

#[cfg(test)]
mod proptest;
#[cfg(test)]
pub(crate) mod test_support;

pub use engine::{
    AttestationSet, DecisionStore, EvidenceSource, Rejection, ResultsView, VerifyRequest,
    ViolationProducer, finalize_status, results_view, verify,
};
