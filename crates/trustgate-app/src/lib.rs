//! Use case orchestration for trustgate.
//!
//! This crate provides the application layer: use cases that coordinate the domain, repo,
//! and render layers. It is intentionally thin and delegates heavy lifting to those layers.
//!
//! The CLI crate depends on this; it only handles argument parsing, output and exit codes.

#![forbid(unsafe_code)]

mod attest;
mod explain;
mod keys;
mod project;
mod render;
mod verify;

pub use attest::{AttestInput, AttestOutput, WrittenAttestation, run_attest};
pub use explain::{
    ExplainOutput, format_explanation, format_last_decision, format_not_found, run_explain,
    run_explain_last,
};
pub use keys::{KeyIdOutput, KeysEnsureOutput, run_keys_ensure, run_keys_id};
pub use project::{Project, ProjectInput};
pub use render::{render_annotations, render_markdown, render_text, to_renderable};
pub use verify::{VerifyInput, VerifyOutput, run_promote, run_verify, status_exit_code};
