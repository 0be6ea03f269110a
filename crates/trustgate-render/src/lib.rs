//! Rendering utilities for CI surfaces and terminals (Markdown, GitHub annotations, text).
//!
//! Renderers are pure: same model in, same string out. Terminal coloring is an explicit
//! option on the text renderer, never ambient state.

#![forbid(unsafe_code)]

mod gha;
mod markdown;
mod model;
mod text;

pub use gha::render_github_annotations;
pub use markdown::render_markdown;
pub use model::{RenderableDecision, RenderableFinding, RenderableSeverity, RenderableStatus};
pub use text::{TextOptions, render_text};
