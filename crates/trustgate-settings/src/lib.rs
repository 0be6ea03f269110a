//! Config parsing and profile/preset resolution.
//!
//! This crate is intentionally IO-free: it parses and resolves configuration provided as strings.

#![forbid(unsafe_code)]

mod model;
mod presets;
mod profile;
mod resolve;
mod waivers;

pub use model::{
    AttestationSection, EvidenceSection, OutputSection, PolicySection, StateSection,
    TrustConfigV1, WaiversSection,
};
pub use presets::{PRESET_NAMES, preset_profile};
pub use profile::{PROFILE_SCHEMA_VERSION, ProfileFileV1, parse_profile_yaml};
pub use resolve::{Overrides, ProfileSelector, RemoteSettings, ResolvedConfig, ResolvedPaths};
pub use waivers::parse_waivers_yaml;

/// Parse `trustgate.toml` (or equivalent) into a typed model.
pub fn parse_config_toml(input: &str) -> anyhow::Result<TrustConfigV1> {
    let cfg: TrustConfigV1 = toml::from_str(input)?;
    Ok(cfg)
}

/// Resolve the effective configuration (file values, then CLI overrides, over defaults).
pub fn resolve_config(cfg: TrustConfigV1, overrides: Overrides) -> anyhow::Result<ResolvedConfig> {
    resolve::resolve_config(cfg, overrides)
}
