use crate::model::TrustConfigV1;
use anyhow::Context;
use std::collections::BTreeSet;
use std::time::Duration;
use trustgate_domain::policy::AttestationRequirements;
use trustgate_types::{AttestationSource, PolicyMode};

pub const DEFAULT_SBOM: &str = "sbom.json";
pub const DEFAULT_VIOLATIONS: &str = "violations.json";
pub const DEFAULT_WAIVERS: &str = ".trustgate/waivers.yaml";
pub const DEFAULT_ATTESTATIONS_DIR: &str = ".trustgate/attestations";
pub const DEFAULT_STATE: &str = ".trustgate/state/last-decision.json";
pub const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_REMOTE_RETRIES: u32 = 3;

/// Values from the command line. They win over the config file.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub mode: Option<String>,
    pub profile: Option<String>,
    pub color: Option<bool>,
}

/// How a profile was named. Loading happens in the I/O layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProfileSelector {
    /// A path to a profile file (contains a separator or ends in `.yaml`/`.yml`).
    Path(String),
    /// A name: `.trustgate/profiles/<name>.yaml`, then a built-in preset.
    Named(String),
}

impl ProfileSelector {
    pub fn parse(value: &str) -> Self {
        let v = value.trim();
        if v.contains('/') || v.contains('\\') || v.ends_with(".yaml") || v.ends_with(".yml") {
            ProfileSelector::Path(v.to_string())
        } else {
            ProfileSelector::Named(v.to_string())
        }
    }
}

/// Project-relative locations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub sbom: String,
    pub violations: String,
    pub waivers: String,
    pub attestations_dir: String,
    pub state: String,
    pub signing_key: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteSettings {
    pub url: String,
    pub timeout: Duration,
    pub retries: u32,
}

#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub mode: PolicyMode,
    pub profile: Option<ProfileSelector>,
    pub attestation: AttestationRequirements,
    pub remote: Option<RemoteSettings>,
    pub paths: ResolvedPaths,
    pub color: bool,
}

pub fn resolve_config(cfg: TrustConfigV1, overrides: Overrides) -> anyhow::Result<ResolvedConfig> {
    let mode = match overrides.mode.as_deref().or(cfg.policy.mode.as_deref()) {
        Some(m) => parse_mode(m).context("invalid policy mode")?,
        None => PolicyMode::Enforce,
    };

    let profile = overrides
        .profile
        .or(cfg.policy.profile)
        .filter(|p| !p.trim().is_empty())
        .map(|p| ProfileSelector::parse(&p));

    let a = cfg.attestation;
    let mut attestation = AttestationRequirements::default();
    if let Some(enabled) = a.enabled {
        attestation.enabled = enabled;
    }
    if let Some(min) = a.min_count {
        attestation.min_count = min;
    }
    if let Some(sources) = &a.sources {
        attestation.sources = parse_sources(sources)?;
    }
    if let Some(v) = a.require_digest_match {
        attestation.require_digest_match = v;
    }
    if let Some(v) = a.require_valid_schema {
        attestation.require_valid_schema = v;
    }
    if let Some(v) = a.require_results_hash_match {
        attestation.require_results_hash_match = v;
    }
    if let Some(m) = a.mode.as_deref() {
        attestation.mode = parse_mode(m).context("invalid attestation mode")?;
    }
    attestation.trusted_keys = a.trusted_keys.clone();
    for key in &attestation.trusted_keys {
        if !key.starts_with("ed25519:") {
            anyhow::bail!("trusted key `{key}` is not an ed25519 key ID");
        }
    }

    let remote = match a.remote_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => Some(RemoteSettings {
            url: url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(
                a.remote_timeout_secs.unwrap_or(DEFAULT_REMOTE_TIMEOUT_SECS),
            ),
            retries: a.remote_retries.unwrap_or(DEFAULT_REMOTE_RETRIES),
        }),
        _ => None,
    };
    if attestation.enabled
        && attestation.sources.contains(&AttestationSource::Remote)
        && remote.is_none()
    {
        anyhow::bail!("attestation source `remote` requires `remote_url`");
    }

    let paths = ResolvedPaths {
        sbom: cfg.evidence.sbom.unwrap_or_else(|| DEFAULT_SBOM.to_string()),
        violations: cfg
            .evidence
            .violations
            .unwrap_or_else(|| DEFAULT_VIOLATIONS.to_string()),
        waivers: cfg
            .waivers
            .path
            .unwrap_or_else(|| DEFAULT_WAIVERS.to_string()),
        attestations_dir: a
            .local_dir
            .unwrap_or_else(|| DEFAULT_ATTESTATIONS_DIR.to_string()),
        state: cfg.state.path.unwrap_or_else(|| DEFAULT_STATE.to_string()),
        signing_key: a.signing_key,
    };

    let color = overrides.color.or(cfg.output.color).unwrap_or(true);

    Ok(ResolvedConfig {
        mode,
        profile,
        attestation,
        remote,
        paths,
        color,
    })
}

fn parse_mode(v: &str) -> anyhow::Result<PolicyMode> {
    PolicyMode::parse(v)
        .ok_or_else(|| anyhow::anyhow!("unknown mode: {v} (expected 'enforce' or 'warn')"))
}

fn parse_sources(values: &[String]) -> anyhow::Result<BTreeSet<AttestationSource>> {
    values
        .iter()
        .map(|v| {
            AttestationSource::parse(v).ok_or_else(|| {
                anyhow::anyhow!("unknown attestation source: {v} (expected 'local' or 'remote')")
            })
        })
        .collect()
}
