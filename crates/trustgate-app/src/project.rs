use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use trustgate_canon::KeyChannels;
use trustgate_domain::policy::GateConfig;
use trustgate_repo::{
    FileDecisionStore, JsonViolationFile, ProjectEvidence, ProjectLayout, RemoteAttestations,
};
use trustgate_settings::{Overrides, ResolvedConfig};

/// Where the project lives and how the caller wants it configured.
#[derive(Clone, Debug)]
pub struct ProjectInput<'a> {
    /// Project root; relative paths in the config resolve against it.
    pub root: &'a Utf8Path,
    /// Explicit config path. `None` reads `trustgate.toml` under the root when present.
    pub config: Option<&'a Utf8Path>,
    pub overrides: Overrides,
}

/// A project with its configuration resolved.
#[derive(Clone, Debug)]
pub struct Project {
    pub resolved: ResolvedConfig,
    pub layout: ProjectLayout,
}

impl Project {
    pub fn open(input: &ProjectInput<'_>) -> anyhow::Result<Self> {
        if !input.root.is_dir() {
            anyhow::bail!("project root does not exist: {}", input.root);
        }
        let cfg = trustgate_repo::load_config(input.root, input.config).context("load config")?;
        let resolved = trustgate_settings::resolve_config(cfg, input.overrides.clone())
            .context("resolve config")?;
        let layout = ProjectLayout::new(input.root, resolved.paths.clone());
        tracing::debug!(root = %input.root, mode = resolved.mode.as_str(), "project opened");
        Ok(Self { resolved, layout })
    }

    /// Profile, waivers and attestation requirements. A broken profile fails closed; a
    /// broken waiver file degrades to no waivers.
    pub fn gate_config(&self) -> anyhow::Result<GateConfig> {
        let profile = match &self.resolved.profile {
            Some(selector) => {
                Some(trustgate_repo::load_profile(&self.layout, selector).context("load profile")?)
            }
            None => None,
        };
        Ok(GateConfig {
            profile,
            waivers: trustgate_repo::load_waivers(&self.layout.waivers()),
            attestation: self.resolved.attestation.clone(),
        })
    }

    pub fn evidence(&self) -> ProjectEvidence {
        let producer = Box::new(JsonViolationFile::new(self.layout.violations()));
        let remote = self.resolved.remote.clone().map(RemoteAttestations::new);
        ProjectEvidence::new(self.layout.clone(), producer, remote)
    }

    pub fn store(&self) -> FileDecisionStore {
        FileDecisionStore::new(self.layout.state())
    }

    /// Signing-key channels: environment first, then the configured key file, then the
    /// project key.
    pub fn key_channels(&self) -> KeyChannels {
        KeyChannels::from_env(self.layout.root().as_std_path())
            .with_configured_key_file(self.layout.signing_key().map(Utf8PathBuf::into_std_path_buf))
    }

    /// Where `keys ensure` writes: the configured key file, else the project key.
    pub fn key_path(&self) -> Utf8PathBuf {
        self.layout
            .signing_key()
            .unwrap_or_else(|| self.layout.resolve(trustgate_canon::keys::PROJECT_KEY_PATH))
    }
}
