use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use trustgate_settings::{ResolvedPaths, TrustConfigV1};

pub const CONFIG_FILE: &str = "trustgate.toml";
const PROFILES_DIR: &str = ".trustgate/profiles";

/// Read the trust config. A missing file yields defaults; an explicit path must exist.
pub fn load_config(
    project_root: &Utf8Path,
    explicit: Option<&Utf8Path>,
) -> anyhow::Result<TrustConfigV1> {
    let path = match explicit {
        Some(p) => absolutize(project_root, p),
        None => project_root.join(CONFIG_FILE),
    };
    if explicit.is_none() && !path.exists() {
        tracing::debug!(path = %path, "no config file, using defaults");
        return Ok(TrustConfigV1::default());
    }
    let text = std::fs::read_to_string(&path).with_context(|| format!("read {path}"))?;
    trustgate_settings::parse_config_toml(&text).with_context(|| format!("parse {path}"))
}

/// Absolute locations of every project file the gate touches.
#[derive(Clone, Debug)]
pub struct ProjectLayout {
    root: Utf8PathBuf,
    paths: ResolvedPaths,
}

impl ProjectLayout {
    pub fn new(root: impl Into<Utf8PathBuf>, paths: ResolvedPaths) -> Self {
        Self {
            root: root.into(),
            paths,
        }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn sbom(&self) -> Utf8PathBuf {
        absolutize(&self.root, Utf8Path::new(&self.paths.sbom))
    }

    pub fn violations(&self) -> Utf8PathBuf {
        absolutize(&self.root, Utf8Path::new(&self.paths.violations))
    }

    pub fn waivers(&self) -> Utf8PathBuf {
        absolutize(&self.root, Utf8Path::new(&self.paths.waivers))
    }

    pub fn attestations_dir(&self) -> Utf8PathBuf {
        absolutize(&self.root, Utf8Path::new(&self.paths.attestations_dir))
    }

    pub fn state(&self) -> Utf8PathBuf {
        absolutize(&self.root, Utf8Path::new(&self.paths.state))
    }

    pub fn profiles_dir(&self) -> Utf8PathBuf {
        self.root.join(PROFILES_DIR)
    }

    /// Signing key file from the config, if any.
    pub fn signing_key(&self) -> Option<Utf8PathBuf> {
        self.paths
            .signing_key
            .as_deref()
            .map(|p| absolutize(&self.root, Utf8Path::new(p)))
    }

    pub fn resolve(&self, rel: &str) -> Utf8PathBuf {
        absolutize(&self.root, Utf8Path::new(rel))
    }
}

fn absolutize(root: &Utf8Path, p: &Utf8Path) -> Utf8PathBuf {
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        root.join(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn utf8_root(tmp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf8 path")
    }

    #[test]
    fn missing_default_config_is_defaults() {
        let tmp = TempDir::new().expect("temp dir");
        let cfg = load_config(&utf8_root(&tmp), None).expect("defaults");
        assert_eq!(cfg, TrustConfigV1::default());
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let tmp = TempDir::new().expect("temp dir");
        assert!(load_config(&utf8_root(&tmp), Some(Utf8Path::new("nope.toml"))).is_err());
    }

    #[test]
    fn config_is_parsed() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        std::fs::write(root.join(CONFIG_FILE), "[policy]\nmode = \"warn\"\n").expect("write");
        let cfg = load_config(&root, None).expect("parse");
        assert_eq!(cfg.policy.mode.as_deref(), Some("warn"));
    }

    #[test]
    fn relative_paths_are_joined_absolute_kept() {
        let paths = ResolvedPaths {
            sbom: "build/sbom.json".to_string(),
            violations: "/abs/violations.json".to_string(),
            waivers: ".trustgate/waivers.yaml".to_string(),
            attestations_dir: ".trustgate/attestations".to_string(),
            state: ".trustgate/state/last-decision.json".to_string(),
            signing_key: None,
        };
        let layout = ProjectLayout::new("/proj", paths);
        assert_eq!(layout.sbom(), Utf8PathBuf::from("/proj/build/sbom.json"));
        assert_eq!(layout.violations(), Utf8PathBuf::from("/abs/violations.json"));
        assert_eq!(
            layout.profiles_dir(),
            Utf8PathBuf::from("/proj/.trustgate/profiles")
        );
        assert!(layout.signing_key().is_none());
    }
}
