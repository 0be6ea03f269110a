//! The `verify` and `promote` use cases.

use crate::project::{Project, ProjectInput};
use anyhow::Context;
use time::OffsetDateTime;
use trustgate_domain::VerifyRequest;
use trustgate_types::{ArtifactRef, Decision, DecisionStatus, GateError, PolicyMode};

#[derive(Clone, Debug)]
pub struct VerifyInput<'a> {
    pub project: ProjectInput<'a>,
    /// `name[:tag][@sha256:<hex>]`.
    pub artifact: &'a str,
    /// Digest for references that do not carry one.
    pub digest: Option<&'a str>,
    pub now: OffsetDateTime,
}

#[derive(Clone, Debug)]
pub struct VerifyOutput {
    pub artifact: ArtifactRef,
    pub mode: PolicyMode,
    /// Promotion target environment; `None` for a plain verify.
    pub target: Option<String>,
    pub decision: Decision,
    /// Set when enforce mode stopped the pipeline. The decision is already persisted.
    pub rejection: Option<GateError>,
    pub color: bool,
}

impl VerifyOutput {
    pub fn for_promotion(&self) -> bool {
        self.target.is_some()
    }

    pub fn exit_code(&self) -> i32 {
        status_exit_code(self.decision.status)
    }
}

/// `pass` → 0, `fail` → 1, `warn` → 2.
pub fn status_exit_code(status: DecisionStatus) -> i32 {
    match status {
        DecisionStatus::Pass => 0,
        DecisionStatus::Fail => 1,
        DecisionStatus::Warn => 2,
    }
}

pub fn run_verify(input: &VerifyInput<'_>) -> anyhow::Result<VerifyOutput> {
    let project = Project::open(&input.project)?;
    let artifact = parse_artifact(input.artifact, input.digest)?;
    execute(&project, artifact, None, input.now)
}

/// Verify with the attestation gate armed, for promotion to `target`.
pub fn run_promote(input: &VerifyInput<'_>, target: &str) -> anyhow::Result<VerifyOutput> {
    let target = target.trim();
    if target.is_empty() {
        anyhow::bail!("promotion target is empty");
    }
    let project = Project::open(&input.project)?;
    let artifact = parse_artifact(input.artifact, input.digest)?;
    execute(&project, artifact, Some(target.to_string()), input.now)
}

pub(crate) fn parse_artifact(reference: &str, digest: Option<&str>) -> anyhow::Result<ArtifactRef> {
    let artifact = ArtifactRef::parse(reference).context("invalid artifact reference")?;
    match digest {
        Some(d) => artifact.with_digest(d).context("invalid --digest"),
        None => Ok(artifact),
    }
}

pub(crate) fn execute(
    project: &Project,
    artifact: ArtifactRef,
    target: Option<String>,
    now: OffsetDateTime,
) -> anyhow::Result<VerifyOutput> {
    let cfg = project.gate_config()?;
    let evidence = project.evidence();
    let store = project.store();
    let mode = project.resolved.mode;

    let req = VerifyRequest {
        artifact: &artifact,
        for_promotion: target.is_some(),
        mode,
        now,
    };
    let (decision, rejection) = match trustgate_domain::verify(&cfg, &evidence, &store, &req) {
        Ok(decision) => (decision, None),
        Err(rejection) => {
            tracing::info!(gate = rejection.cause.gate(), "rejected: {}", rejection.cause);
            (*rejection.decision, Some(rejection.cause))
        }
    };

    if let Some(target) = &target {
        tracing::info!(
            artifact = %artifact,
            target,
            status = decision.status.as_str(),
            "promotion decision"
        );
    }

    Ok(VerifyOutput {
        artifact,
        mode,
        target,
        decision,
        rejection,
        color: project.resolved.color,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::{Utf8Path, Utf8PathBuf};
    use tempfile::TempDir;
    use time::macros::datetime;
    use trustgate_settings::Overrides;
    use trustgate_types::Severity;

    fn project_dir() -> (TempDir, Utf8PathBuf) {
        let tmp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf8 path");
        (tmp, root)
    }

    fn write(root: &Utf8Path, rel: &str, text: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(path, text).expect("write");
    }

    fn input<'a>(root: &'a Utf8Path, overrides: Overrides) -> VerifyInput<'a> {
        VerifyInput {
            project: ProjectInput {
                root,
                config: None,
                overrides,
            },
            artifact: "registry.local/app:1.0",
            digest: None,
            now: datetime!(2026-06-01 12:00:00 UTC),
        }
    }

    #[test]
    fn missing_sbom_rejects_and_persists() {
        let (_tmp, root) = project_dir();
        let out = run_verify(&input(&root, Overrides::default())).expect("run");

        assert_eq!(out.decision.status, DecisionStatus::Fail);
        assert_eq!(out.exit_code(), 1);
        assert!(matches!(out.rejection, Some(GateError::EvidenceUnavailable { .. })));
        let v = &out.decision.violations[0];
        assert_eq!((v.rule.as_str(), v.severity), ("sbom-required", Severity::Critical));

        let snap = trustgate_repo::read_snapshot(&root.join(".trustgate/state/last-decision.json"))
            .expect("read")
            .expect("persisted");
        assert_eq!(snap.image_ref, "registry.local/app:1.0");
        assert_eq!(snap.status, DecisionStatus::Fail);
    }

    #[test]
    fn clean_artifact_passes() {
        let (_tmp, root) = project_dir();
        write(&root, "sbom.json", "{}");
        let out = run_verify(&input(&root, Overrides::default())).expect("run");
        assert_eq!(out.decision.status, DecisionStatus::Pass);
        assert!(out.decision.allow);
        assert!(out.rejection.is_none());
        assert_eq!(out.exit_code(), 0);
    }

    #[test]
    fn warn_mode_reports_warn_status() {
        let (_tmp, root) = project_dir();
        write(&root, "sbom.json", "{}");
        write(
            &root,
            "violations.json",
            r#"[{"rule":"pinned-base","severity":"low","result":"fail","message":"mutable tag"}]"#,
        );
        write(
            &root,
            "trustgate.toml",
            "[policy]\nmode = \"warn\"\nprofile = \"lenient\"\n",
        );
        let out = run_verify(&input(&root, Overrides::default())).expect("run");
        assert_eq!(out.decision.status, DecisionStatus::Warn);
        assert!(out.decision.allow);
        assert_eq!(out.exit_code(), 2);
    }

    #[test]
    fn cli_mode_override_wins_over_file() {
        let (_tmp, root) = project_dir();
        write(&root, "trustgate.toml", "[policy]\nmode = \"enforce\"\n");
        let overrides = Overrides {
            mode: Some("warn".to_string()),
            ..Overrides::default()
        };
        let out = run_verify(&input(&root, overrides)).expect("run");
        assert_eq!(out.mode, PolicyMode::Warn);
        assert!(out.rejection.is_none());
        assert_eq!(out.decision.status, DecisionStatus::Fail);
    }

    #[test]
    fn promotion_without_attestations_fails() {
        let (_tmp, root) = project_dir();
        write(&root, "sbom.json", "{}");
        let out = run_promote(&input(&root, Overrides::default()), "production").expect("run");
        assert_eq!(out.decision.status, DecisionStatus::Fail);
        assert!(out.for_promotion());
        assert_eq!(
            out.rejection.as_ref().map(GateError::rules),
            Some(vec!["attestation-required-for-promotion".to_string()])
        );
    }

    #[test]
    fn broken_profile_is_a_tool_error() {
        let (_tmp, root) = project_dir();
        write(&root, "sbom.json", "{}");
        write(&root, "p.yaml", "schemaVersion: 1\nname: x\nbogus: true\n");
        let overrides = Overrides {
            profile: Some("p.yaml".to_string()),
            ..Overrides::default()
        };
        let err = run_verify(&input(&root, overrides)).unwrap_err();
        assert!(format!("{err:#}").contains("profile schema error"), "{err:#}");
    }

    #[test]
    fn digest_flag_is_attached() {
        let (_tmp, root) = project_dir();
        write(&root, "sbom.json", "{}");
        let digest = format!("sha256:{}", "a".repeat(64));
        let mut i = input(&root, Overrides::default());
        i.digest = Some(&digest);
        let out = run_verify(&i).expect("run");
        assert_eq!(out.artifact.digest(), Some(digest.as_str()));
    }

    #[test]
    fn missing_root_is_an_error() {
        let (_tmp, root) = project_dir();
        let missing = root.join("nope");
        assert!(run_verify(&input(&missing, Overrides::default())).is_err());
    }

    #[test]
    fn exit_codes() {
        assert_eq!(status_exit_code(DecisionStatus::Pass), 0);
        assert_eq!(status_exit_code(DecisionStatus::Fail), 1);
        assert_eq!(status_exit_code(DecisionStatus::Warn), 2);
    }
}
