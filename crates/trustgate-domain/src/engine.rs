use crate::attestation::{self, ThresholdOutcome};
use crate::policy::GateConfig;
use crate::profile;
use crate::waiver::apply_waivers;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeSet;
use std::fmt;
use time::OffsetDateTime;
use trustgate_types::{
    ArtifactRef, Attestation, AttestationSource, Decision, DecisionSnapshot, DecisionStatus,
    GateError, PolicyMode, Severity, Violation, ViolationResult, ids, rule_ids,
};

/// The external rule evaluator, reduced to one capability.
pub trait ViolationProducer {
    fn produce(&self, artifact: &ArtifactRef) -> Result<Vec<Violation>, String>;
}

/// Attestations gathered from the requested sources, plus notes about sources that degraded.
#[derive(Clone, Debug, Default)]
pub struct AttestationSet {
    pub attestations: Vec<Attestation>,
    pub notes: Vec<String>,
}

/// Evidence is pulled lazily so that a fail-fast run never touches later sources.
pub trait EvidenceSource {
    fn sbom_present(&self, artifact: &ArtifactRef) -> bool;
    fn raw_violations(&self, artifact: &ArtifactRef) -> Result<Vec<Violation>, String>;
    fn attestations(
        &self,
        artifact: &ArtifactRef,
        sources: &BTreeSet<AttestationSource>,
    ) -> AttestationSet;
}

pub trait DecisionStore {
    fn save(&self, snapshot: &DecisionSnapshot) -> Result<(), GateError>;
}

#[derive(Clone, Copy, Debug)]
pub struct VerifyRequest<'a> {
    pub artifact: &'a ArtifactRef,
    pub for_promotion: bool,
    pub mode: PolicyMode,
    pub now: OffsetDateTime,
}

/// An enforce-mode stop. The decision has already been persisted.
#[derive(Debug)]
pub struct Rejection {
    pub decision: Box<Decision>,
    pub cause: GateError,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} gate rejected artifact: {}", self.cause.gate(), self.cause)
    }
}

impl std::error::Error for Rejection {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

/// The value an attestation's `resultsHash` binds to.
///
/// Excludes the timestamp, the input summary and every attestation field, so the same
/// findings hash identically on `attest` and on a later `promote`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsView<'a> {
    pub subject: &'a str,
    pub sbom_present: bool,
    pub status: DecisionStatus,
    pub violations: &'a [Violation],
    pub warnings: &'a [Violation],
}

pub fn results_view<'a>(
    decision: &'a Decision,
    artifact: &'a ArtifactRef,
    mode: PolicyMode,
) -> ResultsView<'a> {
    ResultsView {
        subject: artifact.subject(),
        sbom_present: decision.sbom_present,
        status: finalize_status(&decision.violations, &decision.warnings, mode),
        violations: &decision.violations,
        warnings: &decision.warnings,
    }
}

/// `fail` with any blocking finding; `warn` only for non-blocking findings under warn mode.
pub fn finalize_status(
    violations: &[Violation],
    warnings: &[Violation],
    mode: PolicyMode,
) -> DecisionStatus {
    if !violations.is_empty() {
        DecisionStatus::Fail
    } else if mode == PolicyMode::Warn && !warnings.is_empty() {
        DecisionStatus::Warn
    } else {
        DecisionStatus::Pass
    }
}

/// Run the gate pipeline: SBOM, waivers, policy, attestations (promotion only), finalize, persist.
///
/// In enforce mode the first blocking gate stops the pipeline and the partial decision is
/// returned inside [`Rejection`]. In warn mode every gate runs and the decision is returned
/// whatever its status.
pub fn verify(
    cfg: &GateConfig,
    evidence: &dyn EvidenceSource,
    store: &dyn DecisionStore,
    req: &VerifyRequest<'_>,
) -> Result<Decision, Rejection> {
    let mut run = Run::new(cfg, store, req);

    // SBOM
    run.decision.sbom_present = evidence.sbom_present(req.artifact);
    tracing::debug!(gate = ids::GATE_SBOM, present = run.decision.sbom_present, "gate");
    if !run.decision.sbom_present {
        run.decision.violations.push(Violation::critical(
            ids::RULE_SBOM_REQUIRED,
            format!("no SBOM found for {}", req.artifact),
        ));
        run.stop_if_enforcing(GateError::EvidenceUnavailable {
            rule: ids::RULE_SBOM_REQUIRED.to_string(),
            detail: format!("no SBOM found for {}", req.artifact),
        })?;
    }

    // Waivers
    let raw = evidence.raw_violations(req.artifact);
    let raw_slice = raw.as_deref().unwrap_or_default();
    let waived = apply_waivers(&cfg.waivers, raw_slice, req.now);
    tracing::debug!(
        gate = ids::GATE_WAIVER,
        expired = waived.expired.len(),
        exempted = waived.exempted.len(),
        "gate"
    );
    let expired_rules = waived.expired_rules();
    run.decision.violations.extend(waived.expired);
    run.decision.warnings.extend(waived.exempted);
    if !expired_rules.is_empty() {
        run.stop_if_enforcing(GateError::WaiverExpired {
            rules: expired_rules,
        })?;
    }

    // Policy
    let resolved = profile::resolve(cfg.profile.as_ref(), &waived.remaining);
    tracing::debug!(
        gate = ids::GATE_POLICY,
        blocking = resolved.violations.len(),
        warnings = resolved.warnings.len(),
        "gate"
    );
    let mut blocking_rules = rule_ids(&resolved.violations);
    run.decision.violations.extend(resolved.violations);
    run.decision.warnings.extend(resolved.warnings);
    if let Err(detail) = &raw {
        tracing::warn!(error = %detail, "rule evaluator failed");
        run.decision.violations.push(Violation::critical(
            ids::RULE_TOOL_RUNTIME,
            format!("rule evaluator failed: {detail}"),
        ));
        blocking_rules.push(ids::RULE_TOOL_RUNTIME.to_string());
    }
    if !blocking_rules.is_empty() {
        run.stop_if_enforcing(GateError::PolicyViolation {
            rules: blocking_rules,
        })?;
    }

    // Attestations
    let requirements = &cfg.attestation;
    if req.for_promotion && requirements.enabled {
        let outcome = run.attestation_gate(evidence);
        tracing::debug!(
            gate = ids::GATE_ATTESTATION,
            met = outcome.met,
            valid = outcome.valid.len(),
            required = outcome.required,
            "gate"
        );
        run.decision.attestations_considered = outcome.valid.clone();
        if !outcome.met {
            let message = format!("attestation threshold unmet: {}", outcome.summary());
            if requirements.mode == PolicyMode::Warn {
                run.decision.warnings.push(Violation::new(
                    ids::RULE_ATTESTATION_REQUIRED,
                    Severity::Critical,
                    ViolationResult::Warn,
                    message,
                ));
            } else {
                run.decision
                    .violations
                    .push(Violation::critical(ids::RULE_ATTESTATION_REQUIRED, message));
                run.stop_if_enforcing(GateError::AttestationThresholdUnmet {
                    rule: ids::RULE_ATTESTATION_REQUIRED.to_string(),
                    required: outcome.required,
                    valid: outcome.valid_count(),
                })?;
            }
        }
    } else if req.for_promotion {
        tracing::debug!(gate = ids::GATE_ATTESTATION, "attestation requirements disabled");
    }

    Ok(run.conclude())
}

struct Run<'a> {
    cfg: &'a GateConfig,
    store: &'a dyn DecisionStore,
    req: &'a VerifyRequest<'a>,
    decision: Decision,
}

impl<'a> Run<'a> {
    fn new(cfg: &'a GateConfig, store: &'a dyn DecisionStore, req: &'a VerifyRequest<'a>) -> Self {
        let mut decision = Decision::begin(req.now);
        decision.input = json!({
            "artifact": req.artifact.as_str(),
            "digest": req.artifact.digest(),
            "forPromotion": req.for_promotion,
            "mode": req.mode.as_str(),
            "profile": cfg.profile.as_ref().map(|p| p.name.as_str()),
            "waivers": cfg.waivers.len(),
        });
        Self {
            cfg,
            store,
            req,
            decision,
        }
    }

    fn attestation_gate(&self, evidence: &dyn EvidenceSource) -> ThresholdOutcome {
        let requirements = &self.cfg.attestation;
        let view = results_view(&self.decision, self.req.artifact, self.req.mode);
        let hash = match trustgate_canon::results_hash(&view) {
            Ok(h) => Some(h),
            Err(e) => {
                tracing::warn!(error = %e, "could not hash decision results");
                None
            }
        };

        let set = evidence.attestations(self.req.artifact, &requirements.sources);
        let mut outcome = attestation::evaluate(
            requirements,
            &set.attestations,
            self.req.artifact.digest(),
            hash.as_deref(),
        );
        outcome.notes.extend(set.notes);
        outcome
    }

    fn stop_if_enforcing(&mut self, cause: GateError) -> Result<(), Rejection> {
        if self.req.mode == PolicyMode::Warn {
            tracing::debug!(
                gate = cause.gate(),
                "blocking finding recorded, continuing (warn mode)"
            );
            return Ok(());
        }
        let decision = std::mem::replace(&mut self.decision, Decision::begin(self.req.now));
        let decision = self.finish(decision);
        tracing::info!(gate = cause.gate(), rules = ?cause.rules(), "artifact rejected");
        Err(Rejection {
            decision: Box::new(decision),
            cause,
        })
    }

    fn conclude(self) -> Decision {
        let decision = self.decision.clone();
        let decision = self.finish(decision);
        tracing::info!(
            artifact = %self.req.artifact,
            status = decision.status.as_str(),
            "decision"
        );
        decision
    }

    fn finish(&self, mut decision: Decision) -> Decision {
        decision.status = finalize_status(&decision.violations, &decision.warnings, self.req.mode);
        decision.allow = decision.violations.is_empty();

        let snapshot = DecisionSnapshot::new(self.req.artifact.as_str(), &decision);
        if let Err(e) = self.store.save(&snapshot) {
            tracing::warn!(error = %e, "decision not persisted");
        }
        decision
    }
}
