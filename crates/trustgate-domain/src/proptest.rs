//! Property-based tests for the domain crate.
//!
//! These tests use proptest to verify invariants around:
//! - profile resolution (identity without a profile, allow-list containment, case rules)
//! - decision consistency (`allow` agrees with status and blocking findings)
//! - waiver expiry classification

use crate::engine::{VerifyRequest, verify};
use crate::policy::{AttestationRequirements, GateConfig, Profile};
use crate::profile::resolve;
use crate::test_support::{MemoryStore, StaticEvidence, artifact, waiver};
use proptest::prelude::*;
use time::OffsetDateTime;
use time::macros::datetime;
use trustgate_types::{DecisionStatus, PolicyMode, Severity, Violation, ViolationResult};

const NOW: OffsetDateTime = datetime!(2026-06-01 12:00:00 UTC);

// ============================================================================
// Strategies
// ============================================================================

fn arb_severity() -> impl Strategy<Value = Severity> {
    prop::sample::select(Severity::ALL.to_vec())
}

fn arb_rule() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["no-root", "pinned-base", "Secrets", "cve-high", "label"])
        .prop_map(str::to_string)
}

fn arb_violation() -> impl Strategy<Value = Violation> {
    (arb_rule(), arb_severity(), any::<bool>()).prop_map(|(rule, severity, warn)| {
        let result = if warn {
            ViolationResult::Warn
        } else {
            ViolationResult::Fail
        };
        Violation::new(rule.clone(), severity, result, format!("{rule} finding"))
    })
}

fn arb_violations() -> impl Strategy<Value = Vec<Violation>> {
    prop::collection::vec(arb_violation(), 0..12)
}

/// Ignore tokens: rule names, or severity names in random case.
fn arb_ignore_token() -> impl Strategy<Value = String> {
    prop_oneof![
        arb_rule(),
        (arb_severity(), any::<bool>()).prop_map(|(s, upper)| {
            if upper {
                s.as_str().to_uppercase()
            } else {
                s.as_str().to_string()
            }
        }),
    ]
}

fn arb_profile() -> impl Strategy<Value = Profile> {
    (
        prop::collection::vec(arb_rule(), 0..3),
        prop::collection::vec(arb_ignore_token(), 0..4),
        any::<bool>(),
    )
        .prop_map(|(allow, ignore, warnings_show)| Profile {
            name: "generated".to_string(),
            description: String::new(),
            allow,
            ignore,
            warnings_show,
        })
}

// ============================================================================
// Resolver
// ============================================================================

proptest! {
    #[test]
    fn no_profile_is_identity(v in arb_violations()) {
        let r = resolve(None, &v);
        prop_assert_eq!(&r.violations, &v);
        prop_assert!(r.warnings.is_empty());
        prop_assert_eq!(r.allow, v.is_empty());
    }

    #[test]
    fn blocking_rules_are_within_allow_list(p in arb_profile(), v in arb_violations()) {
        let r = resolve(Some(&p), &v);
        if !p.allow.is_empty() {
            for b in r.violations.iter().chain(&r.warnings) {
                prop_assert!(p.allow.contains(&b.rule), "{} not in allow list", b.rule);
            }
        }
        prop_assert_eq!(r.allow, r.violations.is_empty());
    }

    #[test]
    fn resolution_partitions_without_inventing(p in arb_profile(), v in arb_violations()) {
        let r = resolve(Some(&p), &v);
        prop_assert!(r.violations.len() + r.warnings.len() <= v.len());
        if !p.warnings_show {
            prop_assert!(r.warnings.is_empty());
        }
        for out in r.violations.iter().chain(&r.warnings) {
            prop_assert!(v.contains(out));
        }
    }

    #[test]
    fn uppercase_severity_token_ignores(sev in arb_severity(), rule in arb_rule()) {
        let p = Profile {
            ignore: vec![sev.as_str().to_uppercase()],
            warnings_show: true,
            ..Profile::default()
        };
        let v = vec![Violation::new(rule, sev, ViolationResult::Fail, "m")];
        let r = resolve(Some(&p), &v);
        prop_assert!(r.violations.is_empty());
        prop_assert_eq!(r.warnings.len(), 1);
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

proptest! {
    #[test]
    fn allow_matches_blocking_state(
        sbom in any::<bool>(),
        v in arb_violations(),
        p in prop::option::of(arb_profile()),
        warn_mode in any::<bool>(),
    ) {
        let art = artifact();
        let cfg = GateConfig {
            profile: p,
            waivers: Vec::new(),
            attestation: AttestationRequirements::disabled(),
        };
        let mode = if warn_mode { PolicyMode::Warn } else { PolicyMode::Enforce };
        let ev = StaticEvidence::new(sbom).with_raw(v);
        let req = VerifyRequest { artifact: &art, for_promotion: true, mode, now: NOW };

        let decision = match verify(&cfg, &ev, &MemoryStore::default(), &req) {
            Ok(d) => d,
            Err(rejection) => {
                prop_assert_eq!(mode, PolicyMode::Enforce);
                *rejection.decision
            }
        };

        prop_assert_eq!(decision.allow, decision.violations.is_empty());
        prop_assert_eq!(decision.status == DecisionStatus::Fail, !decision.allow);
        if !sbom {
            prop_assert!(!decision.allow);
        }
        if mode == PolicyMode::Enforce {
            prop_assert_ne!(decision.status, DecisionStatus::Warn);
        }
    }

    #[test]
    fn expired_waiver_always_blocks(v in arb_violations(), warn_mode in any::<bool>()) {
        prop_assume!(!v.is_empty());
        let art = artifact();
        let cfg = GateConfig {
            profile: Some(Profile {
                ignore: Severity::ALL.iter().map(|s| s.as_str().to_string()).collect(),
                warnings_show: true,
                ..Profile::default()
            }),
            waivers: vec![waiver(&v[0].rule, "2000-01-01T00:00:00Z")],
            attestation: AttestationRequirements::disabled(),
        };
        let mode = if warn_mode { PolicyMode::Warn } else { PolicyMode::Enforce };
        let ev = StaticEvidence::new(true).with_raw(v.clone());
        let req = VerifyRequest { artifact: &art, for_promotion: false, mode, now: NOW };

        let decision = match verify(&cfg, &ev, &MemoryStore::default(), &req) {
            Ok(d) => d,
            Err(rejection) => *rejection.decision,
        };
        prop_assert_eq!(decision.status, DecisionStatus::Fail);
        prop_assert!(decision.violations.iter().any(|x| x.rule == v[0].rule));
    }
}
