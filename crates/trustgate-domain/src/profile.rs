//! Profile resolution: reclassify raw violations into blocking, warning or dropped.

use crate::policy::Profile;
use std::collections::BTreeSet;
use trustgate_types::{Severity, Violation};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Blocking findings.
    pub violations: Vec<Violation>,
    /// Demoted findings, kept only when the profile shows warnings.
    pub warnings: Vec<Violation>,
    /// True when nothing blocks.
    pub allow: bool,
}

/// Resolve raw violations against an optional profile.
///
/// Without a profile everything blocks. With one:
/// 1. a non-empty allow list drops every rule not on it
/// 2. a rule name or lowercased severity on the ignore list demotes the violation
///    (kept as a warning when `warnings_show`, dropped otherwise)
/// 3. everything else blocks
///
/// The raw `result` field is not consulted.
pub fn resolve(profile: Option<&Profile>, violations: &[Violation]) -> Resolution {
    let Some(profile) = profile else {
        return Resolution {
            violations: violations.to_vec(),
            warnings: Vec::new(),
            allow: violations.is_empty(),
        };
    };

    let allow_set: BTreeSet<&str> = profile.allow.iter().map(String::as_str).collect();
    let ignore = IgnoreSet::new(&profile.ignore);

    let mut out = Resolution::default();
    for v in violations {
        if !allow_set.is_empty() && !allow_set.contains(v.rule.as_str()) {
            continue;
        }
        if ignore.matches(v) {
            if profile.warnings_show {
                out.warnings.push(v.clone());
            }
            continue;
        }
        out.violations.push(v.clone());
    }
    out.allow = out.violations.is_empty();
    out
}

/// Ignore tokens split by kind: a token that names a severity matches case-insensitively,
/// every token also matches rule names exactly.
struct IgnoreSet<'a> {
    rules: BTreeSet<&'a str>,
    severities: BTreeSet<Severity>,
}

impl<'a> IgnoreSet<'a> {
    fn new(tokens: &'a [String]) -> Self {
        let rules = tokens.iter().map(String::as_str).collect();
        let severities = tokens.iter().filter_map(|t| Severity::parse(t)).collect();
        Self { rules, severities }
    }

    fn matches(&self, v: &Violation) -> bool {
        self.rules.contains(v.rule.as_str()) || self.severities.contains(&v.severity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{profile, raw};

    #[test]
    fn no_profile_everything_blocks() {
        let v = vec![raw("r1", Severity::Low)];
        let r = resolve(None, &v);
        assert_eq!(r.violations, v);
        assert!(r.warnings.is_empty());
        assert!(!r.allow);

        let r = resolve(None, &[]);
        assert!(r.allow);
    }

    #[test]
    fn allow_list_drops_unlisted_rules() {
        let p = profile(&["keep"], &[], true);
        let r = resolve(Some(&p), &[raw("keep", Severity::High), raw("other", Severity::High)]);
        assert_eq!(r.violations.len(), 1);
        assert_eq!(r.violations[0].rule, "keep");
        assert!(r.warnings.is_empty(), "dropped rules are not warnings");
    }

    #[test]
    fn ignore_by_severity_is_case_insensitive() {
        let p = profile(&[], &["LOW"], true);
        let r = resolve(Some(&p), &[raw("r", Severity::Low)]);
        assert!(r.violations.is_empty());
        assert_eq!(r.warnings.len(), 1);
        assert!(r.allow);
    }

    #[test]
    fn ignore_by_rule_is_case_sensitive() {
        let p = profile(&[], &["No-Root"], true);
        let r = resolve(Some(&p), &[raw("no-root", Severity::High)]);
        assert_eq!(r.violations.len(), 1);

        let p = profile(&[], &["no-root"], true);
        let r = resolve(Some(&p), &[raw("no-root", Severity::High)]);
        assert!(r.violations.is_empty());
    }

    #[test]
    fn hidden_warnings_are_dropped() {
        let p = profile(&[], &["medium"], false);
        let r = resolve(Some(&p), &[raw("r", Severity::Medium)]);
        assert!(r.violations.is_empty());
        assert!(r.warnings.is_empty());
        assert!(r.allow);
    }

    #[test]
    fn allow_list_applies_before_ignore() {
        let p = profile(&["a"], &["low"], true);
        let r = resolve(Some(&p), &[raw("a", Severity::Low), raw("b", Severity::Low)]);
        assert_eq!(r.warnings.len(), 1);
        assert_eq!(r.warnings[0].rule, "a");
    }

    #[test]
    fn order_is_preserved() {
        let v = vec![
            raw("c", Severity::High),
            raw("a", Severity::Critical),
            raw("b", Severity::Medium),
        ];
        let p = profile(&[], &[], true);
        let rules: Vec<_> = resolve(Some(&p), &v)
            .violations
            .into_iter()
            .map(|v| v.rule)
            .collect();
        assert_eq!(rules, vec!["c", "a", "b"]);
    }
}
