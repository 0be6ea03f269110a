//! Waiver gate.
//!
//! A waiver is materially active when some raw violation carries its `rule_id`. Waivers for
//! rules nobody reported are ignored, expired or not.

use time::OffsetDateTime;
use trustgate_types::{Violation, ViolationResult, Waiver, WaiverExpiry};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WaiverOutcome {
    /// One critical violation per rule with an expired (or unparsable) active waiver.
    pub expired: Vec<Violation>,
    /// Raw violations covered by a current waiver, demoted to warnings.
    pub exempted: Vec<Violation>,
    /// Raw violations left for the policy gate.
    pub remaining: Vec<Violation>,
}

impl WaiverOutcome {
    pub fn expired_rules(&self) -> Vec<String> {
        self.expired.iter().map(|v| v.rule.clone()).collect()
    }
}

pub fn apply_waivers(waivers: &[Waiver], raw: &[Violation], now: OffsetDateTime) -> WaiverOutcome {
    let mut out = WaiverOutcome::default();

    for w in waivers {
        if !raw.iter().any(|v| v.rule == w.rule_id) {
            continue;
        }
        if w.is_expired_at(now) && !out.expired.iter().any(|v| v.rule == w.rule_id) {
            out.expired.push(Violation::critical(
                w.rule_id.clone(),
                expired_message(w),
            ));
        }
    }

    for v in raw {
        let current = waivers
            .iter()
            .find(|w| w.rule_id == v.rule && !w.is_expired_at(now));
        match current {
            Some(w) => out.exempted.push(Violation::new(
                v.rule.clone(),
                v.severity,
                ViolationResult::Warn,
                waived_message(v, w),
            )),
            None => out.remaining.push(v.clone()),
        }
    }

    out
}

fn expired_message(w: &Waiver) -> String {
    let expiry = if w.expiry.trim().is_empty() {
        "<none>"
    } else {
        w.expiry.trim()
    };
    match w.expiry_state() {
        WaiverExpiry::Invalid => format!(
            "waiver for `{}` has an unparsable expiry `{expiry}` and provides no exemption",
            w.rule_id
        ),
        _ => format!("waiver for `{}` expired at {expiry}", w.rule_id),
    }
}

fn waived_message(v: &Violation, w: &Waiver) -> String {
    let mut msg = format!("{} (waived: {}", v.message, w.justification);
    if let Some(by) = &w.approved_by {
        msg.push_str(&format!(", approved by {by}"));
    }
    if !w.expiry.trim().is_empty() {
        msg.push_str(&format!(", until {}", w.expiry.trim()));
    }
    msg.push(')');
    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{raw, waiver};
    use time::macros::datetime;
    use trustgate_types::Severity;

    const NOW: OffsetDateTime = datetime!(2026-06-01 12:00:00 UTC);

    #[test]
    fn unreferenced_waivers_are_ignored() {
        let out = apply_waivers(
            &[waiver("unused", "2000-01-01T00:00:00Z")],
            &[raw("r", Severity::High)],
            NOW,
        );
        assert!(out.expired.is_empty());
        assert!(out.exempted.is_empty());
        assert_eq!(out.remaining.len(), 1);
    }

    #[test]
    fn expired_active_waiver_emits_critical_keyed_by_rule() {
        let out = apply_waivers(
            &[waiver("r", "2026-05-31T00:00:00Z")],
            &[raw("r", Severity::Low), raw("r", Severity::Low)],
            NOW,
        );
        assert_eq!(out.expired.len(), 1);
        assert_eq!(out.expired[0].rule, "r");
        assert_eq!(out.expired[0].severity, Severity::Critical);
        assert_eq!(out.expired[0].result, ViolationResult::Fail);
        assert_eq!(out.remaining.len(), 2, "expired waivers exempt nothing");
    }

    #[test]
    fn unparsable_expiry_counts_as_expired() {
        let out = apply_waivers(&[waiver("r", "not-a-date")], &[raw("r", Severity::Low)], NOW);
        assert_eq!(out.expired_rules(), vec!["r"]);
        assert!(out.expired[0].message.contains("unparsable"));
    }

    #[test]
    fn current_waiver_demotes_to_warning() {
        let mut w = waiver("r", "");
        w.approved_by = Some("sec".to_string());
        let out = apply_waivers(&[w], &[raw("r", Severity::High), raw("x", Severity::High)], NOW);
        assert!(out.expired.is_empty());
        assert_eq!(out.exempted.len(), 1);
        assert_eq!(out.exempted[0].result, ViolationResult::Warn);
        assert!(out.exempted[0].message.contains("approved by sec"));
        assert_eq!(out.remaining.len(), 1);
        assert_eq!(out.remaining[0].rule, "x");
    }

    #[test]
    fn expiry_boundary_is_strict() {
        let w = waiver("r", "2026-06-01T12:00:00Z");
        let out = apply_waivers(std::slice::from_ref(&w), &[raw("r", Severity::Low)], NOW);
        assert!(out.expired.is_empty(), "not expired at the exact instant");

        let later = NOW + time::Duration::seconds(1);
        let out = apply_waivers(&[w], &[raw("r", Severity::Low)], later);
        assert_eq!(out.expired.len(), 1);
    }
}
