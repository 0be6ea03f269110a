use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// A time-bound, human-approved exemption for one rule.
///
/// The gate only reads waivers; their lifecycle is managed by people editing the waiver file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Waiver {
    pub rule_id: String,
    #[serde(default)]
    pub justification: String,
    /// RFC 3339 timestamp, or empty for a waiver that never expires.
    #[serde(default)]
    pub expiry: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
}

/// On-disk shape of the waiver file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WaiverFile {
    #[serde(default)]
    pub waivers: Vec<Waiver>,
}

/// Interpretation of a waiver's `expiry` field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaiverExpiry {
    Never,
    At(OffsetDateTime),
    Invalid,
}

impl Waiver {
    pub fn expiry_state(&self) -> WaiverExpiry {
        let raw = self.expiry.trim();
        if raw.is_empty() {
            return WaiverExpiry::Never;
        }
        match OffsetDateTime::parse(raw, &Rfc3339) {
            Ok(at) => WaiverExpiry::At(at),
            Err(_) => WaiverExpiry::Invalid,
        }
    }

    /// Expired iff `now` is strictly after the expiry. Unparsable expiry counts as expired.
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        match self.expiry_state() {
            WaiverExpiry::Never => false,
            WaiverExpiry::At(at) => now > at,
            WaiverExpiry::Invalid => true,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(OffsetDateTime::now_utc())
    }
}
