use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use trustgate_domain::policy::Profile;
use trustgate_types::GateError;

pub const PROFILE_SCHEMA_VERSION: u32 = 1;

/// On-disk profile. Strict: unknown fields at any level are rejected.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProfileFileV1 {
    pub schema_version: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub policies: ProfilePolicies,
    #[serde(default)]
    pub violations: ProfileViolations,
    #[serde(default)]
    pub warnings: ProfileWarnings,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ProfilePolicies {
    #[serde(default)]
    pub allow: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ProfileViolations {
    #[serde(default)]
    pub ignore: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ProfileWarnings {
    #[serde(default)]
    pub show: bool,
}

impl ProfileFileV1 {
    pub fn into_profile(self) -> Result<Profile, GateError> {
        if self.schema_version != PROFILE_SCHEMA_VERSION {
            return Err(GateError::ProfileSchema(format!(
                "profile `{}` has schemaVersion {} (expected {PROFILE_SCHEMA_VERSION})",
                self.name, self.schema_version
            )));
        }
        if self.name.trim().is_empty() {
            return Err(GateError::ProfileSchema("profile name is empty".to_string()));
        }
        Ok(Profile {
            name: self.name,
            description: self.description,
            allow: self.policies.allow,
            ignore: self.violations.ignore,
            warnings_show: self.warnings.show,
        })
    }
}

/// Parse and validate a profile document.
pub fn parse_profile_yaml(input: &str) -> Result<Profile, GateError> {
    let file: ProfileFileV1 = serde_yaml::from_str(input)
        .map_err(|e| GateError::ProfileSchema(e.to_string()))?;
    file.into_profile()
}
