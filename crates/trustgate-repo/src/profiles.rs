use crate::layout::ProjectLayout;
use camino::Utf8Path;
use trustgate_domain::policy::Profile;
use trustgate_settings::{PRESET_NAMES, ProfileSelector, parse_profile_yaml, preset_profile};
use trustgate_types::GateError;

/// Resolve a profile selector to a validated profile.
///
/// Names look in the project's profiles directory first and fall back to the built-in
/// presets, so a project can shadow `strict` or `lenient` with its own file.
pub fn load_profile(
    layout: &ProjectLayout,
    selector: &ProfileSelector,
) -> Result<Profile, GateError> {
    match selector {
        ProfileSelector::Path(p) => read_profile(&layout.resolve(p)),
        ProfileSelector::Named(name) => {
            let dir = layout.profiles_dir();
            for ext in ["yaml", "yml"] {
                let candidate = dir.join(format!("{name}.{ext}"));
                if candidate.is_file() {
                    return read_profile(&candidate);
                }
            }
            preset_profile(name).ok_or_else(|| {
                GateError::ProfileSchema(format!(
                    "unknown profile `{name}`: no {dir}/{name}.yaml and no preset (presets: {})",
                    PRESET_NAMES.join(", ")
                ))
            })
        }
    }
}

fn read_profile(path: &Utf8Path) -> Result<Profile, GateError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| GateError::ProfileSchema(format!("read {path}: {e}")))?;
    let profile = parse_profile_yaml(&text)
        .map_err(|e| GateError::ProfileSchema(format!("{path}: {}", detail(e))))?;
    tracing::debug!(path = %path, profile = %profile.name, "loaded profile");
    Ok(profile)
}

fn detail(e: GateError) -> String {
    match e {
        GateError::ProfileSchema(m) => m,
        other => other.to_string(),
    }
}
