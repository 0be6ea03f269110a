use trustgate_domain::policy::Profile;

pub const PRESET_NAMES: &[&str] = &["lenient", "strict"];

/// Built-in profiles, used when no profile file with the same name exists.
///
/// Keep these small and readable. Anything complex belongs in a profile file.
pub fn preset_profile(name: &str) -> Option<Profile> {
    match name {
        "lenient" => Some(lenient()),
        "strict" => Some(strict()),
        _ => None,
    }
}

fn lenient() -> Profile {
    Profile {
        name: "lenient".to_string(),
        description: "low and informational findings are reported as warnings".to_string(),
        allow: Vec::new(),
        ignore: vec!["low".to_string(), "informational".to_string()],
        warnings_show: true,
    }
}

fn strict() -> Profile {
    Profile {
        name: "strict".to_string(),
        description: "every finding blocks".to_string(),
        allow: Vec::new(),
        ignore: Vec::new(),
        warnings_show: false,
    }
}
