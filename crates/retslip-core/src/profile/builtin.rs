use crate::error::RetslipError;
use crate::profile::schema::ProfileDef;

const OUTSTANDING_RETURNS_JSON: &str =
    include_str!("../../../../profiles/outstanding-returns.json");

/// Available predefined profiles.
pub const PRESETS: &[&str] = &["outstanding-returns"];

pub const DEFAULT_PRESET: &str = "outstanding-returns";

/// Load a predefined profile by name.
pub fn load_preset(name: &str) -> Result<ProfileDef, RetslipError> {
    match name {
        "outstanding-returns" => {
            let profile: ProfileDef = serde_json::from_str(OUTSTANDING_RETURNS_JSON)?;
            Ok(profile)
        }
        _ => Err(RetslipError::ProfileInvalid(format!(
            "unknown preset '{}'. Available: {}",
            name,
            PRESETS.join(", ")
        ))),
    }
}

/// Raw JSON of a preset, for `profile show`.
pub fn preset_json(name: &str) -> Option<&'static str> {
    match name {
        "outstanding-returns" => Some(OUTSTANDING_RETURNS_JSON),
        _ => None,
    }
}
