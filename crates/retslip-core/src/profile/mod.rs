pub mod builtin;
pub mod schema;

use crate::error::RetslipError;
use schema::ProfileDef;
use std::path::Path;

/// Load a profile from a JSON file.
pub fn load_profile(path: &Path) -> Result<ProfileDef, RetslipError> {
    let content = std::fs::read_to_string(path).map_err(|e| RetslipError::ProfileLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_profile(&content, path)
}

/// Parse a profile from a JSON string.
pub fn parse_profile(json: &str, source: &Path) -> Result<ProfileDef, RetslipError> {
    let profile: ProfileDef = serde_json::from_str(json).map_err(|e| RetslipError::ProfileLoad {
        path: source.to_path_buf(),
        reason: e.to_string(),
    })?;
    validate_profile(&profile)?;
    Ok(profile)
}

/// Parse a profile from a JSON string (no file path context).
pub fn parse_profile_str(json: &str) -> Result<ProfileDef, RetslipError> {
    let profile: ProfileDef = serde_json::from_str(json).map_err(RetslipError::Json)?;
    validate_profile(&profile)?;
    Ok(profile)
}

/// Validate that a profile is well-formed.
pub fn validate_profile(profile: &ProfileDef) -> Result<(), RetslipError> {
    if profile.slip_prefix.is_empty() || !profile.slip_prefix.chars().all(|c| c.is_ascii_digit())
    {
        return Err(RetslipError::ProfileInvalid(format!(
            "slip_prefix '{}' must be a non-empty run of digits",
            profile.slip_prefix
        )));
    }

    if profile.slip_prefix.len() + profile.slip_suffix_digits != 12 {
        return Err(RetslipError::ProfileInvalid(format!(
            "slip numbers must have 12 digits, got prefix of {} + {} suffix digits",
            profile.slip_prefix.len(),
            profile.slip_suffix_digits
        )));
    }

    if profile.state_codes.is_empty() {
        return Err(RetslipError::ProfileInvalid(
            "state_codes must not be empty".into(),
        ));
    }

    if !profile.state_codes.contains(&profile.default_state_code) {
        return Err(RetslipError::ProfileInvalid(format!(
            "default_state_code '{}' is not one of state_codes",
            profile.default_state_code
        )));
    }

    if profile.tablet_suffixes.is_empty()
        || !profile
            .tablet_suffixes
            .chars()
            .all(|c| c.is_ascii_alphabetic())
    {
        return Err(RetslipError::ProfileInvalid(format!(
            "tablet_suffixes '{}' must be a non-empty set of ASCII letters",
            profile.tablet_suffixes
        )));
    }

    if profile.jobsite_lead_digit.len() != 1
        || !profile.jobsite_lead_digit.chars().all(|c| c.is_ascii_digit())
    {
        return Err(RetslipError::ProfileInvalid(format!(
            "jobsite_lead_digit '{}' must be a single digit",
            profile.jobsite_lead_digit
        )));
    }

    if profile.jobsite_digits < 2 {
        return Err(RetslipError::ProfileInvalid(
            "jobsite_digits must be at least 2".into(),
        ));
    }

    if profile.collapse_threshold == 0
        || profile.fused_cell_threshold == 0
        || profile.tail_window == 0
    {
        return Err(RetslipError::ProfileInvalid(
            "collapse_threshold, fused_cell_threshold and tail_window must be positive".into(),
        ));
    }

    let [first_year, last_year] = profile.holiday_years;
    if first_year > last_year {
        return Err(RetslipError::ProfileInvalid(format!(
            "holiday_years range {first_year}..{last_year} is inverted"
        )));
    }

    Ok(())
}
