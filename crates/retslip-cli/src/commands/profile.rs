use retslip_core::error::RetslipError;
use retslip_core::profile::builtin::{self, DEFAULT_PRESET};
use retslip_core::profile::load_profile;
use std::path::Path;

pub fn show(name: Option<&str>) -> Result<(), RetslipError> {
    let name = name.unwrap_or(DEFAULT_PRESET);
    match builtin::preset_json(name) {
        Some(json) => {
            print!("{json}");
            Ok(())
        }
        None => Err(RetslipError::ProfileInvalid(format!(
            "unknown preset '{}'. Available: {}",
            name,
            builtin::PRESETS.join(", ")
        ))),
    }
}

pub fn validate(file: &Path) -> Result<(), RetslipError> {
    let profile = load_profile(file)?;
    println!("Profile '{}' (v{}) is valid.", profile.name, profile.version);
    println!("  Slip numbers:    {} + {} digits", profile.slip_prefix, profile.slip_suffix_digits);
    println!("  State codes:     {}", profile.state_codes.join(", "));
    println!("  Known customers: {}", profile.known_customers.len());
    println!("  Noise markers:   {}", profile.noise_markers.len());
    println!(
        "  Holiday years:   {}..={}",
        profile.holiday_years[0], profile.holiday_years[1]
    );
    Ok(())
}
