use retslip_core::business::{summarize, BusinessCalendar, BusinessRecord};
use retslip_core::error::RetslipError;
use std::path::PathBuf;

use super::Pipeline;
use crate::output;

pub fn run(
    files: Vec<PathBuf>,
    profile: Option<PathBuf>,
    output_format: &str,
) -> Result<(), RetslipError> {
    let pipeline = Pipeline::load(profile)?;
    let attempt = pipeline.best_attempt(&files)?;

    let calendar = BusinessCalendar::from_profile(&pipeline.profile);
    let records: Vec<BusinessRecord> = attempt
        .assembly
        .records
        .iter()
        .map(|r| BusinessRecord::derive(r, &pipeline.detectors, &calendar))
        .collect();
    let summary = summarize(&records);

    match output_format {
        "json" => output::json::print(&summary)?,
        _ => output::table::print_summary(&summary),
    }
    Ok(())
}
