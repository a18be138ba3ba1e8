use retslip_core::error::RetslipError;
use retslip_core::validate::check_completeness;
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
    let report = check_completeness(&attempt.assembly, &pipeline.detectors);

    match output_format {
        "json" => output::json::print(&report)?,
        _ => output::table::print_completeness(&report, &attempt.assembly.trace),
    }
    Ok(())
}
