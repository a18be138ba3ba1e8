use retslip_core::error::RetslipError;
use std::path::PathBuf;

use super::Pipeline;
use crate::output;

pub fn run(
    files: Vec<PathBuf>,
    profile: Option<PathBuf>,
    output_format: &str,
    output_file: Option<PathBuf>,
    show_events: bool,
) -> Result<(), RetslipError> {
    let pipeline = Pipeline::load(profile)?;
    let attempt = pipeline.best_attempt(&files)?;
    let assembly = &attempt.assembly;

    match output_file {
        Some(path) => {
            // Always write JSON when saving to file
            let json = serde_json::to_string_pretty(&assembly.records)?;
            std::fs::write(&path, json)?;
            eprintln!(
                "Assembled {} record(s), written to {}",
                assembly.records.len(),
                path.display()
            );
            let flagged = assembly.trace.review_flags().count();
            if flagged > 0 {
                eprintln!("  {flagged} record(s) flagged for manual review");
            }
            if show_events {
                output::table::print_events(&assembly.trace);
            }
        }
        None => match output_format {
            "json" => output::json::print_assembly(assembly, show_events)?,
            _ => {
                output::table::print_records(&assembly.records);
                if show_events {
                    println!();
                    output::table::print_events(&assembly.trace);
                }
            }
        },
    }

    Ok(())
}
