pub mod business;
pub mod error;
pub mod extraction;
pub mod model;
pub mod parsing;
pub mod profile;
pub mod trace;
pub mod validate;

use error::RetslipError;
use extraction::TableSource;
use model::Field;
use parsing::detect::Detectors;
use parsing::Assembly;
use profile::schema::ProfileDef;

/// Bonus for a state code in the first column of any record.
const STATE_COLUMN_BONUS: usize = 10;
/// Bonus for a slip number in any of the first five columns.
const SLIP_COLUMN_BONUS: usize = 10;
/// Leading columns searched for a slip number when scoring.
const SLIP_SCAN_COLUMNS: usize = 5;

/// Main API entry point: read raw tables with `source` and assemble them into
/// canonical records using `profile`.
pub fn read_and_assemble(
    bytes: &[u8],
    source: &dyn TableSource,
    profile: &ProfileDef,
) -> Result<Assembly, RetslipError> {
    let tables = source.read_tables(bytes)?;
    if tables.is_empty() {
        return Err(RetslipError::NoTables);
    }
    let detectors = Detectors::compile(profile)?;
    Ok(parsing::assemble(&tables, &detectors))
}

/// One independent extraction of the same report, e.g. one raw table dump
/// produced with a particular extractor configuration.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub name: String,
    pub assembly: Assembly,
}

/// Record count plus bonuses for the column structure looking right.
pub fn score_attempt(assembly: &Assembly, detectors: &Detectors) -> usize {
    let records = &assembly.records;
    let has_state_column = records
        .iter()
        .any(|r| detectors.is_state_code(r.get(Field::State)));
    let has_slip_column = records.iter().any(|r| {
        r.cells()
            .iter()
            .take(SLIP_SCAN_COLUMNS)
            .any(|c| detectors.find_slip(c).is_some())
    });

    let mut score = records.len();
    if has_state_column {
        score += STATE_COLUMN_BONUS;
    }
    if has_slip_column {
        score += SLIP_COLUMN_BONUS;
    }
    score
}

/// The highest-scoring attempt; ties go to the earliest.
pub fn choose_best_attempt(attempts: Vec<Attempt>, detectors: &Detectors) -> Option<Attempt> {
    let mut best: Option<(usize, Attempt)> = None;
    for attempt in attempts {
        let score = score_attempt(&attempt.assembly, detectors);
        tracing::debug!(attempt = %attempt.name, score, "scored attempt");
        if best.as_ref().map_or(true, |(s, _)| score > *s) {
            best = Some((score, attempt));
        }
    }
    best.map(|(_, attempt)| attempt)
}
