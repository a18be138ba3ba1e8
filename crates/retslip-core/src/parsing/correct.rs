//! The row corrector chain.
//!
//! Each pass recognizes one misalignment signature on a candidate record and
//! returns a rewritten copy, or [`Correction::Unchanged`] when the signature
//! does not match. Passes never mutate their input and run in the fixed
//! order of [`Pass::CHAIN`]: later passes assume the record is already at
//! full width and that the warehouse/slip columns are split.

use crate::model::{trim_padding, CanonicalRecord, Definitive, Field};
use crate::parsing::detect::Detectors;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pass {
    PadToWidth,
    SplitLeadingCell,
    SplitWarehouseSlip,
    SplitCustomerDefinitive,
    UndoShiftAfterNo,
    SplitTotalOpen,
    RestoreMissingOpen,
    FoldDefinitive,
}

impl Pass {
    pub const CHAIN: [Pass; 8] = [
        Pass::PadToWidth,
        Pass::SplitLeadingCell,
        Pass::SplitWarehouseSlip,
        Pass::SplitCustomerDefinitive,
        Pass::UndoShiftAfterNo,
        Pass::SplitTotalOpen,
        Pass::RestoreMissingOpen,
        Pass::FoldDefinitive,
    ];

    /// 1-based position in the chain.
    pub fn number(self) -> usize {
        self as usize + 1
    }

    pub fn apply(self, detectors: &Detectors, cells: &[String]) -> Correction {
        match self {
            Pass::PadToWidth => pad_to_width(cells),
            Pass::SplitLeadingCell => split_leading_cell(detectors, cells),
            Pass::SplitWarehouseSlip => split_warehouse_slip(detectors, cells),
            Pass::SplitCustomerDefinitive => split_customer_definitive(detectors, cells),
            Pass::UndoShiftAfterNo => undo_shift_after_no(detectors, cells),
            Pass::SplitTotalOpen => split_total_open(detectors, cells),
            Pass::RestoreMissingOpen => restore_missing_open(cells),
            Pass::FoldDefinitive => fold_definitive(cells),
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Pass::PadToWidth => "pad to width",
            Pass::SplitLeadingCell => "split leading multi-value cell",
            Pass::SplitWarehouseSlip => "split warehouse+slip fusion",
            Pass::SplitCustomerDefinitive => "split customer+definitive fusion",
            Pass::UndoShiftAfterNo => "undo shift after Definitive=No",
            Pass::SplitTotalOpen => "split Total+Open fusion",
            Pass::RestoreMissingOpen => "restore missing Open column",
            Pass::FoldDefinitive => "fold definitive flag",
        };
        write!(f, "{} ({})", self.number(), name)
    }
}

/// Outcome of one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Correction {
    /// The signature did not match.
    Unchanged,
    Rewritten(Vec<String>),
    /// Rewritten, but the content also fits another pass's signature.
    NeedsReview { cells: Vec<String>, note: String },
}

/// A pass that changed the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub pass: Pass,
    pub review: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainOutcome {
    pub cells: Vec<String>,
    pub steps: Vec<Step>,
}

/// Run every pass in chain order.
pub fn run_chain(detectors: &Detectors, cells: Vec<String>) -> ChainOutcome {
    let mut current = cells;
    let mut steps = Vec::new();

    for pass in Pass::CHAIN {
        let (next, review) = match pass.apply(detectors, &current) {
            Correction::Unchanged => continue,
            Correction::Rewritten(next) => (next, None),
            Correction::NeedsReview { cells, note } => (cells, Some(note)),
        };
        if next == current {
            continue;
        }
        tracing::debug!(pass = %pass, "corrector applied");
        current = next;
        steps.push(Step { pass, review });
    }

    ChainOutcome {
        cells: current,
        steps,
    }
}

/// Run the chain over an assembled record.
pub fn correct_record(detectors: &Detectors, record: &CanonicalRecord) -> CanonicalRecord {
    let outcome = run_chain(detectors, record.cells().to_vec());
    CanonicalRecord::from_cells(outcome.cells)
}

fn cell(cells: &[String], field: Field) -> &str {
    cells.get(field.index()).map(|s| s.trim()).unwrap_or("")
}

/// Insert `by` empty cells at `at`, moving the suffix right. Empty padding
/// pushed past the canonical width is dropped; real values are kept.
fn shift_right(cells: &mut Vec<String>, at: usize, by: usize) {
    if cells.len() < at {
        cells.resize(at, String::new());
    }
    for _ in 0..by {
        cells.insert(at, String::new());
    }
    trim_padding(cells);
}

fn is_short_plain_integer(s: &str) -> bool {
    !s.is_empty() && s.len() <= 3 && s.chars().all(|c| c.is_ascii_digit())
}

/// Also drops blank cells past the canonical width; values are never cut.
fn pad_to_width(cells: &[String]) -> Correction {
    let mut out = cells.to_vec();
    if out.len() < CanonicalRecord::WIDTH {
        out.resize(CanonicalRecord::WIDTH, String::new());
    }
    trim_padding(&mut out);
    if out.len() == cells.len() {
        return Correction::Unchanged;
    }
    Correction::Rewritten(out)
}

/// Field 0 holding state, warehouse and slip on separate lines.
fn split_leading_cell(detectors: &Detectors, cells: &[String]) -> Correction {
    let Some(first) = cells.first() else {
        return Correction::Unchanged;
    };
    if !first.contains('\n') {
        return Correction::Unchanged;
    }
    let Some(found_slip) = detectors.find_slip(first) else {
        return Correction::Unchanged;
    };

    let mut state = String::new();
    let mut warehouse = String::new();
    let mut slip = String::new();

    for line in first.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if slip.is_empty() && detectors.is_slip_number(line) {
            slip = line.to_string();
        } else if let Some((wh, s)) = detectors.split_warehouse_slip(line) {
            if warehouse.is_empty() {
                warehouse = wh;
            }
            if slip.is_empty() {
                slip = s.to_string();
            }
        } else if state.is_empty() && detectors.is_state_code(line) {
            state = line.to_string();
        } else if warehouse.is_empty() && detectors.is_warehouse_code(line) {
            warehouse = line.to_uppercase();
        }
    }
    if slip.is_empty() {
        slip = found_slip.to_string();
    }

    let mut out = Vec::with_capacity(cells.len() + 2);
    out.push(state);
    out.push(warehouse);
    out.push(slip);
    out.extend(cells.iter().skip(1).cloned());
    trim_padding(&mut out);
    Correction::Rewritten(out)
}

/// `<warehouse> <slip>` in one of fields 1-3.
fn split_warehouse_slip(detectors: &Detectors, cells: &[String]) -> Correction {
    let wh_idx = Field::ReturnPrefix.index();
    let slip_idx = Field::ReturnSlip.index();
    if cells.len() < CanonicalRecord::WIDTH {
        return Correction::Unchanged;
    }
    let mut out = cells.to_vec();

    let fused = (1..=3).find_map(|col| {
        cells
            .get(col)
            .and_then(|c| detectors.split_warehouse_slip(c))
            .map(|(wh, slip)| (col, wh, slip.to_string()))
    });

    if let Some((col, wh, slip)) = fused {
        if col == wh_idx {
            out[wh_idx] = wh;
            if !detectors.is_slip_number(&out[slip_idx]) {
                out[slip_idx] = slip;
            }
        } else {
            if out[wh_idx].trim().is_empty() {
                out[wh_idx] = wh;
            }
            if col == slip_idx || out[slip_idx].trim().is_empty() {
                out[slip_idx] = slip;
            }
        }
    }

    let code = out[wh_idx].trim();
    if detectors.is_warehouse_code(code) && code != code.to_uppercase() {
        out[wh_idx] = code.to_uppercase();
    }

    changed(cells, out)
}

/// Definitive flags fused onto the end of Customer, Job_Name or Definitive.
fn split_customer_definitive(detectors: &Detectors, cells: &[String]) -> Correction {
    let def_idx = Field::Definitive.index();
    let job_idx = Field::JobName.index();
    if cells.len() < CanonicalRecord::WIDTH {
        return Correction::Unchanged;
    }
    let mut out = cells.to_vec();

    for col in [Field::Customer, Field::JobName, Field::Definitive].map(Field::index) {
        let value = out[col].clone();
        let Some(flags) = detectors.split_trailing_flags(&value) else {
            continue;
        };

        if col == def_idx {
            // Job text spilled into the Definitive cell.
            out[def_idx] = flags.first.to_string();
            let job = out[job_idx].trim();
            out[job_idx] = if job.is_empty() {
                flags.text.to_string()
            } else {
                format!("{} {}", job, flags.text)
            };
            continue;
        }

        match flags.second {
            Some(second) => {
                out[col] = format!("{} {}", flags.text, flags.first);
                if out[def_idx].trim().is_empty() {
                    out[def_idx] = second.to_string();
                }
            }
            None => {
                if out[def_idx].trim().is_empty() {
                    out[col] = flags.text.to_string();
                    out[def_idx] = flags.first.to_string();
                }
            }
        }
    }

    changed(cells, out)
}

fn changed(cells: &[String], out: Vec<String>) -> Correction {
    if out == cells {
        Correction::Unchanged
    } else {
        Correction::Rewritten(out)
    }
}

/// An open slip whose blank Counted_Date cell was never emitted.
fn undo_shift_after_no(detectors: &Detectors, cells: &[String]) -> Correction {
    if Definitive::parse(cell(cells, Field::Definitive)) != Some(Definitive::No) {
        return Correction::Unchanged;
    }
    let counted = cell(cells, Field::CountedDate);
    if counted.is_empty() || detectors.is_date(counted) {
        return Correction::Unchanged;
    }

    let open_codes_present = cells
        .iter()
        .skip(Field::CountedDate.index())
        .any(|c| detectors.has_tablet_code(c));
    let ambiguous = is_short_plain_integer(counted) && !open_codes_present;

    let mut out = cells.to_vec();
    shift_right(&mut out, Field::CountedDate.index(), 1);

    if ambiguous {
        Correction::NeedsReview {
            cells: out,
            note: format!(
                "Counted_Date held '{counted}' and no Open codes were found; \
                 the row may instead be missing its Open column"
            ),
        }
    } else {
        Correction::Rewritten(out)
    }
}

/// `<total> <open codes>` fused in the Total column.
fn split_total_open(detectors: &Detectors, cells: &[String]) -> Correction {
    let Some((total, open)) = detectors.split_total_open(cell(cells, Field::Total)) else {
        return Correction::Unchanged;
    };

    let total_idx = Field::Total.index();
    let mut out = cells.to_vec();
    out[total_idx] = total.to_string();
    shift_right(&mut out, total_idx + 1, 1);
    out[total_idx + 1] = open.to_string();
    Correction::Rewritten(out)
}

/// A closed slip whose blank Open cell was never emitted, so Tablets_Total
/// slid into the Open column.
fn restore_missing_open(cells: &[String]) -> Correction {
    let closed = Definitive::parse(cell(cells, Field::Definitive)) == Some(Definitive::Yes)
        && !cell(cells, Field::CountedDate).is_empty();
    if !closed {
        return Correction::Unchanged;
    }
    let open = cell(cells, Field::Open);
    if !is_short_plain_integer(open) {
        return Correction::Unchanged;
    }

    let open_idx = Field::Open.index();
    let mut out = cells.to_vec();
    let tail_full = !cell(cells, Field::ValidationDelay).is_empty();
    let stray_digit = open.len() == 1 && open.parse::<u8>().is_ok_and(|n| n <= 5);

    if tail_full && stray_digit {
        out[open_idx] = String::new();
    } else {
        shift_right(&mut out, open_idx, 1);
    }
    Correction::Rewritten(out)
}

fn fold_definitive(cells: &[String]) -> Correction {
    let raw = cell(cells, Field::Definitive);
    match Definitive::parse(raw) {
        Some(flag) if raw != flag.as_str() || cells[Field::Definitive.index()] != raw => {
            let mut out = cells.to_vec();
            out[Field::Definitive.index()] = flag.as_str().to_string();
            Correction::Rewritten(out)
        }
        _ => Correction::Unchanged,
    }
}
