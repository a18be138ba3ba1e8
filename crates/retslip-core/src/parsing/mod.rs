pub mod correct;
pub mod detect;
pub mod merge;
pub mod recover;
pub mod shape;

use crate::extraction::RawTable;
use crate::model::CanonicalRecord;
use crate::trace::{EventKind, PipelineEvent, TraceBundle};
use correct::run_chain;
use detect::Detectors;
use merge::merge_continuation;
use recover::recover_unified_row;
use shape::{classify_shape, row_text, screen_row, RowShape};

/// Records reconstructed from a set of raw tables, with the diagnostics
/// emitted along the way.
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    pub records: Vec<CanonicalRecord>,
    pub trace: TraceBundle,
}

/// Assemble canonical records from raw tables, keeping events only in the
/// returned trace.
pub fn assemble(tables: &[RawTable], detectors: &Detectors) -> Assembly {
    assemble_with(tables, detectors, |_| {})
}

/// Assemble canonical records, handing every event to `sink` as it happens.
///
/// Rows are processed strictly in table order. No row can fail the run: a
/// row that yields no valid slip id is reported and skipped.
pub fn assemble_with<F>(tables: &[RawTable], detectors: &Detectors, mut sink: F) -> Assembly
where
    F: FnMut(PipelineEvent),
{
    let mut assembly = Assembly::default();

    for table in tables {
        tracing::info!(
            page = table.page_number,
            rows = table.rows.len(),
            "assembling table"
        );
        let mut emit = |row_index: usize, kind: EventKind| {
            let event = PipelineEvent {
                page_number: table.page_number,
                row_index,
                kind,
            };
            sink(event.clone());
            assembly.trace.push(event);
        };
        let mut consumed_by: Option<usize> = None;

        for (i, row) in table.rows.iter().enumerate() {
            if let Some(into_row) = consumed_by.take() {
                emit(i, EventKind::ContinuationConsumed { into_row });
                continue;
            }

            let text = row_text(&row.cells);
            if let Err(reason) = screen_row(detectors, &text) {
                emit(i, EventKind::RowRejected { reason });
                continue;
            }

            let shape = classify_shape(detectors, &row.cells);
            if shape != RowShape::WellFormed {
                emit(i, EventKind::ShapeDetected { shape });
            }

            let record = match shape {
                RowShape::SingleCellCollapse { column } => {
                    emit(i, EventKind::Recovered { column });
                    recover_unified_row(detectors, &text)
                }
                RowShape::WellFormed | RowShape::MultiCellMerge => {
                    let next = table.rows.get(i + 1).map(|r| r.cells.as_slice());
                    let cells = match merge_continuation(detectors, &row.cells, next) {
                        Some(merge) => {
                            for c in merge.continuations {
                                tracing::debug!(
                                    page = table.page_number,
                                    row = i,
                                    field = %c.field,
                                    "merged continuation row"
                                );
                                emit(
                                    i,
                                    EventKind::ContinuationMerged {
                                        field: c.field,
                                        items: c.items,
                                        continuation_row: i + 1,
                                    },
                                );
                            }
                            consumed_by = Some(i);
                            merge.cells
                        }
                        None => row.cells.clone(),
                    };

                    let outcome = run_chain(detectors, cells);
                    for step in outcome.steps {
                        emit(i, EventKind::Corrected { pass: step.pass });
                        if let Some(note) = step.review {
                            tracing::warn!(
                                page = table.page_number,
                                row = i,
                                pass = step.pass.number(),
                                "{note}"
                            );
                            emit(
                                i,
                                EventKind::FlaggedForReview {
                                    pass: step.pass,
                                    note,
                                },
                            );
                        }
                    }
                    CanonicalRecord::from_cells(outcome.cells)
                }
            };

            if detectors.is_slip_number(record.slip()) {
                emit(
                    i,
                    EventKind::RecordAccepted {
                        slip: record.slip().to_string(),
                    },
                );
                assembly.records.push(record);
            } else {
                emit(i, EventKind::RecordDropped { row_text: text });
            }
        }
    }

    tracing::info!(
        records = assembly.records.len(),
        rejected = assembly.trace.rejected_count(),
        "assembly complete"
    );
    assembly
}
