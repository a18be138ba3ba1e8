use crate::model::Field;
use crate::parsing::correct::Pass;
use crate::parsing::shape::RowShape;
use serde::{Deserialize, Serialize};

pub const TRACE_SCHEMA_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceSeverity {
    Critical,
    Important,
    Info,
}

/// Why a raw row produced no record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "detail")]
pub enum RejectReason {
    /// No slip number anywhere in the row.
    NoSlipId,
    /// A slip number but no two-letter region code.
    NoRegionCode,
    /// Page header/footer, column header repeat or totals line.
    Noise(String),
}

/// What happened to one raw row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum EventKind {
    RowRejected {
        #[serde(flatten)]
        reason: RejectReason,
    },
    ShapeDetected {
        shape: RowShape,
    },
    ContinuationMerged {
        field: Field,
        items: Vec<String>,
        continuation_row: usize,
    },
    ContinuationConsumed {
        into_row: usize,
    },
    Corrected {
        pass: Pass,
    },
    FlaggedForReview {
        pass: Pass,
        note: String,
    },
    Recovered {
        column: usize,
    },
    RecordAccepted {
        slip: String,
    },
    RecordDropped {
        row_text: String,
    },
}

impl EventKind {
    pub fn severity(&self) -> TraceSeverity {
        match self {
            EventKind::RecordDropped { .. } => TraceSeverity::Critical,
            EventKind::FlaggedForReview { .. } | EventKind::Recovered { .. } => {
                TraceSeverity::Important
            }
            _ => TraceSeverity::Info,
        }
    }
}

/// A structured, non-fatal diagnostic emitted while assembling records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineEvent {
    pub page_number: usize,
    /// Index of the raw row within its table.
    pub row_index: usize,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl PipelineEvent {
    pub fn message(&self) -> String {
        let what = match &self.kind {
            EventKind::RowRejected { reason } => match reason {
                RejectReason::NoSlipId => "rejected: no slip number".to_string(),
                RejectReason::NoRegionCode => "rejected: no region code".to_string(),
                RejectReason::Noise(marker) => format!("rejected: matches '{marker}'"),
            },
            EventKind::ShapeDetected { shape } => format!("shape {shape}"),
            EventKind::ContinuationMerged {
                field,
                items,
                continuation_row,
            } => format!(
                "appended {} from row {} to {}",
                items.join(", "),
                continuation_row,
                field
            ),
            EventKind::ContinuationConsumed { into_row } => {
                format!("consumed as continuation of row {into_row}")
            }
            EventKind::Corrected { pass } => format!("corrected by pass {}", pass.number()),
            EventKind::FlaggedForReview { pass, note } => {
                format!("needs review after pass {}: {}", pass.number(), note)
            }
            EventKind::Recovered { column } => {
                format!("recovered from collapsed cell in column {column}")
            }
            EventKind::RecordAccepted { slip } => format!("accepted {slip}"),
            EventKind::RecordDropped { row_text } => {
                format!("dropped, no valid slip after correction: {row_text}")
            }
        };
        format!("page {} row {}: {}", self.page_number, self.row_index, what)
    }
}

/// Events of one assembly run, in emission order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceBundle {
    pub trace_schema_version: String,
    pub events: Vec<PipelineEvent>,
}

impl Default for TraceBundle {
    fn default() -> Self {
        Self {
            trace_schema_version: TRACE_SCHEMA_VERSION.to_string(),
            events: Vec::new(),
        }
    }
}

impl TraceBundle {
    pub fn push(&mut self, event: PipelineEvent) {
        self.events.push(event);
    }

    pub fn review_flags(&self) -> impl Iterator<Item = &PipelineEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e.kind, EventKind::FlaggedForReview { .. }))
    }

    pub fn rejected_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e.kind, EventKind::RowRejected { .. }))
            .count()
    }

    /// Rows that passed screening but yielded no valid slip.
    pub fn dropped_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e.kind, EventKind::RecordDropped { .. }))
            .count()
    }
}
