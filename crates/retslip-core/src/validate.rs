use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::model::CanonicalRecord;
use crate::parsing::detect::Detectors;
use crate::parsing::Assembly;

/// Adjacent pair of 2-3 digit integers, as printed on a report's totals line.
static GROSS_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{2,3})\s+(\d{2,3})\b").expect("gross-total pattern is valid")
});

/// Records scanned from the end when looking for the totals line.
const TOTALS_WINDOW: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityGrade {
    Excellent,
    Good,
    Partial,
}

impl QualityGrade {
    fn from_percent(percent: Decimal) -> Self {
        if percent >= Decimal::from(95) {
            QualityGrade::Excellent
        } else if percent >= Decimal::from(80) {
            QualityGrade::Good
        } else {
            QualityGrade::Partial
        }
    }
}

impl fmt::Display for QualityGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityGrade::Excellent => write!(f, "excellent"),
            QualityGrade::Good => write!(f, "good"),
            QualityGrade::Partial => write!(f, "partial"),
        }
    }
}

/// Contiguity of the slip sequence, judged on the last three digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceCheck {
    pub first: u16,
    pub last: u16,
    /// Numbers expected between `first` and `last`, inclusive.
    pub expected: usize,
    pub missing: usize,
}

impl SequenceCheck {
    pub fn is_contiguous(&self) -> bool {
        self.missing == 0
    }
}

/// The first plausible `<tablets> <open>` totals pair near the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GrossTotals {
    pub tablets: u32,
    pub open: u32,
}

/// Post-hoc completeness diagnostics. Never alters the records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletenessReport {
    pub total_records: usize,
    pub valid_slips: usize,
    /// Screened rows that yielded no valid slip after correction.
    pub dropped_records: usize,
    /// `valid_slips / (total_records + dropped_records)`, zero for an empty run.
    pub completeness_ratio: Decimal,
    /// Ratio as a percentage rounded to one decimal.
    pub completeness_percent: Decimal,
    /// Present when at least two valid slips exist.
    pub sequence: Option<SequenceCheck>,
    /// Valid slips whose last three digits repeat an earlier slip.
    pub duplicate_slips: usize,
    pub gross_totals: Option<GrossTotals>,
    pub grade: QualityGrade,
}

pub fn check_completeness(assembly: &Assembly, detectors: &Detectors) -> CompletenessReport {
    let records = &assembly.records;
    let total_records = records.len();
    let dropped_records = assembly.trace.dropped_count();
    let valid: Vec<&str> = records
        .iter()
        .map(|r| r.slip())
        .filter(|s| detectors.is_slip_number(s))
        .collect();
    let valid_slips = valid.len();

    let attempted = total_records + dropped_records;
    let completeness_ratio = if attempted == 0 {
        Decimal::ZERO
    } else {
        Decimal::from(valid_slips) / Decimal::from(attempted)
    };
    let mut completeness_percent = (completeness_ratio * Decimal::ONE_HUNDRED).round_dp(1);
    completeness_percent.rescale(1);

    let tails: Vec<u16> = valid.iter().filter_map(|s| slip_tail(s)).collect();
    let distinct: BTreeSet<u16> = tails.iter().copied().collect();
    let duplicate_slips = tails.len() - distinct.len();

    let sequence = if valid_slips >= 2 {
        match (distinct.first(), distinct.last()) {
            (Some(&first), Some(&last)) => {
                let expected = usize::from(last - first) + 1;
                Some(SequenceCheck {
                    first,
                    last,
                    expected,
                    missing: expected - distinct.len(),
                })
            }
            _ => None,
        }
    } else {
        None
    };

    CompletenessReport {
        total_records,
        valid_slips,
        dropped_records,
        completeness_ratio,
        completeness_percent,
        sequence,
        duplicate_slips,
        gross_totals: find_gross_totals(records),
        grade: QualityGrade::from_percent(completeness_percent),
    }
}

fn slip_tail(slip: &str) -> Option<u16> {
    let start = slip.len().checked_sub(3)?;
    slip.get(start..)?.parse().ok()
}

/// Scan the text of the last records for a totals pair with
/// 50 <= tablets <= 500 and 20 <= open <= 200.
pub fn find_gross_totals(records: &[CanonicalRecord]) -> Option<GrossTotals> {
    let start = records.len().saturating_sub(TOTALS_WINDOW);
    let text = records[start..]
        .iter()
        .map(|r| r.row_text())
        .collect::<Vec<_>>()
        .join(" ");

    GROSS_PAIR.captures_iter(&text).find_map(|caps| {
        let tablets: u32 = caps.get(1)?.as_str().parse().ok()?;
        let open: u32 = caps.get(2)?.as_str().parse().ok()?;
        ((50..=500).contains(&tablets) && (20..=200).contains(&open))
            .then_some(GrossTotals { tablets, open })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Field;
    use crate::parsing::detect::tests::detectors;
    use crate::trace::{EventKind, PipelineEvent};
    use rust_decimal_macros::dec;

    fn record(slip: &str) -> CanonicalRecord {
        let mut r = CanonicalRecord::from_cells(vec!["FL".into(), "612D".into()]);
        r.set(Field::ReturnSlip, slip);
        r
    }

    fn assembled(records: Vec<CanonicalRecord>) -> Assembly {
        Assembly {
            records,
            ..Assembly::default()
        }
    }

    #[test]
    fn test_reports_single_gap() {
        let d = detectors();
        let records = vec![
            record("729000012101"),
            record("729000012102"),
            record("729000012104"),
        ];
        let report = check_completeness(&assembled(records), &d);
        let seq = report.sequence.unwrap();
        assert_eq!(seq.first, 101);
        assert_eq!(seq.last, 104);
        assert_eq!(seq.expected, 4);
        assert_eq!(seq.missing, 1);
        assert!(!seq.is_contiguous());
    }

    #[test]
    fn test_ratio_and_grade() {
        let d = detectors();
        let mut records: Vec<_> = (100..109).map(|n| record(&format!("729000012{n}"))).collect();
        records.push(record(""));
        let report = check_completeness(&assembled(records), &d);
        assert_eq!(report.total_records, 10);
        assert_eq!(report.valid_slips, 9);
        assert_eq!(report.completeness_ratio, dec!(0.9));
        assert_eq!(report.completeness_percent, dec!(90.0));
        assert_eq!(report.grade, QualityGrade::Good);
        assert!(report.sequence.unwrap().is_contiguous());
    }

    #[test]
    fn test_dropped_records_count_as_deficit() {
        let d = detectors();
        let mut assembly = assembled(vec![record("729000012101"), record("729000012102")]);
        assembly.trace.push(PipelineEvent {
            page_number: 1,
            row_index: 2,
            kind: EventKind::RecordDropped {
                row_text: "729000012103 FL".into(),
            },
        });
        let report = check_completeness(&assembly, &d);
        assert_eq!(report.total_records, 2);
        assert_eq!(report.valid_slips, 2);
        assert_eq!(report.dropped_records, 1);
        assert_eq!(report.completeness_percent, dec!(66.7));
        assert_eq!(report.grade, QualityGrade::Partial);
    }

    #[test]
    fn test_empty_run() {
        let d = detectors();
        let report = check_completeness(&Assembly::default(), &d);
        assert_eq!(report.completeness_ratio, Decimal::ZERO);
        assert_eq!(report.grade, QualityGrade::Partial);
        assert!(report.sequence.is_none());
        assert!(report.gross_totals.is_none());
    }

    #[test]
    fn test_single_slip_has_no_sequence() {
        let d = detectors();
        let report = check_completeness(&assembled(vec![record("729000012101")]), &d);
        assert!(report.sequence.is_none());
        assert_eq!(report.grade, QualityGrade::Excellent);
    }

    #[test]
    fn test_duplicates_do_not_hide_gaps() {
        let d = detectors();
        let records = vec![
            record("729000012101"),
            record("729000012101"),
            record("729000012103"),
        ];
        let report = check_completeness(&assembled(records), &d);
        assert_eq!(report.duplicate_slips, 1);
        assert_eq!(report.sequence.unwrap().missing, 1);
    }

    #[test]
    fn test_gross_totals_in_last_records() {
        let mut last = record("729000012101");
        last.set(Field::JobName, "Totals 120 45");
        let records = vec![record("729000012100"), last];
        assert_eq!(
            find_gross_totals(&records),
            Some(GrossTotals {
                tablets: 120,
                open: 45
            })
        );
    }

    #[test]
    fn test_gross_totals_out_of_range() {
        let mut last = record("729000012101");
        last.set(Field::JobName, "12 14 600 45");
        assert_eq!(find_gross_totals(&[last]), None);
    }

    #[test]
    fn test_report_serializes_decimals_as_strings() {
        let d = detectors();
        let report = check_completeness(&assembled(vec![record("729000012101")]), &d);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["completeness_percent"], "100.0");
        assert_eq!(json["grade"], "excellent");
    }
}
