//! End-to-end tests for read_and_assemble() and the post-hoc views.
//!
//! Uses a MockSource that returns pre-built raw tables, so no extractor
//! output files are needed.

use proptest::prelude::*;
use retslip_core::business::{summarize, BusinessCalendar, BusinessRecord};
use retslip_core::error::RetslipError;
use retslip_core::extraction::{source_for_path, RawRow, RawTable, TableSource};
use retslip_core::model::{CanonicalRecord, Field};
use retslip_core::parsing::correct::run_chain;
use retslip_core::parsing::detect::Detectors;
use retslip_core::profile::builtin::{load_preset, DEFAULT_PRESET};
use retslip_core::trace::EventKind;
use retslip_core::validate::check_completeness;
use retslip_core::{choose_best_attempt, read_and_assemble, Attempt};

struct MockSource {
    tables: Vec<RawTable>,
}

impl TableSource for MockSource {
    fn read_tables(&self, _bytes: &[u8]) -> Result<Vec<RawTable>, RetslipError> {
        Ok(self.tables.clone())
    }

    fn source_name(&self) -> &str {
        "mock"
    }
}

fn page(number: usize, rows: Vec<Vec<&str>>) -> RawTable {
    RawTable {
        page_number: number,
        rows: rows.into_iter().map(RawRow::new).collect(),
    }
}

fn detectors() -> Detectors {
    Detectors::compile(&load_preset(DEFAULT_PRESET).unwrap()).unwrap()
}

fn closed(slip: &str) -> Vec<&str> {
    vec![
        "FL",
        "612D",
        slip,
        "3/4/2024",
        "41234567",
        "FL301",
        "3/2/2024",
        "3/3/2024",
        "JGR Construction",
        "Tower A",
        "Yes",
        "3/8/2024",
        "12, 14",
        "2",
        "",
        "2",
        "5",
        "1",
    ]
}

fn to_cells(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Round trip: fused warehouse+slip cell reproduces the original record
// ---------------------------------------------------------------------------
#[test]
fn fused_identifier_round_trip() {
    let original = closed("729000012345");
    let mut raw = original.clone();
    let fused = format!("{} {}", original[1], original[2]);
    raw[1] = &fused;
    raw[2] = "";

    let source = MockSource {
        tables: vec![page(1, vec![raw])],
    };
    let profile = load_preset(DEFAULT_PRESET).unwrap();
    let assembly = read_and_assemble(&[], &source, &profile).unwrap();

    assert_eq!(assembly.records.len(), 1);
    assert_eq!(assembly.records[0].cells(), to_cells(&original).as_slice());
}

// ---------------------------------------------------------------------------
// Shifted, wrapped and noisy rows across pages
// ---------------------------------------------------------------------------
#[test]
fn multi_page_report_with_every_misalignment() {
    // Open slip, Counted_Date missing so 11..17 slid left
    let shifted_open = vec![
        "FL",
        "612D",
        "729000012346",
        "3/4/2024",
        "41234567",
        "FL301",
        "",
        "",
        "JGR Construction",
        "Tower A",
        "No",
        "12, 14",
        "2",
        "105M, 106A",
        "2",
        "4",
        "1",
    ];
    // Closed slip, Open missing so Tablets_Total slid into it
    let mut missing_open = closed("729000012347");
    missing_open[14] = "5";
    missing_open[15] = "3";
    missing_open[16] = "1";
    missing_open[17] = "";
    // Tablets wrapped onto a continuation row
    let mut wrapped = closed("729000012348");
    wrapped[12] = "12, 14,";

    let source = MockSource {
        tables: vec![
            page(
                1,
                vec![
                    vec!["Outstanding count returns report"],
                    vec!["State", "Return Prefix", "Return Slip", "Return Date"],
                    closed("729000012345"),
                    shifted_open,
                ],
            ),
            page(
                2,
                vec![missing_open, wrapped, vec!["", "16, 18", ""], vec!["Page 2 of 2"]],
            ),
        ],
    };
    let profile = load_preset(DEFAULT_PRESET).unwrap();
    let assembly = read_and_assemble(&[], &source, &profile).unwrap();
    let records = &assembly.records;

    assert_eq!(records.len(), 4);
    assert_eq!(
        records.iter().map(|r| r.slip()).collect::<Vec<_>>(),
        vec!["729000012345", "729000012346", "729000012347", "729000012348"]
    );

    let open = &records[1];
    assert_eq!(open.get(Field::CountedDate), "");
    assert_eq!(open.get(Field::Tablets), "12, 14");
    assert_eq!(open.get(Field::Open), "105M, 106A");
    assert_eq!(open.get(Field::ValidationDelay), "1");

    let restored = &records[2];
    assert_eq!(restored.get(Field::Open), "");
    assert_eq!(restored.get(Field::TabletsTotal), "5");
    assert_eq!(restored.get(Field::ValidationDelay), "1");

    assert_eq!(records[3].get(Field::Tablets), "12, 14, 16, 18");

    assert_eq!(assembly.trace.rejected_count(), 3);
    assert!(assembly
        .trace
        .events
        .iter()
        .any(|e| e.page_number == 2 && e.kind == EventKind::ContinuationConsumed { into_row: 1 }));

    for record in records {
        assert_eq!(record.width(), CanonicalRecord::WIDTH);
    }
}

// ---------------------------------------------------------------------------
// Validator and business view over an assembled run
// ---------------------------------------------------------------------------
#[test]
fn validator_reports_one_missing_slip() {
    let source = MockSource {
        tables: vec![page(
            1,
            vec![
                closed("729000012101"),
                closed("729000012102"),
                closed("729000012104"),
            ],
        )],
    };
    let profile = load_preset(DEFAULT_PRESET).unwrap();
    let assembly = read_and_assemble(&[], &source, &profile).unwrap();
    let report = check_completeness(&assembly, &detectors());

    assert_eq!(report.valid_slips, 3);
    assert_eq!(report.dropped_records, 0);
    let seq = report.sequence.unwrap();
    assert_eq!((seq.first, seq.last), (101, 104));
    assert_eq!(seq.missing, 1);
}

#[test]
fn validator_counts_dropped_rows_against_completeness() {
    let source = MockSource {
        tables: vec![page(
            1,
            vec![closed("729000012101"), vec!["729000012102 FL", "Tower A"]],
        )],
    };
    let profile = load_preset(DEFAULT_PRESET).unwrap();
    let assembly = read_and_assemble(&[], &source, &profile).unwrap();
    assert_eq!(assembly.records.len(), 1);
    assert_eq!(assembly.trace.dropped_count(), 1);

    let report = check_completeness(&assembly, &detectors());
    assert_eq!(report.dropped_records, 1);
    assert_eq!(report.completeness_percent.to_string(), "50.0");
    assert_ne!(report.grade.to_string(), "excellent");
}

#[test]
fn business_summary_over_assembled_records() {
    let d = detectors();
    let source = MockSource {
        tables: vec![page(1, vec![closed("729000012101"), closed("729000012102")])],
    };
    let profile = load_preset(DEFAULT_PRESET).unwrap();
    let assembly = read_and_assemble(&[], &source, &profile).unwrap();

    let calendar = BusinessCalendar::from_profile(&profile);
    let business: Vec<BusinessRecord> = assembly
        .records
        .iter()
        .map(|r| BusinessRecord::derive(r, &d, &calendar))
        .collect();
    assert!(business.iter().all(|b| b.is_closed));
    assert_eq!(business[0].business_days_to_close, Some(5));

    let summary = summarize(&business);
    assert_eq!(summary.closed, 2);
    assert!(summary.alerts.is_empty());
}

// ---------------------------------------------------------------------------
// Attempts and input files
// ---------------------------------------------------------------------------
#[test]
fn best_attempt_wins() {
    let d = detectors();
    let profile = load_preset(DEFAULT_PRESET).unwrap();
    let sparse = MockSource {
        tables: vec![page(1, vec![closed("729000012101")])],
    };
    let full = MockSource {
        tables: vec![page(1, vec![closed("729000012101"), closed("729000012102")])],
    };
    let attempts = vec![
        Attempt {
            name: "sparse".into(),
            assembly: read_and_assemble(&[], &sparse, &profile).unwrap(),
        },
        Attempt {
            name: "full".into(),
            assembly: read_and_assemble(&[], &full, &profile).unwrap(),
        },
    ];
    assert_eq!(choose_best_attempt(attempts, &d).unwrap().name, "full");
}

#[test]
fn json_dump_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tables.json");
    let json = serde_json::json!([{ "page_number": 1, "rows": [closed("729000012101")] }]);
    std::fs::write(&path, json.to_string()).unwrap();

    let source = source_for_path(&path).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    let profile = load_preset(DEFAULT_PRESET).unwrap();
    let assembly = read_and_assemble(&bytes, source.as_ref(), &profile).unwrap();
    assert_eq!(assembly.records[0].slip(), "729000012101");
}

#[test]
fn empty_source_is_an_error() {
    let source = MockSource { tables: vec![] };
    let profile = load_preset(DEFAULT_PRESET).unwrap();
    let err = read_and_assemble(&[], &source, &profile).unwrap_err();
    assert!(matches!(err, RetslipError::NoTables));
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------
proptest! {
    #[test]
    fn rows_without_slip_ids_are_rejected(
        rows in prop::collection::vec(
            prop::collection::vec("[A-Za-z0-9 ,/]{0,20}", 1..20),
            0..12,
        )
    ) {
        let d = detectors();
        let rows: Vec<Vec<String>> = rows
            .into_iter()
            .filter(|cells| d.find_slip(&cells.join(" ")).is_none())
            .collect();
        let n = rows.len();
        let tables = vec![RawTable {
            page_number: 1,
            rows: rows.into_iter().map(RawRow::new).collect(),
        }];

        let assembly = retslip_core::parsing::assemble(&tables, &d);
        prop_assert!(assembly.records.is_empty());
        prop_assert_eq!(assembly.trace.rejected_count(), n);
    }

    #[test]
    fn corrected_records_are_stable(
        tail in prop::collection::vec(
            prop::sample::select(vec!["", "No", "Yes", "3", "5", "12, 14", "4 105M", "105M", "3/8/2024"]),
            8..12,
        )
    ) {
        let d = detectors();
        let mut cells = to_cells(&closed("729000012101")[..10]);
        cells.extend(tail.iter().map(|s| s.to_string()));

        let first = run_chain(&d, cells);
        let second = run_chain(&d, first.cells.clone());
        prop_assert_eq!(second.cells, first.cells);
    }
}
