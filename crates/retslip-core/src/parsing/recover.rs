use crate::model::{CanonicalRecord, Definitive, Field};
use crate::parsing::detect::Detectors;

/// How many leading tablet codes fill the Tablets column.
const TABLET_CODES_KEPT: usize = 4;
/// How many trailing tablet codes fill Open when more than four were found.
const OPEN_CODES_KEPT: usize = 2;

/// Rebuild all 18 fields of a record whose cells collapsed into one string.
///
/// Best effort: each field is located independently by pattern and left
/// empty when absent. The result is not passed through the corrector chain.
pub fn recover_unified_row(detectors: &Detectors, text: &str) -> CanonicalRecord {
    let profile = detectors.profile();
    let mut record = CanonicalRecord::from_cells(Vec::new());

    record.set(Field::State, profile.default_state_code.as_str());
    record.set(
        Field::ReturnPrefix,
        detectors
            .extract_warehouse_code(&detectors.strip_dates(leading_text(detectors, text)))
            .unwrap_or_else(|| profile.fallback_warehouse_code.clone()),
    );
    if let Some(slip) = detectors.find_slip(text) {
        record.set(Field::ReturnSlip, slip);
    }

    let date_slots = [
        Field::ReturnDate,
        Field::InvoiceDate1,
        Field::InvoiceDate2,
        Field::CountedDate,
    ];
    for (field, date) in date_slots.into_iter().zip(detectors.extract_dates(text)) {
        record.set(field, date);
    }

    if let Some(jobsite) = detectors.find_jobsite(text) {
        record.set(Field::Jobsite, jobsite);
    }
    if let Some(cost_center) = detectors.find_cost_center(text) {
        record.set(Field::CostCenter, cost_center);
    }

    if let Some(customer) = detectors.find_customer(text) {
        record.set(Field::Customer, customer);
        record.set(Field::JobName, job_name_after(detectors, text, customer));
    }

    if let Some(flag) = detectors.find_definitive(text).and_then(Definitive::parse) {
        record.set(Field::Definitive, flag.as_str());
    }

    let codes = detectors.extract_tablet_codes(text);
    record.set(
        Field::Tablets,
        codes
            .iter()
            .take(TABLET_CODES_KEPT)
            .copied()
            .collect::<Vec<_>>()
            .join(", "),
    );
    if codes.len() > TABLET_CODES_KEPT {
        record.set(Field::Open, codes[codes.len() - OPEN_CODES_KEPT..].join(", "));
    }

    let undated = detectors.strip_dates(text);
    let tail = tail_chars(&undated, profile.tail_window);
    let numbers = detectors.extract_tail_integers(tail);
    for (from_end, field) in [
        (5, Field::Total),
        (4, Field::TabletsTotal),
        (2, Field::CountingDelay),
        (1, Field::ValidationDelay),
    ] {
        if let Some(n) = numbers.len().checked_sub(from_end).map(|i| numbers[i]) {
            record.set(field, n);
        }
    }

    record
}

/// Text between the customer name and the next definitive flag.
fn job_name_after(detectors: &Detectors, text: &str, customer: &str) -> String {
    let Some(at) = text.find(customer) else {
        return String::new();
    };
    let rest = &text[at + customer.len()..];
    match detectors.split_at_definitive(rest) {
        Some((job, _)) => job.trim().to_string(),
        None => String::new(),
    }
}

/// The last `window` characters of `s`.
fn tail_chars(s: &str, window: usize) -> &str {
    let start = s
        .char_indices()
        .rev()
        .take(window)
        .last()
        .map_or(s.len(), |(i, _)| i);
    &s[start..]
}

/// Text before the slip number, where the warehouse code is printed.
fn leading_text<'a>(detectors: &Detectors, text: &'a str) -> &'a str {
    detectors
        .find_slip(text)
        .and_then(|slip| text.find(slip))
        .map_or(text, |end| &text[..end])
}
