use crate::model::{CanonicalRecord, Field};
use crate::parsing::detect::Detectors;
use crate::parsing::shape::row_text;

const SEPARATOR: char = ',';

/// Items appended to one list-valued field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Continuation {
    pub field: Field,
    pub items: Vec<String>,
}

/// Result of fusing a continuation row into the row before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merge {
    pub cells: Vec<String>,
    pub continuations: Vec<Continuation>,
}

/// Fuse the next raw row into `cells` when a list-valued field was cut off.
///
/// A field is cut off when its value ends with a separator. The next row
/// counts as its continuation only if it carries no slip number of its own.
/// Returns `None` when nothing was merged; the next row is then left alone.
pub fn merge_continuation(
    detectors: &Detectors,
    cells: &[String],
    next: Option<&[String]>,
) -> Option<Merge> {
    if detectors.find_slip(&row_text(cells)).is_none() {
        return None;
    }

    let mut merged = cells.to_vec();
    if merged.len() < CanonicalRecord::WIDTH {
        merged.resize(CanonicalRecord::WIDTH, String::new());
    }

    let wants_tablets = is_cut_off(&merged[Field::Tablets.index()]);
    let wants_open = is_cut_off(&merged[Field::Open.index()]);
    if !wants_tablets && !wants_open {
        return None;
    }

    let next_text = row_text(next?);
    if detectors.find_slip(&next_text).is_some() {
        return None;
    }

    let mut continuations = Vec::new();
    if wants_tablets {
        let items = detectors.extract_small_integers(&next_text);
        if !items.is_empty() {
            append_items(&mut merged[Field::Tablets.index()], &items);
            continuations.push(Continuation {
                field: Field::Tablets,
                items: items.iter().map(|s| s.to_string()).collect(),
            });
        }
    }
    if wants_open {
        let items = detectors.extract_tablet_codes(&next_text);
        if !items.is_empty() {
            append_items(&mut merged[Field::Open.index()], &items);
            continuations.push(Continuation {
                field: Field::Open,
                items: items.iter().map(|s| s.to_string()).collect(),
            });
        }
    }

    if continuations.is_empty() {
        return None;
    }

    Some(Merge {
        cells: merged,
        continuations,
    })
}

fn is_cut_off(value: &str) -> bool {
    value.trim().ends_with(SEPARATOR)
}

fn append_items(value: &mut String, items: &[&str]) {
    let head = strip_dangling(value);
    *value = if head.is_empty() {
        items.join(", ")
    } else {
        format!("{}, {}", head, items.join(", "))
    };
}

fn strip_dangling(value: &str) -> &str {
    value.trim_end_matches(|c: char| c == SEPARATOR || c.is_whitespace())
}
