use crate::model::join_non_empty;
use crate::parsing::detect::Detectors;
use crate::trace::RejectReason;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a raw row's cells relate to the canonical columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowShape {
    /// Cells are (close to) one field each; the corrector chain handles any
    /// residual shift.
    WellFormed,
    /// Several fields share a cell that still fits the column model: a
    /// multi-line leading cell or a warehouse code fused with the slip id.
    MultiCellMerge,
    /// The whole record collapsed into one oversized cell.
    SingleCellCollapse { column: usize },
}

impl fmt::Display for RowShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowShape::WellFormed => write!(f, "well-formed"),
            RowShape::MultiCellMerge => write!(f, "multi-cell merge"),
            RowShape::SingleCellCollapse { column } => {
                write!(f, "single-cell collapse (column {column})")
            }
        }
    }
}

/// Check whether a row looks like a return slip at all.
///
/// `row_text` is the row's non-empty cells joined by a space.
pub fn screen_row(detectors: &Detectors, row_text: &str) -> Result<(), RejectReason> {
    if detectors.find_slip(row_text).is_none() {
        return Err(RejectReason::NoSlipId);
    }
    if !detectors.has_region_code(row_text) {
        return Err(RejectReason::NoRegionCode);
    }
    if let Some(marker) = detectors.noise_marker(row_text) {
        return Err(RejectReason::Noise(marker.to_string()));
    }
    Ok(())
}

pub fn row_text(cells: &[String]) -> String {
    join_non_empty(cells)
}

/// Classify a screened row once, so each shape has exactly one handler.
pub fn classify_shape(detectors: &Detectors, cells: &[String]) -> RowShape {
    let profile = detectors.profile();

    for (column, cell) in cells.iter().take(3).enumerate() {
        if detectors.find_slip(cell).is_none() {
            continue;
        }
        let len = cell.chars().count();
        if len > profile.collapse_threshold
            || ((column == 1 || column == 2) && len > profile.fused_cell_threshold)
        {
            return RowShape::SingleCellCollapse { column };
        }
    }

    let leading_multi_line = cells
        .first()
        .is_some_and(|c| c.contains('\n') && detectors.find_slip(c).is_some());
    let fused_id = cells
        .iter()
        .skip(1)
        .take(3)
        .any(|c| detectors.split_warehouse_slip(c).is_some());

    if leading_multi_line || fused_id {
        RowShape::MultiCellMerge
    } else {
        RowShape::WellFormed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::detect::tests::detectors;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_screen_rejects_rows_without_slip() {
        let d = detectors();
        assert_eq!(
            screen_row(&d, "FL 612D 3/1/2024"),
            Err(RejectReason::NoSlipId)
        );
    }

    #[test]
    fn test_screen_rejects_rows_without_region_code() {
        let d = detectors();
        assert_eq!(
            screen_row(&d, "612d 729000012345"),
            Err(RejectReason::NoRegionCode)
        );
    }

    #[test]
    fn test_screen_rejects_noise() {
        let d = detectors();
        assert_eq!(
            screen_row(&d, "FL Page 3 729000012345"),
            Err(RejectReason::Noise("Page".into()))
        );
    }

    #[test]
    fn test_screen_accepts_data_row() {
        let d = detectors();
        assert!(screen_row(&d, "FL 612D 729000012345 3/1/2024").is_ok());
    }

    #[test]
    fn test_row_text_skips_empty_cells() {
        assert_eq!(row_text(&cells(&["FL", " ", "612D", ""])), "FL 612D");
    }

    #[test]
    fn test_classify_well_formed() {
        let d = detectors();
        let row = cells(&["FL", "612D", "729000012345", "3/1/2024"]);
        assert_eq!(classify_shape(&d, &row), RowShape::WellFormed);
    }

    #[test]
    fn test_classify_fused_id_as_merge() {
        let d = detectors();
        let row = cells(&["FL", "612D 729000012345", "", "3/1/2024"]);
        assert_eq!(classify_shape(&d, &row), RowShape::MultiCellMerge);
    }

    #[test]
    fn test_classify_multi_line_leading_cell_as_merge() {
        let d = detectors();
        let row = cells(&["FL\n612D\n729000012345", "3/1/2024"]);
        assert_eq!(classify_shape(&d, &row), RowShape::MultiCellMerge);
    }

    #[test]
    fn test_classify_collapse() {
        let d = detectors();
        let text = "FL 612D 729000012345 3/1/2024 41234567 FL301 3/2/2024 3/3/2024 \
                    JGR Construction Tower A Yes 3/5/2024 105M 2 1 3";
        let row = cells(&[text]);
        assert_eq!(
            classify_shape(&d, &row),
            RowShape::SingleCellCollapse { column: 0 }
        );
    }

    #[test]
    fn test_classify_long_id_cell_in_column_one_as_collapse() {
        let d = detectors();
        let row = cells(&["FL", "612D 729000012345 3/1/2024 41234567", ""]);
        assert_eq!(
            classify_shape(&d, &row),
            RowShape::SingleCellCollapse { column: 1 }
        );
    }
}
