pub mod xlsx;

use crate::error::RetslipError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

pub use xlsx::XlsxTableSource;

/// One row of cells as the table extractor produced it. Cell count is
/// arbitrary and says nothing about column alignment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRow {
    pub cells: Vec<String>,
}

impl RawRow {
    pub fn new<S: Into<String>>(cells: impl IntoIterator<Item = S>) -> Self {
        RawRow {
            cells: cells.into_iter().map(Into::into).collect(),
        }
    }
}

/// Rows of one extracted table, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    pub page_number: usize,
    pub rows: Vec<RawRow>,
}

/// Trait for raw table extraction backends.
pub trait TableSource: Send + Sync {
    /// Read every table in the input, one or more per page.
    fn read_tables(&self, bytes: &[u8]) -> Result<Vec<RawTable>, RetslipError>;

    /// Name of this backend (for diagnostics).
    fn source_name(&self) -> &str;
}

/// Pick a table source from a file extension.
pub fn source_for_path(path: &Path) -> Result<Box<dyn TableSource>, RetslipError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("json") => Ok(Box::new(JsonTableSource)),
        Some("xlsx") => Ok(Box::new(XlsxTableSource)),
        _ => Err(RetslipError::UnsupportedInput(path.display().to_string())),
    }
}

/// Tables dumped as JSON by an external extractor.
///
/// Accepts `[{"page_number": 1, "rows": [["FL", ...], ...]}, ...]` or a bare
/// array of pages, each an array of rows. Numbers and nulls in cells are
/// read as text.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonTableSource;

#[derive(Deserialize)]
#[serde(untagged)]
enum TableDump {
    Tables(Vec<TableEntry>),
    Pages(Vec<Vec<Vec<Value>>>),
}

#[derive(Deserialize)]
struct TableEntry {
    #[serde(default)]
    page_number: Option<usize>,
    rows: Vec<Vec<Value>>,
}

impl TableSource for JsonTableSource {
    fn read_tables(&self, bytes: &[u8]) -> Result<Vec<RawTable>, RetslipError> {
        let dump: TableDump = serde_json::from_slice(bytes)
            .map_err(|e| RetslipError::TableSource(format!("invalid table dump: {e}")))?;

        let tables: Vec<RawTable> = match dump {
            TableDump::Tables(entries) => entries
                .into_iter()
                .enumerate()
                .map(|(i, t)| RawTable {
                    page_number: t.page_number.unwrap_or(i + 1),
                    rows: t.rows.into_iter().map(row_from_values).collect(),
                })
                .collect(),
            TableDump::Pages(pages) => pages
                .into_iter()
                .enumerate()
                .map(|(i, rows)| RawTable {
                    page_number: i + 1,
                    rows: rows.into_iter().map(row_from_values).collect(),
                })
                .collect(),
        };

        if tables.is_empty() {
            return Err(RetslipError::NoTables);
        }
        Ok(tables)
    }

    fn source_name(&self) -> &str {
        "json"
    }
}

fn row_from_values(values: Vec<Value>) -> RawRow {
    RawRow {
        cells: values.into_iter().map(value_as_cell).collect(),
    }
}

fn value_as_cell(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_tagged_tables() {
        let json = r#"[{"page_number": 3, "rows": [["FL", "612D", 729000012345], ["", null]]}]"#;
        let tables = JsonTableSource.read_tables(json.as_bytes()).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].page_number, 3);
        assert_eq!(tables[0].rows[0].cells, vec!["FL", "612D", "729000012345"]);
        assert_eq!(tables[0].rows[1].cells, vec!["", ""]);
    }

    #[test]
    fn test_reads_bare_pages() {
        let json = r#"[[["FL", "612D"]], [["GA"], ["x"]]]"#;
        let tables = JsonTableSource.read_tables(json.as_bytes()).unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[1].page_number, 2);
        assert_eq!(tables[1].rows.len(), 2);
    }

    #[test]
    fn test_empty_dump_has_no_tables() {
        let err = JsonTableSource.read_tables(b"[]").unwrap_err();
        assert!(matches!(err, RetslipError::NoTables));
    }

    #[test]
    fn test_garbage_is_a_table_source_error() {
        let err = JsonTableSource.read_tables(b"{\"rows\": 1}").unwrap_err();
        assert!(matches!(err, RetslipError::TableSource(_)));
    }

    #[test]
    fn test_source_for_path() {
        assert_eq!(
            source_for_path(Path::new("a.JSON")).unwrap().source_name(),
            "json"
        );
        assert_eq!(
            source_for_path(Path::new("report.xlsx")).unwrap().source_name(),
            "xlsx"
        );
        assert!(matches!(
            source_for_path(Path::new("report.pdf")),
            Err(RetslipError::UnsupportedInput(_))
        ));
    }
}
