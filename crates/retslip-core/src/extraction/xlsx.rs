use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use chrono::NaiveDate;

use crate::error::RetslipError;
use crate::extraction::{RawRow, RawTable, TableSource};

/// Tables exported to an xlsx workbook: every worksheet is one page and
/// every sheet row one raw row.
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxTableSource;

impl TableSource for XlsxTableSource {
    fn read_tables(&self, bytes: &[u8]) -> Result<Vec<RawTable>, RetslipError> {
        let cursor = Cursor::new(bytes);
        let mut workbook: Xlsx<_> = calamine::open_workbook_from_rs(cursor)
            .map_err(|e| RetslipError::TableSource(format!("failed to open xlsx: {e}")))?;

        let mut tables = Vec::new();
        for (i, name) in workbook.sheet_names().into_iter().enumerate() {
            let range = workbook.worksheet_range(&name).map_err(|e| {
                RetslipError::TableSource(format!("failed to read sheet '{name}': {e}"))
            })?;

            let rows: Vec<RawRow> = range
                .rows()
                .map(|row| RawRow {
                    cells: row.iter().map(cell_as_text).collect(),
                })
                .filter(|row| row.cells.iter().any(|c| !c.is_empty()))
                .collect();

            if !rows.is_empty() {
                tables.push(RawTable {
                    page_number: i + 1,
                    rows,
                });
            }
        }

        if tables.is_empty() {
            return Err(RetslipError::NoTables);
        }
        tracing::debug!(sheets = tables.len(), "read xlsx tables");
        Ok(tables)
    }

    fn source_name(&self) -> &str {
        "xlsx"
    }
}

fn cell_as_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => float_as_text(*f),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::Empty => String::new(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => report_date(datetime.date()),
            None => float_as_text(dt.as_f64()),
        },
        Data::DateTimeIso(s) => s
            .get(..10)
            .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
            .map_or_else(|| s.clone(), report_date),
        _ => format!("{cell}"),
    }
}

/// Dates print the way the report itself prints them (`M/D/YYYY`).
fn report_date(date: NaiveDate) -> String {
    date.format("%-m/%-d/%Y").to_string()
}

/// Whole numbers print without a fractional part; slip ids are stored as
/// floats by most spreadsheet writers.
fn float_as_text(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}
