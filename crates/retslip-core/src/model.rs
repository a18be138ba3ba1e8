use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// The 18 canonical columns of a return slip, in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    State,
    ReturnPrefix,
    ReturnSlip,
    ReturnDate,
    Jobsite,
    CostCenter,
    InvoiceDate1,
    InvoiceDate2,
    Customer,
    JobName,
    Definitive,
    CountedDate,
    Tablets,
    Total,
    Open,
    TabletsTotal,
    CountingDelay,
    ValidationDelay,
}

impl Field {
    pub const ALL: [Field; 18] = [
        Field::State,
        Field::ReturnPrefix,
        Field::ReturnSlip,
        Field::ReturnDate,
        Field::Jobsite,
        Field::CostCenter,
        Field::InvoiceDate1,
        Field::InvoiceDate2,
        Field::Customer,
        Field::JobName,
        Field::Definitive,
        Field::CountedDate,
        Field::Tablets,
        Field::Total,
        Field::Open,
        Field::TabletsTotal,
        Field::CountingDelay,
        Field::ValidationDelay,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Column header used in exports.
    pub fn name(self) -> &'static str {
        match self {
            Field::State => "State",
            Field::ReturnPrefix => "Return_Prefix",
            Field::ReturnSlip => "Return_Slip",
            Field::ReturnDate => "Return_Date",
            Field::Jobsite => "Jobsite",
            Field::CostCenter => "Cost_Center",
            Field::InvoiceDate1 => "Invoice_Date1",
            Field::InvoiceDate2 => "Invoice_Date2",
            Field::Customer => "Customer",
            Field::JobName => "Job_Name",
            Field::Definitive => "Definitive",
            Field::CountedDate => "Counted_Date",
            Field::Tablets => "Tablets",
            Field::Total => "Total",
            Field::Open => "Open",
            Field::TabletsTotal => "Tablets_Total",
            Field::CountingDelay => "Counting_Delay",
            Field::ValidationDelay => "Validation_Delay",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether a slip's count has been finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Definitive {
    Yes,
    No,
}

impl Definitive {
    /// Parse a whole cell, folding truncated spellings ("Ye") produced by
    /// upstream text wrapping.
    pub fn parse(s: &str) -> Option<Definitive> {
        match s.trim().to_lowercase().as_str() {
            "yes" | "ye" => Some(Definitive::Yes),
            "no" => Some(Definitive::No),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Definitive::Yes => "Yes",
            Definitive::No => "No",
        }
    }
}

impl fmt::Display for Definitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reconstructed return slip.
///
/// Always holds at least [`CanonicalRecord::WIDTH`] fields. A record may carry
/// a non-empty overflow tail when a shift correction pushed a genuine value
/// past the last canonical column; trailing empty padding is never kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRecord {
    fields: Vec<String>,
}

impl CanonicalRecord {
    pub const WIDTH: usize = 18;

    /// Build a record from raw cell values, padding to width and dropping
    /// empty cells past the canonical width.
    pub fn from_cells(cells: Vec<String>) -> Self {
        let mut fields = cells;
        if fields.len() < Self::WIDTH {
            fields.resize(Self::WIDTH, String::new());
        }
        trim_padding(&mut fields);
        CanonicalRecord { fields }
    }

    pub fn get(&self, field: Field) -> &str {
        &self.fields[field.index()]
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.fields[field.index()] = value.into();
    }

    /// The 18 canonical values.
    pub fn canonical(&self) -> &[String] {
        &self.fields[..Self::WIDTH]
    }

    /// Values pushed past the last canonical column by a shift correction.
    pub fn overflow(&self) -> &[String] {
        &self.fields[Self::WIDTH..]
    }

    pub fn width(&self) -> usize {
        self.fields.len()
    }

    pub fn slip(&self) -> &str {
        self.get(Field::ReturnSlip)
    }

    pub fn definitive(&self) -> Option<Definitive> {
        Definitive::parse(self.get(Field::Definitive))
    }

    /// All non-empty values joined by a single space.
    pub fn row_text(&self) -> String {
        join_non_empty(&self.fields)
    }

    pub fn cells(&self) -> &[String] {
        &self.fields
    }

    pub fn into_cells(self) -> Vec<String> {
        self.fields
    }
}

impl Serialize for CanonicalRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let has_overflow = !self.overflow().is_empty();
        let len = Self::WIDTH + usize::from(has_overflow);
        let mut map = serializer.serialize_map(Some(len))?;
        for field in Field::ALL {
            map.serialize_entry(field.name(), self.get(field))?;
        }
        if has_overflow {
            map.serialize_entry("overflow", self.overflow())?;
        }
        map.end()
    }
}

/// Drop empty cells past the canonical width; a non-empty tail value keeps
/// every cell before it.
pub(crate) fn trim_padding(fields: &mut Vec<String>) {
    while fields.len() > CanonicalRecord::WIDTH
        && fields.last().is_some_and(|s| s.trim().is_empty())
    {
        fields.pop();
    }
}

pub(crate) fn join_non_empty(cells: &[String]) -> String {
    cells
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
