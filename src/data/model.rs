use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the source table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the dtypes a CSV survey export carries.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Lenient numeric cast: integers and floats convert, everything else
    /// (text, booleans, nulls, NaN) is missing.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) if !v.is_nan() => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Text view of the cell, used for categorical columns.
    /// Numbers and booleans are rendered with `Display`; nulls and NaN are missing.
    pub fn as_label(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Float(v) if v.is_nan() => None,
            CellValue::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// RawRecord – one row of the source table
// ---------------------------------------------------------------------------

/// A single survey response exactly as read from the source.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    /// Column name → cell value. Columns absent from a record read as null.
    pub fields: BTreeMap<String, CellValue>,
}

impl RawRecord {
    pub fn get(&self, column: &str) -> &CellValue {
        const NULL: &CellValue = &CellValue::Null;
        self.fields.get(column).unwrap_or(NULL)
    }

    /// Whether the cell is absent or null.
    pub fn is_missing(&self, column: &str) -> bool {
        self.get(column).is_null()
    }
}

// ---------------------------------------------------------------------------
// RawTable – the complete loaded source
// ---------------------------------------------------------------------------

/// The full parsed source table.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// Header names in source order.
    pub column_names: Vec<String>,
    /// All rows.
    pub records: Vec<RawRecord>,
}

impl RawTable {
    pub fn new(column_names: Vec<String>, records: Vec<RawRecord>) -> Self {
        RawTable {
            column_names,
            records,
        }
    }

    pub fn row_count(&self) -> usize {
        self.records.len()
    }
}
