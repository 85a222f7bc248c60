//! Domain models for the Sheetjson conversion pipeline.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`CellValue`] - A scalar read from a spreadsheet cell (or injected by a rule)
//! - [`Record`] - One data row: ordered mapping from field name to value
//! - [`Sheet`] - A named, ordered sequence of records
//! - [`Workbook`] - Ordered collection of sheets, serialized as `{ sheet: [records] }`

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::ser::{Error as _, SerializeMap};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Format used for date cells in the JSON output and in text rendering.
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

// =============================================================================
// Cell Value
// =============================================================================

/// A scalar value held by a record field.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Blank cell. Serialized as `null`.
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Date or date-time cell.
    DateTime(NaiveDateTime),
    /// Time-span cell.
    Duration(chrono::Duration),
    /// Spreadsheet error such as `#DIV/0!`. Has no JSON representation.
    Error(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Returns why this value cannot be written as JSON, if it cannot.
    pub fn representation_issue(&self) -> Option<String> {
        match self {
            CellValue::Error(code) => Some(format!("cell error {} has no JSON representation", code)),
            CellValue::Float(f) if !f.is_finite() => {
                Some(format!("non-finite number {} has no JSON representation", f))
            }
            _ => None,
        }
    }

    /// Build a value from a configuration JSON value.
    ///
    /// Only scalars are accepted; on failure the JSON kind is returned.
    pub fn from_json(value: &Value) -> Result<Self, &'static str> {
        match value {
            Value::Null => Ok(CellValue::Empty),
            Value::Bool(b) => Ok(CellValue::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(CellValue::Int(i)),
                None => n.as_f64().map(CellValue::Float).ok_or("number"),
            },
            Value::String(s) => Ok(CellValue::Text(s.clone())),
            Value::Array(_) => Err("array"),
            Value::Object(_) => Err("object"),
        }
    }
}

/// Text rendering used when values are concatenated. `Empty` renders as `""`.
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(x) => write!(f, "{}", x),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
            CellValue::Duration(d) => write!(f, "{}", d),
            CellValue::Error(code) => f.write_str(code),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(x: f64) -> Self {
        CellValue::Float(x)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let Some(issue) = self.representation_issue() {
            return Err(S::Error::custom(issue));
        }
        match self {
            CellValue::Empty => serializer.serialize_unit(),
            CellValue::Text(s) | CellValue::Error(s) => serializer.serialize_str(s),
            CellValue::Int(i) => serializer.serialize_i64(*i),
            CellValue::Float(x) => serializer.serialize_f64(*x),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            CellValue::DateTime(_) | CellValue::Duration(_) => serializer.collect_str(self),
        }
    }
}

// =============================================================================
// Record
// =============================================================================

/// One data row, keyed by column header.
///
/// Field order follows the sheet's columns; fields added by modification
/// rules are appended after them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: IndexMap<String, CellValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&CellValue> {
        self.fields.get(field)
    }

    /// Text of a field, or `""` when the field is absent.
    ///
    /// Missing fields are not an error for the modification rules.
    pub fn get_or_empty(&self, field: &str) -> String {
        self.fields
            .get(field)
            .map(|v| v.to_string())
            .unwrap_or_default()
    }

    /// Set a field, overwriting any previous value in place.
    pub fn set(&mut self, field: impl Into<String>, value: CellValue) {
        self.fields.insert(field.into(), value);
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, CellValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, CellValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, value) in &self.fields {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

// =============================================================================
// Sheet & Workbook
// =============================================================================

/// A named sheet: its column headers and one record per data row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub records: Vec<Record>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Field names of the first record, or the headers if the sheet has no rows.
    pub fn field_names(&self) -> Vec<String> {
        match self.records.first() {
            Some(record) => record.field_names().map(str::to_string).collect(),
            None => self.headers.clone(),
        }
    }
}

/// Ordered collection of sheets, as read from one workbook.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn record_count(&self) -> usize {
        self.sheets.iter().map(|s| s.records.len()).sum()
    }
}

/// Serialized as a mapping from sheet name to that sheet's records, in workbook order.
impl Serialize for Workbook {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sheets.len()))?;
        for sheet in &self.sheets {
            map.serialize_entry(&sheet.name, &sheet.records)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn person(nombre: &str, apellido: Option<&str>) -> Record {
        let mut record = Record::new();
        record.set("Nombre", nombre.into());
        if let Some(a) = apellido {
            record.set("Apellido", a.into());
        }
        record
    }

    #[test]
    fn test_get_or_empty_for_missing_field() {
        let record = person("Ana", None);
        assert_eq!(record.get_or_empty("Nombre"), "Ana");
        assert_eq!(record.get_or_empty("Apellido"), "");
    }

    #[test]
    fn test_set_overwrites_in_place() {
        let mut record = person("Ana", Some("Ruiz"));
        record.set("Nombre", "Eva".into());
        assert_eq!(record.field_names().collect::<Vec<_>>(), vec!["Nombre", "Apellido"]);
        assert_eq!(record.get("Nombre"), Some(&CellValue::Text("Eva".into())));
    }

    #[test]
    fn test_text_rendering() {
        assert_eq!(CellValue::Empty.to_string(), "");
        assert_eq!(CellValue::Int(30).to_string(), "30");
        assert_eq!(CellValue::Float(2.5).to_string(), "2.5");
        assert_eq!(CellValue::Bool(true).to_string(), "true");

        let dt = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        assert_eq!(CellValue::DateTime(dt).to_string(), "2024-01-15T08:30:00");
    }

    #[test]
    fn test_duration_uses_iso_form() {
        let span = CellValue::Duration(chrono::Duration::seconds(5400));
        assert_eq!(span.to_string(), "PT5400S");
        assert_eq!(serde_json::to_string(&span).unwrap(), r#""PT5400S""#);
    }

    #[test]
    fn test_from_json_scalars_only() {
        assert_eq!(CellValue::from_json(&json!(null)), Ok(CellValue::Empty));
        assert_eq!(CellValue::from_json(&json!(7)), Ok(CellValue::Int(7)));
        assert_eq!(CellValue::from_json(&json!(1.5)), Ok(CellValue::Float(1.5)));
        assert_eq!(CellValue::from_json(&json!("x")), Ok(CellValue::Text("x".into())));
        assert_eq!(CellValue::from_json(&json!([1, 2])), Err("array"));
        assert_eq!(CellValue::from_json(&json!({"a": 1})), Err("object"));
    }

    #[test]
    fn test_workbook_serializes_in_sheet_order() {
        let mut first = Sheet::new("Zeta");
        first.records.push(person("Ana", Some("Ruiz")));
        let second = Sheet::new("Alfa");
        let workbook = Workbook::new(vec![first, second]);

        let text = serde_json::to_string(&workbook).unwrap();
        assert_eq!(text, r#"{"Zeta":[{"Nombre":"Ana","Apellido":"Ruiz"}],"Alfa":[]}"#);
    }

    #[test]
    fn test_error_cell_is_not_serializable() {
        let mut record = Record::new();
        record.set("Total", CellValue::Error("#DIV/0!".into()));
        let err = serde_json::to_string(&record).unwrap_err();
        assert!(err.to_string().contains("#DIV/0!"));
    }

    #[test]
    fn test_non_finite_float_is_not_serializable() {
        assert!(CellValue::Float(f64::NAN).representation_issue().is_some());
        assert!(CellValue::Float(1.0).representation_issue().is_none());
    }
}
