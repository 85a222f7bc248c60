//! High-level conversion API: workbook in, JSON document out.
//!
//! Steps, each with its own error type:
//!
//! 1. **Read** - open the workbook, one record per data row ([`ReadError`])
//! 2. **Transform** - apply the same [`ModificationSpec`] to every record
//!    of every sheet ([`TransformError`])
//! 3. **Serialize** - pretty-print `{ sheet: [records] }` with 4-space
//!    indentation, non-ASCII text unescaped ([`SerializeError`])
//!
//! A failure at any step aborts the whole conversion; no partial document
//! is ever returned.
//!
//! # Example
//!
//! ```rust,ignore
//! use sheetjson::{convert_file, ModificationSpec};
//! use std::path::Path;
//!
//! let spec = ModificationSpec::standard_now();
//! match convert_file(Path::new("clientes.xlsx"), &spec) {
//!     Ok(conversion) => std::fs::write("resultado.json", conversion.json)?,
//!     Err(e) => eprintln!("{} (step: {})", e, e.step()),
//! }
//! ```
//!
//! [`ReadError`]: crate::error::ReadError
//! [`TransformError`]: crate::error::TransformError

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use std::io::Read;
use std::path::Path;

use crate::api::logs::{log_error, log_info, log_info_indent, log_success};
use crate::error::{ConversionError, ConversionResult, ReadError, SerializeError, SerializeResult};
use crate::models::Workbook;
use crate::parser::{read_workbook, read_workbook_bytes, read_workbook_file};
use crate::transform::modifications::ModificationSpec;

/// File name suggested when the document is offered for download.
pub const DEFAULT_OUTPUT_FILE_NAME: &str = "resultado.json";

/// Indentation of the output document.
const INDENT: &[u8] = b"    ";

/// Result of a successful conversion.
#[derive(Debug, Clone, Serialize)]
pub struct Conversion {
    /// The serialized document
    pub json: String,

    /// One entry per sheet, in workbook order
    pub sheets: Vec<SheetSummary>,
}

/// Shape of one converted sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetSummary {
    pub name: String,
    pub record_count: usize,
    /// Field names after modification
    pub fields: Vec<String>,
}

impl Conversion {
    pub fn record_count(&self) -> usize {
        self.sheets.iter().map(|s| s.record_count).sum()
    }
}

/// Convert a workbook held in memory.
pub fn convert_bytes(bytes: &[u8], spec: &ModificationSpec) -> ConversionResult<Conversion> {
    log_info("📖 Reading workbook...");
    let workbook = read_workbook_bytes(bytes).map_err(read_failed)?;
    convert_workbook(workbook, spec)
}

/// Convert a workbook from a reader. The reader is fully consumed and
/// dropped before the transform step, on success and on failure.
pub fn convert_reader<R: Read>(reader: R, spec: &ModificationSpec) -> ConversionResult<Conversion> {
    log_info("📖 Reading workbook...");
    let workbook = read_workbook(reader).map_err(read_failed)?;
    convert_workbook(workbook, spec)
}

/// Convert a workbook file. The file is closed once read.
pub fn convert_file(path: &Path, spec: &ModificationSpec) -> ConversionResult<Conversion> {
    log_info(format!("📖 Reading workbook: {}", path.display()));
    let workbook = read_workbook_file(path).map_err(read_failed)?;
    convert_workbook(workbook, spec)
}

/// Transform and serialize an already-parsed workbook.
pub fn convert_workbook(mut workbook: Workbook, spec: &ModificationSpec) -> ConversionResult<Conversion> {
    log_success(format!(
        "Workbook read: {} sheet(s), {} record(s)",
        workbook.sheets.len(),
        workbook.record_count()
    ));

    apply_modifications(&mut workbook, spec)?;

    log_info("🧾 Serializing to JSON...");
    let json = serialize_workbook(&workbook).map_err(|e| {
        log_error(format!("Serialization failed: {}", e));
        ConversionError::from(e)
    })?;
    log_success(format!("JSON document ready ({} bytes)", json.len()));

    Ok(Conversion {
        json,
        sheets: summarize(&workbook),
    })
}

/// Apply `spec` to every record of every sheet.
///
/// Stops at the first failing record; the workbook is then partially
/// modified and must not be serialized.
pub fn apply_modifications(workbook: &mut Workbook, spec: &ModificationSpec) -> ConversionResult<()> {
    if spec.is_empty() {
        log_info("⚙️  No modifications configured");
    } else {
        log_info("⚙️  Applying modifications...");
    }

    for sheet in &mut workbook.sheets {
        log_info_indent(format!("Processing sheet: {}", sheet.name), 1);

        let name = &sheet.name;
        for (idx, record) in sheet.records.iter_mut().enumerate() {
            spec.apply(record).map_err(|source| {
                log_error(format!("Sheet '{}', record {}: {}", name, idx + 1, source));
                ConversionError::Transform {
                    sheet: name.clone(),
                    row: idx + 1,
                    source,
                }
            })?;
        }
    }

    log_success("Modifications applied");
    Ok(())
}

/// Serialize a workbook as pretty-printed JSON.
///
/// Output is deterministic: the same workbook always yields the same text.
pub fn serialize_workbook(workbook: &Workbook) -> SerializeResult<String> {
    check_representable(workbook)?;

    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
    workbook.serialize(&mut serializer)?;

    Ok(String::from_utf8(buf)?)
}

/// Locate the first value with no JSON form, so the error can name it.
fn check_representable(workbook: &Workbook) -> SerializeResult<()> {
    for sheet in &workbook.sheets {
        for (idx, record) in sheet.records.iter().enumerate() {
            for (field, value) in record.iter() {
                if let Some(reason) = value.representation_issue() {
                    return Err(SerializeError::Unrepresentable {
                        sheet: sheet.name.clone(),
                        row: idx + 1,
                        field: field.to_string(),
                        reason,
                    });
                }
            }
        }
    }
    Ok(())
}

fn summarize(workbook: &Workbook) -> Vec<SheetSummary> {
    workbook
        .sheets
        .iter()
        .map(|sheet| SheetSummary {
            name: sheet.name.clone(),
            record_count: sheet.records.len(),
            fields: sheet.field_names(),
        })
        .collect()
}

fn read_failed(err: ReadError) -> ConversionError {
    log_error(format!("Could not read workbook: {}", err));
    ConversionError::from(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConversionStep;
    use crate::fixtures;
    use crate::models::{CellValue, Record, Sheet};
    use chrono::NaiveDate;
    use indexmap::IndexMap;
    use serde_json::{json, Value};

    type Document = IndexMap<String, Vec<IndexMap<String, Value>>>;

    fn standard_spec() -> ModificationSpec {
        let created = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_micro_opt(9, 15, 0, 250000)
            .unwrap();
        ModificationSpec::standard(created)
    }

    fn convert_people(spec: &ModificationSpec) -> Conversion {
        let bytes = fixtures::people_workbook().unwrap();
        convert_bytes(&bytes, spec).unwrap()
    }

    #[test]
    fn test_every_sheet_in_order_with_record_counts() {
        let conversion = convert_people(&ModificationSpec::none());
        let doc: Document = serde_json::from_str(&conversion.json).unwrap();

        let names: Vec<&str> = doc.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["Clientes", "Proveedores", "Vacía"]);
        assert_eq!(doc["Clientes"].len(), 2);
        assert_eq!(doc["Proveedores"].len(), 1);
        assert!(doc["Vacía"].is_empty());
    }

    #[test]
    fn test_add_field_same_value_everywhere() {
        let conversion = convert_people(&standard_spec());
        let doc: Document = serde_json::from_str(&conversion.json).unwrap();

        for records in doc.values() {
            for record in records {
                assert_eq!(record["createdAt"], json!("2024-05-01T09:15:00.250000"));
            }
        }
    }

    #[test]
    fn test_combine_fields_with_missing_value() {
        let conversion = convert_people(&standard_spec());
        let doc: Document = serde_json::from_str(&conversion.json).unwrap();

        let clientes = &doc["Clientes"];
        assert_eq!(clientes[0]["NombreCompleto"], json!("Ana Ruiz"));
        // Apellido is blank on the second row
        assert_eq!(clientes[1]["NombreCompleto"], json!("José "));

        // Proveedores has no Apellido column at all
        assert_eq!(doc["Proveedores"][0]["NombreCompleto"], json!("Müller & Söhne "));
    }

    #[test]
    fn test_uniform_fields_per_sheet() {
        let conversion = convert_people(&standard_spec());
        let clientes = &conversion.sheets[0];
        assert_eq!(
            clientes.fields,
            vec!["Nombre", "Apellido", "Edad", "Alta", "createdAt", "NombreCompleto"]
        );

        let doc: Document = serde_json::from_str(&conversion.json).unwrap();
        for record in &doc["Clientes"] {
            let keys: Vec<&String> = record.keys().collect();
            assert_eq!(keys, clientes.fields.iter().collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_native_scalars_and_dates() {
        let conversion = convert_people(&ModificationSpec::none());
        let doc: Document = serde_json::from_str(&conversion.json).unwrap();

        let ana = &doc["Clientes"][0];
        assert_eq!(ana["Edad"], json!(34));
        assert_eq!(ana["Alta"], json!("2024-01-15T00:00:00"));
        assert_eq!(doc["Clientes"][1]["Edad"], json!(28.5));
        assert_eq!(doc["Clientes"][1]["Apellido"], Value::Null);
    }

    #[test]
    fn test_output_format() {
        let conversion = convert_people(&ModificationSpec::none());
        let json = &conversion.json;

        assert!(json.starts_with("{\n    \"Clientes\": [\n        {\n            \"Nombre\": \"Ana\""));
        assert!(json.contains("São Paulo"));
        assert!(json.contains("\"Vacía\": []"));
        assert!(!json.contains("\\u"));
    }

    #[test]
    fn test_serialization_is_idempotent() {
        let bytes = fixtures::people_workbook().unwrap();
        let mut workbook = read_workbook_bytes(&bytes).unwrap();
        apply_modifications(&mut workbook, &standard_spec()).unwrap();

        let first = serialize_workbook(&workbook).unwrap();
        let second = serialize_workbook(&workbook).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_round_trip_matches_in_memory_workbook() {
        let bytes = fixtures::people_workbook().unwrap();
        let mut workbook = read_workbook_bytes(&bytes).unwrap();
        apply_modifications(&mut workbook, &standard_spec()).unwrap();

        let text = serialize_workbook(&workbook).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, serde_json::to_value(&workbook).unwrap());

        let doc: Document = serde_json::from_str(&text).unwrap();
        for sheet in &workbook.sheets {
            let records = &doc[&sheet.name];
            assert_eq!(records.len(), sheet.records.len());
            for (parsed, original) in records.iter().zip(&sheet.records) {
                assert_eq!(parsed.len(), original.len());
            }
        }
    }

    #[test]
    fn test_malformed_input_is_read_error() {
        let result = convert_bytes(b"this is not a spreadsheet", &standard_spec());
        let err = result.unwrap_err();
        assert_eq!(err.step(), ConversionStep::Read);
        assert!(err.to_string().starts_with("Error reading the workbook"));
    }

    struct BrokenReader;

    impl Read for BrokenReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk unplugged"))
        }
    }

    #[test]
    fn test_failing_reader_is_read_error() {
        let err = convert_reader(BrokenReader, &standard_spec()).unwrap_err();
        assert_eq!(err.step(), ConversionStep::Read);
        assert!(matches!(err, ConversionError::Read(ReadError::Io(_))));
        assert!(err.to_string().contains("disk unplugged"));
    }

    #[test]
    fn test_transform_failure_aborts_conversion() {
        let spec = ModificationSpec::none().with_add_field("meta", json!({"nested": true}));
        let bytes = fixtures::people_workbook().unwrap();

        let err = convert_bytes(&bytes, &spec).unwrap_err();
        assert_eq!(err.step(), ConversionStep::Transform);
        match err {
            ConversionError::Transform { sheet, row, .. } => {
                assert_eq!(sheet, "Clientes");
                assert_eq!(row, 1);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_unrepresentable_value_is_serialize_error() {
        let mut record = Record::new();
        record.set("Total", CellValue::Error("#DIV/0!".into()));
        let mut sheet = Sheet::new("Resumen");
        sheet.headers = vec!["Total".into()];
        sheet.records.push(record);

        let err = convert_workbook(Workbook::new(vec![sheet]), &ModificationSpec::none()).unwrap_err();
        assert_eq!(err.step(), ConversionStep::Serialize);
        let msg = err.to_string();
        assert!(msg.contains("Resumen"));
        assert!(msg.contains("Total"));
        assert!(msg.contains("#DIV/0!"));
    }

    #[test]
    fn test_empty_sheet_keeps_its_key() {
        let workbook = Workbook::new(vec![Sheet::new("Hoja1")]);
        let conversion = convert_workbook(workbook, &standard_spec()).unwrap();
        assert_eq!(conversion.json, "{\n    \"Hoja1\": []\n}");
        assert_eq!(conversion.record_count(), 0);
    }

    #[test]
    fn test_convert_file_and_reader() {
        let bytes = fixtures::people_workbook().unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, &bytes).unwrap();

        let from_file = convert_file(file.path(), &standard_spec()).unwrap();
        let from_reader = convert_reader(std::io::Cursor::new(bytes), &standard_spec()).unwrap();
        assert_eq!(from_file.json, from_reader.json);
        assert_eq!(from_file.record_count(), 3);
    }
}
