//! Field modification rules applied to every record of a conversion.
//!
//! A [`ModificationSpec`] holds up to two independent rules:
//!
//! - `add_field` sets one field to a fixed value on every record
//! - `combine_fields` joins two fields with a single space into a new field
//!
//! Rules run in that order, so a combine rule can read a field set by the add rule.
//!
//! ## Configuration shape
//!
//! ```json
//! {
//!   "add_field": { "field_name": "createdAt", "value": "2024-05-01T12:34:56.123456" },
//!   "combine_fields": { "field1": "Nombre", "field2": "Apellido", "new_field": "NombreCompleto" }
//! }
//! ```
//!
//! Both keys are optional.

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{TransformError, TransformResult};
use crate::models::{CellValue, Record};

/// Format of the timestamp injected by [`ModificationSpec::standard`].
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// [`TIMESTAMP_FORMAT`] without the fraction, used on whole seconds.
const WHOLE_SECOND_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Render a timestamp with microseconds, dropping the fraction when it is zero.
pub fn format_timestamp(at: NaiveDateTime) -> String {
    let format = if at.nanosecond() / 1_000 == 0 {
        WHOLE_SECOND_FORMAT
    } else {
        TIMESTAMP_FORMAT
    };
    at.format(format).to_string()
}

/// The set of rules applied to every record of one conversion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModificationSpec {
    /// Set a field to the same value on every record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_field: Option<AddField>,

    /// Concatenate two fields into a new one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combine_fields: Option<CombineFields>,
}

/// `record[field_name] = value`, overwriting any existing value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddField {
    pub field_name: String,
    /// Captured once by the caller; every record receives the same value.
    pub value: Value,
}

/// `record[new_field] = record[field1] + " " + record[field2]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CombineFields {
    pub field1: String,
    pub field2: String,
    pub new_field: String,
}

impl ModificationSpec {
    /// No rules: records pass through untouched.
    pub fn none() -> Self {
        Self::default()
    }

    /// The application's default request: stamp every record with
    /// `createdAt` and build `NombreCompleto` from `Nombre` and `Apellido`.
    pub fn standard(created_at: NaiveDateTime) -> Self {
        Self::none()
            .with_add_field(
                "createdAt",
                Value::String(format_timestamp(created_at)),
            )
            .with_combine_fields("Nombre", "Apellido", "NombreCompleto")
    }

    /// [`standard`](Self::standard) with the current local time.
    pub fn standard_now() -> Self {
        Self::standard(chrono::Local::now().naive_local())
    }

    pub fn with_add_field(mut self, field_name: impl Into<String>, value: Value) -> Self {
        self.add_field = Some(AddField {
            field_name: field_name.into(),
            value,
        });
        self
    }

    pub fn with_combine_fields(
        mut self,
        field1: impl Into<String>,
        field2: impl Into<String>,
        new_field: impl Into<String>,
    ) -> Self {
        self.combine_fields = Some(CombineFields {
            field1: field1.into(),
            field2: field2.into(),
            new_field: new_field.into(),
        });
        self
    }

    /// Parse a spec from JSON text
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// True when no rule is configured.
    pub fn is_empty(&self) -> bool {
        self.add_field.is_none() && self.combine_fields.is_none()
    }

    /// Apply every configured rule to one record, in place.
    ///
    /// Absent rules are skipped. Absent source fields read as `""`.
    pub fn apply(&self, record: &mut Record) -> TransformResult<()> {
        if let Some(add) = &self.add_field {
            add.apply(record)?;
        }
        if let Some(combine) = &self.combine_fields {
            combine.apply(record)?;
        }
        Ok(())
    }
}

impl AddField {
    pub fn apply(&self, record: &mut Record) -> TransformResult<()> {
        if self.field_name.is_empty() {
            return Err(TransformError::EmptyFieldName {
                rule: "add_field",
                parameter: "field_name",
            });
        }

        let value = CellValue::from_json(&self.value).map_err(|kind| {
            TransformError::UnsupportedValue {
                field: self.field_name.clone(),
                kind,
            }
        })?;

        record.set(self.field_name.clone(), value);
        Ok(())
    }
}

impl CombineFields {
    pub fn apply(&self, record: &mut Record) -> TransformResult<()> {
        if self.new_field.is_empty() {
            return Err(TransformError::EmptyFieldName {
                rule: "combine_fields",
                parameter: "new_field",
            });
        }

        let combined = format!(
            "{} {}",
            record.get_or_empty(&self.field1),
            record.get_or_empty(&self.field2)
        );
        record.set(self.new_field.clone(), CellValue::Text(combined));
        Ok(())
    }
}

/// Human-readable description of the available rules, printed by the CLI.
pub fn rules_description() -> &'static str {
    r#"Modification rules (all optional, applied in this order):

  add_field { field_name, value }
      Sets record[field_name] = value on every record of every sheet.
      Overwrites an existing field. value must be a JSON scalar
      (string, number, boolean or null).

  combine_fields { field1, field2, new_field }
      Sets record[new_field] = "<field1> <field2>" (single space).
      A missing source field reads as an empty string.
      Overwrites new_field if it already exists."#
}

/// Example configuration, printed by the CLI.
pub fn example_modifications() -> ModificationSpec {
    ModificationSpec::none()
        .with_add_field("createdAt", Value::String("2024-05-01T12:34:56.123456".into()))
        .with_combine_fields("Nombre", "Apellido", "NombreCompleto")
}
