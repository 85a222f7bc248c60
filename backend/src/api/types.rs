//! REST API types.
//!
//! The converted document is embedded verbatim, so sheet and field order
//! in the response match the downloadable file.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::transform::pipeline::{Conversion, SheetSummary, DEFAULT_OUTPUT_FILE_NAME};

/// Response sent after a workbook upload is converted.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertResponse {
    /// Unique job identifier
    pub job_id: String,

    /// Always "ready"; failures use [`error_response`]
    pub status: String,

    /// Name of the uploaded file, if the client sent one
    pub source_file: Option<String>,

    /// Suggested name for the downloaded document
    pub file_name: String,

    pub total_records: usize,

    pub sheets: Vec<SheetSummary>,

    /// The converted document, `{ sheet: [records] }`
    pub document: Box<RawValue>,
}

impl ConvertResponse {
    pub fn new(conversion: Conversion, source_file: Option<String>) -> Result<Self, serde_json::Error> {
        let total_records = conversion.record_count();
        Ok(Self {
            job_id: Uuid::new_v4().to_string(),
            status: "ready".to_string(),
            source_file,
            file_name: DEFAULT_OUTPUT_FILE_NAME.to_string(),
            total_records,
            sheets: conversion.sheets,
            document: RawValue::from_string(conversion.json)?,
        })
    }
}

/// Body of `POST /api/recommend`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendRequest {
    pub prompt: String,
}

/// Reply from the recommendation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub text: String,
}

/// Create an error response. `step` names the failed conversion step, if any.
pub fn error_response(error: &str, step: Option<&str>) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "step": step,
        "error": error,
    })
}
