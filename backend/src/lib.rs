//! # Sheetjson - spreadsheet workbooks to structured JSON
//!
//! Sheetjson reads every sheet of a workbook, turns each data row into a
//! record keyed by the sheet's header row, applies a small set of field
//! modifications, and writes the whole workbook as one JSON document.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Workbook   │────▶│   Parser    │────▶│Modifications│────▶│    JSON     │
//! │ (xlsx/ods)  │     │ (calamine)  │     │ (add/combine│     │ {sheet: []} │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! A separate recommendation client forwards free-text prompts to a chat
//! model; it shares nothing with the conversion pipeline.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sheetjson::{convert_file, ModificationSpec};
//! use std::path::Path;
//!
//! fn main() {
//!     let spec = ModificationSpec::standard_now();
//!     let result = convert_file(Path::new("clientes.xlsx"), &spec).unwrap();
//!     println!("Converted {} records", result.record_count());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per pipeline step
//! - [`models`] - Domain models (Workbook, Sheet, Record, CellValue)
//! - [`parser`] - Workbook reading
//! - [`transform`] - Modification rules and the conversion pipeline
//! - [`config`] - Process configuration
//! - [`ai`] - Recommendation service client
//! - [`api`] - HTTP API server and progress logs

// Core modules
pub mod error;
pub mod models;
pub mod config;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Recommendations
pub mod ai;

// HTTP API
pub mod api;

#[cfg(test)]
pub(crate) mod fixtures;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConversionError,
    ConversionStep,
    ReadError,
    RemoteServiceError,
    SerializeError,
    ServerError,
    TransformError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{CellValue, Record, Sheet, Workbook};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{read_workbook, read_workbook_bytes, read_workbook_file};

// =============================================================================
// Re-exports - Modifications
// =============================================================================

pub use transform::modifications::{
    example_modifications,
    rules_description,
    AddField,
    CombineFields,
    ModificationSpec,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    apply_modifications,
    convert_bytes,
    convert_file,
    convert_reader,
    convert_workbook,
    serialize_workbook,
    Conversion,
    SheetSummary,
    DEFAULT_OUTPUT_FILE_NAME,
};

// =============================================================================
// Re-exports - Recommendations
// =============================================================================

pub use ai::RecommendationClient;
pub use config::Config;

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, ConvertResponse, RecommendRequest, RecommendResponse};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server};
}
