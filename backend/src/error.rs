//! Error types for the Sheetjson conversion pipeline.
//!
//! Each pipeline step owns one error type:
//!
//! - [`ReadError`] - the workbook could not be opened or a sheet could not be loaded
//! - [`TransformError`] - a modification rule could not be applied to a record
//! - [`SerializeError`] - a value has no representation in the JSON output
//! - [`ConversionError`] - top-level conversion failure, naming the failed step
//! - [`RemoteServiceError`] - recommendation service failure (never part of a conversion)
//! - [`ServerError`] - HTTP layer errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Read Errors
// =============================================================================

/// Errors while opening a workbook and extracting its sheets.
#[derive(Debug, Error)]
pub enum ReadError {
    /// Failed to read the source stream or file.
    #[error("Failed to read workbook source: {0}")]
    Io(#[from] std::io::Error),

    /// The bytes are not a workbook calamine understands.
    #[error("Not a valid workbook: {0}")]
    InvalidWorkbook(String),

    /// A sheet listed by the workbook could not be loaded.
    #[error("Cannot load sheet '{sheet}': {message}")]
    Sheet { sheet: String, message: String },
}

impl From<calamine::Error> for ReadError {
    fn from(err: calamine::Error) -> Self {
        ReadError::InvalidWorkbook(err.to_string())
    }
}

// =============================================================================
// Transformation Errors
// =============================================================================

/// Errors while applying modification rules to a record.
#[derive(Debug, Error)]
pub enum TransformError {
    /// A rule names an empty field.
    #[error("Rule '{rule}' has an empty '{parameter}'")]
    EmptyFieldName {
        rule: &'static str,
        parameter: &'static str,
    },

    /// The value injected by a rule is not a scalar.
    #[error("Value for field '{field}' must be a scalar, got {kind}")]
    UnsupportedValue { field: String, kind: &'static str },
}

// =============================================================================
// Serialization Errors
// =============================================================================

/// Errors while producing the JSON document.
#[derive(Debug, Error)]
pub enum SerializeError {
    /// A cell value has no JSON representation.
    #[error("Sheet '{sheet}', row {row}, field '{field}': {reason}")]
    Unrepresentable {
        sheet: String,
        row: usize,
        field: String,
        reason: String,
    },

    /// serde_json rejected the document.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The serializer produced bytes that are not UTF-8.
    #[error("Output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

// =============================================================================
// Conversion Errors (top-level)
// =============================================================================

/// Pipeline step a conversion failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionStep {
    Read,
    Transform,
    Serialize,
}

impl ConversionStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionStep::Read => "read",
            ConversionStep::Transform => "transform",
            ConversionStep::Serialize => "serialize",
        }
    }
}

impl std::fmt::Display for ConversionStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level conversion error.
///
/// This is the error returned by [`crate::transform::pipeline::convert_bytes`]
/// and friends. Its `Display` output is the diagnostic shown to users.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The workbook could not be read.
    #[error("Error reading the workbook: {0}")]
    Read(#[from] ReadError),

    /// A modification failed on one record; the whole conversion is aborted.
    #[error("Error processing sheet '{sheet}' (row {row}): {source}")]
    Transform {
        sheet: String,
        row: usize,
        #[source]
        source: TransformError,
    },

    /// The document could not be serialized.
    #[error("Error converting the data to JSON: {0}")]
    Serialize(#[from] SerializeError),
}

impl ConversionError {
    /// Which step of the pipeline failed.
    pub fn step(&self) -> ConversionStep {
        match self {
            ConversionError::Read(_) => ConversionStep::Read,
            ConversionError::Transform { .. } => ConversionStep::Transform,
            ConversionError::Serialize(_) => ConversionStep::Serialize,
        }
    }
}

// =============================================================================
// Remote Service Errors
// =============================================================================

/// Errors from the recommendation service client.
#[derive(Debug, Error)]
pub enum RemoteServiceError {
    /// Missing API key.
    #[error("Missing OPENAI_API_KEY: the recommendation service is not configured")]
    MissingApiKey,

    /// Nothing to send.
    #[error("Prompt is empty")]
    EmptyPrompt,

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    /// The service answered with an error.
    #[error("API error: {0}")]
    ApiError(String),

    /// Response body could not be understood.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Conversion error.
    #[error("{0}")]
    Conversion(#[from] ConversionError),

    /// Recommendation service error.
    #[error("{0}")]
    Remote(#[from] RemoteServiceError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for workbook reading.
pub type ReadResult<T> = Result<T, ReadError>;

/// Result type for modification rules.
pub type TransformResult<T> = Result<T, TransformError>;

/// Result type for serialization.
pub type SerializeResult<T> = Result<T, SerializeError>;

/// Result type for complete conversions.
pub type ConversionResult<T> = Result<T, ConversionError>;

/// Result type for recommendation calls.
pub type RemoteResult<T> = Result<T, RemoteServiceError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
