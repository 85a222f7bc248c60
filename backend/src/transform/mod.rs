//! Transformation module.
//!
//! - Modifications: field rules applied to each record
//! - Pipeline: read, modify and serialize a whole workbook

pub mod modifications;
pub mod pipeline;

pub use modifications::*;
pub use pipeline::*;
