//! JSON import parsing with source-located diagnostics

pub mod diagnostics;

pub use diagnostics::{parse_document, JsonError, JsonSyntaxError};
