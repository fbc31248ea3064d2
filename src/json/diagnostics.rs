//! JSON error diagnostics pointing at the offending byte of an import file

use miette::{Diagnostic, NamedSource, SourceSpan};
use serde_json::error::Category;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

/// JSON syntax error with source location
#[derive(Debug, Error, Diagnostic)]
#[error("JSON syntax error: {message}")]
#[diagnostic(code(cfadmin::json::syntax))]
pub struct JsonSyntaxError {
    #[source_code]
    src: NamedSource<String>,

    #[label("error here")]
    span: SourceSpan,

    #[help]
    help: Option<String>,

    message: String,
}

impl JsonSyntaxError {
    /// Create a syntax error from a serde_json error
    pub fn from_serde_error(err: &serde_json::Error, source: &str, filename: &str) -> Self {
        let offset = line_col_to_offset(source, err.line().max(1), err.column().max(1));
        let message = err.to_string();
        let help = generate_help(err.classify(), &message);

        Self {
            src: NamedSource::new(filename, source.to_string()),
            span: SourceSpan::from(offset..offset.saturating_add(1)),
            help,
            message,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Byte offset the label points at
    pub fn offset(&self) -> usize {
        self.span.offset()
    }
}

/// Errors from reading an import file
#[derive(Debug, Error, Diagnostic)]
pub enum JsonError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] JsonSyntaxError),

    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Read and parse a JSON file, mapping syntax errors to a located diagnostic
pub fn parse_document(path: &Path) -> Result<(String, Value), JsonError> {
    let source = std::fs::read_to_string(path).map_err(|e| JsonError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let value = serde_json::from_str(&source)
        .map_err(|e| JsonSyntaxError::from_serde_error(&e, &source, &filename))?;
    Ok((source, value))
}

/// Convert a 1-based line/column to a byte offset, clamped to the source
fn line_col_to_offset(source: &str, line: usize, column: usize) -> usize {
    let mut line_start = 0;
    for (n, text) in source.split_inclusive('\n').enumerate() {
        if n + 1 == line {
            let col_offset = text
                .char_indices()
                .nth(column.saturating_sub(1))
                .map(|(i, _)| i)
                .unwrap_or(text.len());
            return (line_start + col_offset).min(source.len().saturating_sub(1));
        }
        line_start += text.len();
    }
    source.len().saturating_sub(1)
}

/// Generate helpful suggestions based on the error
fn generate_help(category: Category, message: &str) -> Option<String> {
    if category == Category::Eof {
        return Some("The file ends early. Check for a missing closing '}' or ']'.".to_string());
    }

    let msg_lower = message.to_lowercase();

    if msg_lower.contains("trailing comma") {
        return Some("Remove the comma after the last item in the object or array.".to_string());
    }

    if msg_lower.contains("expected `,` or `}`") || msg_lower.contains("expected `,` or `]`") {
        return Some("Add a comma between items: {\"a\": 1, \"b\": 2}".to_string());
    }

    if msg_lower.contains("key must be a string") {
        return Some("Object keys need double quotes: {\"key\": \"value\"}".to_string());
    }

    if msg_lower.contains("expected value") {
        return Some("Strings need double quotes; single quotes are not valid JSON.".to_string());
    }

    None
}
