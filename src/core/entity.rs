//! Record traits - common interface for every backend collection

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Validation failures raised before a record is stored
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid language code '{0}' (expected e.g. 'en' or 'pt-BR')")]
    InvalidLanguageCode(String),

    #[error("Translation '{key}' has more than one entry for language {language_id}")]
    DuplicateTranslation { key: String, language_id: String },

    #[error("Field '{0}' must not be empty")]
    EmptyField(&'static str),
}

/// A record stored in one backend collection
pub trait Record: Serialize + DeserializeOwned + Clone {
    /// Collection name, also the mirror file stem (e.g. "campaigns")
    const COLLECTION: &'static str;

    /// Singular label for messages (e.g. "campaign")
    const LABEL: &'static str;

    fn id(&self) -> &str;

    /// Reject records that break an invariant
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Enforce cross-record invariants after `changed` was written.
    ///
    /// Called with the whole collection; the default does nothing.
    fn normalize(_all: &mut [Self], _changed: &str) {}

    /// Repair cross-record invariants in a collection as it was loaded
    fn normalize_loaded(_all: &mut [Self]) {}
}

/// Flat tabular form used for CSV export
pub trait Exportable {
    fn csv_header() -> &'static [&'static str];

    fn csv_record(&self) -> Vec<String>;
}
