//! Language entity - locales the platform is translated into

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::warn;

use crate::core::entity::{Exportable, Record, ValidationError};
use crate::core::value::{lenient_bool, lenient_string, lenient_text};
use crate::pipeline::sort::{compare_values, ColumnSort, SortValue};
use crate::pipeline::{Searchable, ViewFilters};

/// A supported language
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Language {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: String,

    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,

    /// ISO 639-1 code with optional region, e.g. `en` or `pt-BR`
    #[serde(default, deserialize_with = "lenient_text")]
    pub code: String,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_active: bool,

    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_default: bool,

    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_rtl: bool,
}

/// Whether `code` looks like `xx` or `xx-YY`
pub fn is_valid_language_code(code: &str) -> bool {
    let bytes = code.as_bytes();
    let lang_ok = |b: &[u8]| b.len() == 2 && b.iter().all(u8::is_ascii_lowercase);
    match bytes.len() {
        2 => lang_ok(bytes),
        5 => {
            lang_ok(&bytes[..2])
                && bytes[2] == b'-'
                && bytes[3..].iter().all(u8::is_ascii_uppercase)
        }
        _ => false,
    }
}

impl Record for Language {
    const COLLECTION: &'static str = "languages";
    const LABEL: &'static str = "language";

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyField("name"));
        }
        if !is_valid_language_code(&self.code) {
            return Err(ValidationError::InvalidLanguageCode(self.code.clone()));
        }
        Ok(())
    }

    /// Only one language may be the default
    fn normalize(all: &mut [Self], changed: &str) {
        let changed_is_default = all.iter().any(|l| l.id == changed && l.is_default);
        if changed_is_default {
            for language in all.iter_mut().filter(|l| l.id != changed) {
                language.is_default = false;
            }
        }
    }

    /// A loaded collection keeps its first default; later ones are cleared
    fn normalize_loaded(all: &mut [Self]) {
        let Some(first) = all.iter().position(|l| l.is_default) else {
            return;
        };
        for language in all.iter_mut().skip(first + 1).filter(|l| l.is_default) {
            warn!(id = %language.id, code = %language.code, "clearing extra default language");
            language.is_default = false;
        }
    }
}

impl Searchable for Language {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.code.as_str(),
            self.country.as_deref().unwrap_or(""),
        ]
    }
}

impl Exportable for Language {
    fn csv_header() -> &'static [&'static str] {
        &["id", "name", "code", "country", "is_active", "is_default", "is_rtl"]
    }

    fn csv_record(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.code.clone(),
            self.country.clone().unwrap_or_default(),
            self.is_active.to_string(),
            self.is_default.to_string(),
            self.is_rtl.to_string(),
        ]
    }
}

/// Sortable columns of the language table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LanguageColumn {
    #[default]
    Name,
    Code,
    Country,
    Active,
}

impl LanguageColumn {
    fn value(self, l: &Language) -> SortValue {
        match self {
            LanguageColumn::Name => SortValue::Text(l.name.clone()),
            LanguageColumn::Code => SortValue::Text(l.code.clone()),
            LanguageColumn::Country => SortValue::Text(l.country.clone().unwrap_or_default()),
            LanguageColumn::Active => SortValue::Number(if l.is_active { 1.0 } else { 0.0 }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LanguageFilters {
    pub active_only: bool,
    pub sort: ColumnSort<LanguageColumn>,
}

impl ViewFilters<Language> for LanguageFilters {
    fn matches(&self, l: &Language, _today: NaiveDate) -> bool {
        !self.active_only || l.is_active
    }

    fn compare(&self, a: &Language, b: &Language) -> Ordering {
        let column = self.sort.column;
        compare_values(&column.value(a), &column.value(b), self.sort.direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::source::{DataSource, JsonStore, SourceError};
    use crate::pipeline::process;
    use crate::pipeline::sort::Direction;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
    }

    fn store() -> JsonStore<Language> {
        let mut store = JsonStore::in_memory(Vec::new());
        for (id, name, code, default) in [
            ("l1", "English", "en", true),
            ("l2", "français", "fr", false),
            ("l3", "Arabic", "ar", false),
        ] {
            store
                .create(json!({"id": id, "name": name, "code": code, "is_active": true, "is_default": default}))
                .unwrap();
        }
        store
    }

    #[test]
    fn test_code_pattern() {
        assert!(is_valid_language_code("en"));
        assert!(is_valid_language_code("pt-BR"));
        assert!(!is_valid_language_code("EN"));
        assert!(!is_valid_language_code("pt-br"));
        assert!(!is_valid_language_code("eng"));
        assert!(!is_valid_language_code("pt_BR"));
        assert!(!is_valid_language_code(""));
    }

    #[test]
    fn test_single_default_enforced() {
        let mut store = store();
        store.update("l2", json!({"is_default": true})).unwrap();
        let defaults: Vec<&str> = store
            .records()
            .iter()
            .filter(|l| l.is_default)
            .map(|l| l.id.as_str())
            .collect();
        assert_eq!(defaults, vec!["l2"]);
    }

    #[test]
    fn test_invalid_code_rejected() {
        let mut store = store();
        let err = store
            .create(json!({"name": "German", "code": "DE"}))
            .unwrap_err();
        assert!(matches!(
            err,
            SourceError::Validation(ValidationError::InvalidLanguageCode(_))
        ));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_column_click_sorting() {
        let items = store().records().to_vec();
        let mut filters = LanguageFilters::default();
        let names = |f: &LanguageFilters| -> Vec<String> {
            process(&items, f, "", today())
                .into_iter()
                .map(|l| l.name)
                .collect()
        };
        assert_eq!(names(&filters), vec!["Arabic", "English", "français"]);

        filters.sort.click(LanguageColumn::Name);
        assert_eq!(filters.sort.direction, Direction::Desc);
        assert_eq!(names(&filters), vec!["français", "English", "Arabic"]);

        filters.sort.click(LanguageColumn::Code);
        assert_eq!(filters.sort.direction, Direction::Asc);
        assert_eq!(names(&filters), vec!["Arabic", "English", "français"]);
    }

    #[test]
    fn test_active_only() {
        let mut items = store().records().to_vec();
        items[1].is_active = false;
        let filters = LanguageFilters {
            active_only: true,
            ..Default::default()
        };
        assert_eq!(process(&items, &filters, "", today()).len(), 2);
    }

    #[test]
    fn test_open_keeps_only_first_default() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("languages.json");
        std::fs::write(
            &path,
            r#"[
                {"id": "a", "name": "English", "code": "en", "is_active": true, "is_default": true},
                {"id": "b", "name": "French", "code": "fr", "is_active": true, "is_default": true},
                {"id": "c", "name": "Hausa", "code": "ha", "is_active": true, "is_default": "true"}
            ]"#,
        )
        .unwrap();

        let store: JsonStore<Language> = JsonStore::open(&path).unwrap();
        let defaults: Vec<&str> = store
            .records()
            .iter()
            .filter(|l| l.is_default)
            .map(|l| l.id.as_str())
            .collect();
        assert_eq!(defaults, vec!["a"]);
    }

    #[test]
    fn test_in_memory_keeps_only_first_default() {
        let languages: Vec<Language> = serde_json::from_value(json!([
            {"id": "a", "name": "English", "code": "en"},
            {"id": "b", "name": "French", "code": "fr", "is_default": true},
            {"id": "c", "name": null, "code": "de", "is_default": true}
        ]))
        .unwrap();
        let store = JsonStore::in_memory(languages);
        assert!(store.records()[1].is_default);
        assert!(!store.records()[2].is_default);
        assert_eq!(store.records()[2].name, "");
    }
}
