//! Translation entity - one UI string key with its per-language texts
//!
//! Keys are dot-separated (`auth.login.title`); the first segment is the
//! namespace. Per-language bundles travel as nested JSON objects and are
//! flattened to dot keys on import and nested again on export.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::cmp::Ordering;
use tracing::warn;

use crate::core::entity::{Exportable, Record, ValidationError};
use crate::core::source::{DataSource, ImportStats, SourceError};
use crate::core::value::{lenient_text, or_default};
use crate::pipeline::filter::selection_matches;
use crate::pipeline::sort::{compare_values, Direction, SortValue};
use crate::pipeline::{Searchable, ViewFilters};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationEntry {
    #[serde(default, deserialize_with = "lenient_text")]
    pub language_id: String,

    #[serde(default, deserialize_with = "lenient_text")]
    pub translation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: String,

    #[serde(default, deserialize_with = "lenient_text")]
    pub key: String,

    #[serde(default, deserialize_with = "or_default")]
    pub translations: Vec<TranslationEntry>,
}

impl Translation {
    /// First dot-separated segment of the key, if the key has one
    pub fn namespace(&self) -> Option<&str> {
        self.key.split_once('.').map(|(ns, _)| ns)
    }

    pub fn current_translation(&self, language_id: &str) -> Option<&str> {
        self.translations
            .iter()
            .find(|t| t.language_id == language_id)
            .map(|t| t.translation.as_str())
            .filter(|t| !t.trim().is_empty())
    }

    pub fn has_translation(&self, language_id: &str) -> bool {
        self.current_translation(language_id).is_some()
    }

    /// Whether any language has a non-blank text
    pub fn has_any_translation(&self) -> bool {
        self.translations
            .iter()
            .any(|t| !t.translation.trim().is_empty())
    }

    /// Set the text for `language_id`, replacing an existing entry in place
    pub fn upsert_translation(&mut self, language_id: &str, text: impl Into<String>) {
        let text = text.into();
        match self
            .translations
            .iter_mut()
            .find(|t| t.language_id == language_id)
        {
            Some(entry) => entry.translation = text,
            None => self.translations.push(TranslationEntry {
                language_id: language_id.to_string(),
                translation: text,
            }),
        }
    }
}

impl Record for Translation {
    const COLLECTION: &'static str = "translations";
    const LABEL: &'static str = "translation";

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.key.trim().is_empty() {
            return Err(ValidationError::EmptyField("key"));
        }
        for (i, entry) in self.translations.iter().enumerate() {
            if self.translations[..i]
                .iter()
                .any(|t| t.language_id == entry.language_id)
            {
                return Err(ValidationError::DuplicateTranslation {
                    key: self.key.clone(),
                    language_id: entry.language_id.clone(),
                });
            }
        }
        Ok(())
    }
}

impl Searchable for Translation {
    fn search_fields(&self) -> Vec<&str> {
        std::iter::once(self.key.as_str())
            .chain(self.translations.iter().map(|t| t.translation.as_str()))
            .collect()
    }
}

impl Exportable for Translation {
    fn csv_header() -> &'static [&'static str] {
        &["id", "key", "language_id", "translation"]
    }

    /// Entries are joined as `lang=text` pairs separated by `; `
    fn csv_record(&self) -> Vec<String> {
        let languages: Vec<&str> = self
            .translations
            .iter()
            .map(|t| t.language_id.as_str())
            .collect();
        let texts: Vec<&str> = self
            .translations
            .iter()
            .map(|t| t.translation.as_str())
            .collect();
        vec![
            self.id.clone(),
            self.key.clone(),
            languages.join("; "),
            texts.join("; "),
        ]
    }
}

/// Translation coverage selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Coverage {
    #[default]
    All,
    Translated,
    Missing,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationFilters {
    /// Language the coverage filter applies to; without one, coverage
    /// looks at whether any language is translated
    pub language_id: Option<String>,
    pub coverage: Coverage,
    pub namespace: Option<String>,
    /// Key order
    pub direction: Direction,
}

impl ViewFilters<Translation> for TranslationFilters {
    fn matches(&self, t: &Translation, _today: NaiveDate) -> bool {
        let translated = match &self.language_id {
            Some(lang) => t.has_translation(lang),
            None => t.has_any_translation(),
        };
        let coverage_ok = match self.coverage {
            Coverage::All => true,
            Coverage::Translated => translated,
            Coverage::Missing => !translated,
        };
        coverage_ok && selection_matches(self.namespace.as_deref(), t.namespace())
    }

    fn compare(&self, a: &Translation, b: &Translation) -> Ordering {
        compare_values(
            &SortValue::Text(a.key.clone()),
            &SortValue::Text(b.key.clone()),
            self.direction,
        )
    }
}

/// Translated/total counts for one language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverageStats {
    pub translated: usize,
    pub total: usize,
}

impl CoverageStats {
    pub fn missing(&self) -> usize {
        self.total - self.translated
    }

    /// Whole percent; an empty catalogue counts as fully covered
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 100;
        }
        ((self.translated as f64 / self.total as f64) * 100.0).round() as u32
    }
}

pub fn coverage(records: &[Translation], language_id: &str) -> CoverageStats {
    CoverageStats {
        translated: records
            .iter()
            .filter(|t| t.has_translation(language_id))
            .count(),
        total: records.len(),
    }
}

/// Flatten a nested bundle into `(dot.key, text)` pairs.
///
/// Numbers and booleans are stringified; nulls and arrays are skipped.
pub fn flatten_bundle(bundle: &Value) -> Result<Vec<(String, String)>, SourceError> {
    let Value::Object(map) = bundle else {
        return Err(SourceError::InvalidPayload(
            "a translation bundle must be a JSON object".to_string(),
        ));
    };
    let mut out = Vec::new();
    flatten_into(map, "", &mut out);
    Ok(out)
}

fn flatten_into(map: &Map<String, Value>, prefix: &str, out: &mut Vec<(String, String)>) {
    for (segment, value) in map {
        let key = if prefix.is_empty() {
            segment.clone()
        } else {
            format!("{}.{}", prefix, segment)
        };
        match value {
            Value::Object(inner) => flatten_into(inner, &key, out),
            Value::String(s) => out.push((key, s.clone())),
            Value::Number(n) => out.push((key, n.to_string())),
            Value::Bool(b) => out.push((key, b.to_string())),
            Value::Null => {}
            Value::Array(_) => warn!(key = %key, "skipping array value in translation bundle"),
        }
    }
}

/// Nest `(dot.key, text)` pairs into a bundle object.
///
/// A key that collides with an existing leaf or branch is skipped.
pub fn nest_bundle<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Value {
    let mut root = Map::new();
    for (key, text) in pairs {
        if !insert_path(&mut root, key, text) {
            warn!(key = %key, "skipping key that collides with another key");
        }
    }
    Value::Object(root)
}

fn insert_path(root: &mut Map<String, Value>, key: &str, text: &str) -> bool {
    let mut segments: Vec<&str> = key.split('.').collect();
    let Some(leaf) = segments.pop() else {
        return false;
    };

    let mut node = root;
    for segment in segments {
        let entry = node
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        match entry {
            Value::Object(inner) => node = inner,
            _ => return false,
        }
    }
    if node.contains_key(leaf) {
        return false;
    }
    node.insert(leaf.to_string(), Value::String(text.to_string()));
    true
}

/// Bundle of every translated key for `language_id`, in key order
pub fn export_language(records: &[Translation], language_id: &str) -> Value {
    let mut pairs: Vec<(&str, &str)> = records
        .iter()
        .filter_map(|t| {
            t.current_translation(language_id)
                .map(|text| (t.key.as_str(), text))
        })
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    nest_bundle(pairs)
}

/// Merge a nested bundle for `language_id` into `source`.
///
/// Unknown keys create new translations; identical texts count as skipped.
pub fn import_language<S>(
    source: &mut S,
    language_id: &str,
    bundle: &Value,
) -> Result<ImportStats, SourceError>
where
    S: DataSource<Translation>,
{
    let pairs = flatten_bundle(bundle)?;
    let existing = source.search("")?;
    let mut stats = ImportStats::default();

    for (key, text) in pairs {
        match existing.iter().find(|t| t.key == key) {
            Some(record) => {
                if record.current_translation(language_id) == Some(text.as_str()) {
                    stats.skipped += 1;
                    continue;
                }
                let mut updated = record.clone();
                updated.upsert_translation(language_id, text);
                source.update(
                    &record.id,
                    json!({ "translations": updated.translations }),
                )?;
                stats.updated += 1;
            }
            None => {
                source.create(json!({
                    "key": key,
                    "translations": [{ "language_id": language_id, "translation": text }],
                }))?;
                stats.created += 1;
            }
        }
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::source::JsonStore;
    use crate::pipeline::process;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
    }

    fn records() -> Vec<Translation> {
        serde_json::from_value(json!([
            {"id": "t1", "key": "auth.login", "translations": [
                {"language_id": 1, "translation": "Log in"},
                {"language_id": "2", "translation": "Connexion"}
            ]},
            {"id": "t2", "key": "auth.logout", "translations": [
                {"language_id": "1", "translation": "Log out"},
                {"language_id": "2", "translation": "  "}
            ]},
            {"id": "t3", "key": "home.title", "translations": []},
            {"id": "t4", "key": "footer", "translations": [
                {"language_id": "2", "translation": "Pied de page"}
            ]}
        ]))
        .unwrap()
    }

    #[test]
    fn test_projections() {
        let items = records();
        assert_eq!(items[0].namespace(), Some("auth"));
        assert_eq!(items[3].namespace(), None);
        assert_eq!(items[0].current_translation("1"), Some("Log in"));
        assert!(!items[1].has_translation("2"));
        assert!(!items[2].has_any_translation());
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut t = records().remove(0);
        t.upsert_translation("2", "Se connecter");
        t.upsert_translation("3", "Anmelden");
        assert_eq!(t.translations.len(), 3);
        assert_eq!(t.translations[1].translation, "Se connecter");
        assert!(t.validate().is_ok());
    }

    #[test]
    fn test_duplicate_language_rejected() {
        let mut t = records().remove(0);
        t.translations.push(TranslationEntry {
            language_id: "1".to_string(),
            translation: "Sign in".to_string(),
        });
        assert!(matches!(
            t.validate(),
            Err(ValidationError::DuplicateTranslation { .. })
        ));
    }

    #[test]
    fn test_coverage_filter() {
        let items = records();
        let missing_fr = TranslationFilters {
            language_id: Some("2".to_string()),
            coverage: Coverage::Missing,
            ..Default::default()
        };
        let keys: Vec<String> = process(&items, &missing_fr, "", today())
            .into_iter()
            .map(|t| t.key)
            .collect();
        assert_eq!(keys, vec!["auth.logout", "home.title"]);

        let auth_desc = TranslationFilters {
            namespace: Some("auth".to_string()),
            direction: Direction::Desc,
            ..Default::default()
        };
        let keys: Vec<String> = process(&items, &auth_desc, "", today())
            .into_iter()
            .map(|t| t.key)
            .collect();
        assert_eq!(keys, vec!["auth.logout", "auth.login"]);
    }

    #[test]
    fn test_search_matches_texts() {
        let hits = process(&records(), &TranslationFilters::default(), "connexion", today());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "t1");
    }

    #[test]
    fn test_coverage_stats() {
        let stats = coverage(&records(), "1");
        assert_eq!(stats, CoverageStats { translated: 2, total: 4 });
        assert_eq!(stats.percent(), 50);
        assert_eq!(stats.missing(), 2);
        assert_eq!(coverage(&[], "1").percent(), 100);
    }

    #[test]
    fn test_flatten_and_nest() {
        let bundle = json!({
            "auth": {"login": "Log in", "errors": {"invalid": "Wrong password"}},
            "count": 3,
            "ignored": null
        });
        let mut pairs = flatten_bundle(&bundle).unwrap();
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("auth.errors.invalid".to_string(), "Wrong password".to_string()),
                ("auth.login".to_string(), "Log in".to_string()),
                ("count".to_string(), "3".to_string()),
            ]
        );

        let nested = nest_bundle(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        assert_eq!(nested["auth"]["errors"]["invalid"], "Wrong password");
        assert_eq!(nested["count"], "3");

        assert!(flatten_bundle(&json!(["a"])).is_err());
    }

    #[test]
    fn test_nest_skips_collisions() {
        let nested = nest_bundle(vec![("auth", "Auth"), ("auth.login", "Log in")]);
        assert_eq!(nested, json!({"auth": "Auth"}));
    }

    #[test]
    fn test_export_language() {
        let bundle = export_language(&records(), "2");
        assert_eq!(
            bundle,
            json!({"auth": {"login": "Connexion"}, "footer": "Pied de page"})
        );
    }

    #[test]
    fn test_import_language() {
        let mut store = JsonStore::in_memory(records());
        let bundle = json!({
            "auth": {"login": "Connexion", "logout": "Déconnexion"},
            "home": {"subtitle": "Bienvenue"}
        });
        let stats = import_language(&mut store, "2", &bundle).unwrap();
        assert_eq!(
            stats,
            ImportStats {
                created: 1,
                updated: 1,
                skipped: 1
            }
        );
        let logout = store.get_by_id("t2").unwrap();
        assert_eq!(logout.current_translation("2"), Some("Déconnexion"));
        assert_eq!(logout.translations.len(), 2);
        assert!(store
            .records()
            .iter()
            .any(|t| t.key == "home.subtitle" && t.has_translation("2")));
    }
}
