//! Data source contract and the JSON mirror implementation
//!
//! The backend is an external collaborator; everything the console needs
//! from it goes through [`DataSource`] and [`ReviewSource`]. [`JsonStore`]
//! implements both over one collection, either purely in memory or backed
//! by a JSON file that is rewritten atomically after every mutation.

use chrono::Utc;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::entity::{Exportable, Record, ValidationError};
use crate::core::workflow::{ReviewRequest, Reviewable, WorkflowError};
use crate::pipeline::paginate::{check_page, paginate, Page, PageError, PageInfo};
use crate::pipeline::search::{apply_search, Searchable};

/// Errors returned by a data source
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("No {label} with id '{id}'")]
    NotFound { label: &'static str, id: String },

    #[error("A {label} with id '{id}' already exists")]
    Conflict { label: &'static str, id: String },

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error(transparent)]
    InvalidPage(#[from] PageError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Export encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Outcome of a bulk import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// Read and write access to one backend collection
pub trait DataSource<T> {
    /// One page of the collection in stored order
    fn list(&self, page: usize, limit: usize) -> Result<Page<T>, SourceError>;

    /// Every record matching `query` (case-insensitive substring)
    fn search(&self, query: &str) -> Result<Vec<T>, SourceError>;

    fn get_by_id(&self, id: &str) -> Result<T, SourceError>;

    fn create(&mut self, payload: Value) -> Result<T, SourceError>;

    /// Shallow-merge `payload` into the stored record
    fn update(&mut self, id: &str, payload: Value) -> Result<T, SourceError>;

    fn delete(&mut self, id: &str) -> Result<T, SourceError>;

    fn import(&mut self, bytes: &[u8]) -> Result<ImportStats, SourceError>;

    fn export(&self, format: ExportFormat) -> Result<Vec<u8>, SourceError>;
}

/// Workflow transitions on a moderated collection
pub trait ReviewSource<T> {
    fn transition(
        &mut self,
        id: &str,
        request: &ReviewRequest,
        reviewer: &str,
    ) -> Result<T, SourceError>;
}

/// One collection held in memory, optionally mirrored to a JSON file
#[derive(Debug, Clone)]
pub struct JsonStore<T> {
    records: Vec<T>,
    path: Option<PathBuf>,
}

impl<T: Record> JsonStore<T> {
    /// A store that is never written to disk
    pub fn in_memory(mut records: Vec<T>) -> Self {
        T::normalize_loaded(&mut records);
        Self {
            records,
            path: None,
        }
    }

    /// Load the collection file at `path`; a missing file is an empty collection
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let mut records = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let value: Value = if contents.trim().is_empty() {
                Value::Array(Vec::new())
            } else {
                serde_json::from_str(&contents)?
            };
            decode_records(value)?
        } else {
            Vec::new()
        };
        T::normalize_loaded(&mut records);

        debug!(
            collection = T::COLLECTION,
            count = records.len(),
            path = %path.display(),
            "loaded collection"
        );

        Ok(Self {
            records,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn position(&self, id: &str) -> Result<usize, SourceError> {
        self.records
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| SourceError::NotFound {
                label: T::LABEL,
                id: id.to_string(),
            })
    }

    /// Write the collection back to its file through a temporary sibling
    fn persist(&self) -> Result<(), SourceError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(&self.records)?)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Store a freshly validated record at `index` (or append) and normalize
    fn commit(&mut self, index: Option<usize>, record: T) -> Result<T, SourceError> {
        let id = record.id().to_string();
        match index {
            Some(i) => self.records[i] = record,
            None => self.records.push(record),
        }
        T::normalize(&mut self.records, &id);
        self.persist()?;
        let i = self.position(&id)?;
        Ok(self.records[i].clone())
    }
}

/// Accept either a bare array or a `{"data": [...]}` envelope, skipping
/// elements that do not decode
fn decode_records<T: Record>(value: Value) -> Result<Vec<T>, SourceError> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(SourceError::InvalidPayload(format!(
                    "expected a JSON array of {}",
                    T::COLLECTION
                )))
            }
        },
        _ => {
            return Err(SourceError::InvalidPayload(format!(
                "expected a JSON array of {}",
                T::COLLECTION
            )))
        }
    };

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<T>(item) {
            Ok(record) => records.push(record),
            Err(e) => warn!(
                collection = T::COLLECTION,
                index,
                error = %e,
                "skipping record that does not decode"
            ),
        }
    }
    Ok(records)
}

fn payload_object(payload: Value) -> Result<Map<String, Value>, SourceError> {
    match payload {
        Value::Object(map) => Ok(map),
        other => Err(SourceError::InvalidPayload(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Fill in a ULID when the payload carries no usable id
fn ensure_id(map: &mut Map<String, Value>) -> String {
    match map.get("id").and_then(Value::as_str) {
        Some(id) if !id.trim().is_empty() => id.to_string(),
        _ => {
            let id = ulid::Ulid::new().to_string();
            map.insert("id".to_string(), Value::String(id.clone()));
            id
        }
    }
}

impl<T> DataSource<T> for JsonStore<T>
where
    T: Record + Searchable + Exportable,
{
    fn list(&self, page: usize, limit: usize) -> Result<Page<T>, SourceError> {
        check_page(page, limit, self.records.len())?;
        Ok(Page {
            data: paginate(&self.records, page, limit).to_vec(),
            pagination: PageInfo::new(page, limit, self.records.len()),
        })
    }

    fn search(&self, query: &str) -> Result<Vec<T>, SourceError> {
        Ok(apply_search(&self.records, query))
    }

    fn get_by_id(&self, id: &str) -> Result<T, SourceError> {
        let i = self.position(id)?;
        Ok(self.records[i].clone())
    }

    fn create(&mut self, payload: Value) -> Result<T, SourceError> {
        let mut map = payload_object(payload)?;
        let id = ensure_id(&mut map);
        if self.records.iter().any(|r| r.id() == id) {
            return Err(SourceError::Conflict { label: T::LABEL, id });
        }

        let record: T = serde_json::from_value(Value::Object(map))?;
        record.validate()?;
        debug!(collection = T::COLLECTION, id = %id, "created record");
        self.commit(None, record)
    }

    fn update(&mut self, id: &str, payload: Value) -> Result<T, SourceError> {
        let index = self.position(id)?;
        let patch = payload_object(payload)?;

        if let Some(new_id) = patch.get("id") {
            if new_id.as_str() != Some(id) {
                return Err(SourceError::InvalidPayload(
                    "the id of a record cannot be changed".to_string(),
                ));
            }
        }

        let mut stored = match serde_json::to_value(&self.records[index])? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in patch {
            stored.insert(key, value);
        }

        let record: T = serde_json::from_value(Value::Object(stored))?;
        record.validate()?;
        debug!(collection = T::COLLECTION, id = %id, "updated record");
        self.commit(Some(index), record)
    }

    fn delete(&mut self, id: &str) -> Result<T, SourceError> {
        let index = self.position(id)?;
        let removed = self.records.remove(index);
        self.persist()?;
        debug!(collection = T::COLLECTION, id = %id, "deleted record");
        Ok(removed)
    }

    fn import(&mut self, bytes: &[u8]) -> Result<ImportStats, SourceError> {
        let value: Value = serde_json::from_slice(bytes)?;
        let items = match value {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("data") {
                Some(Value::Array(items)) => items,
                _ => vec![Value::Object(map)],
            },
            other => {
                return Err(SourceError::InvalidPayload(format!(
                    "expected an array of {}, got {}",
                    T::COLLECTION,
                    json_kind(&other)
                )))
            }
        };

        let mut stats = ImportStats::default();
        for (index, item) in items.into_iter().enumerate() {
            let Value::Object(mut map) = item else {
                warn!(collection = T::COLLECTION, index, "skipping non-object entry");
                stats.skipped += 1;
                continue;
            };
            let id = ensure_id(&mut map);

            let record = match serde_json::from_value::<T>(Value::Object(map)) {
                Ok(record) => record,
                Err(e) => {
                    warn!(collection = T::COLLECTION, index, error = %e, "skipping entry");
                    stats.skipped += 1;
                    continue;
                }
            };
            if let Err(e) = record.validate() {
                warn!(collection = T::COLLECTION, id = %id, error = %e, "skipping invalid entry");
                stats.skipped += 1;
                continue;
            }

            match self.records.iter().position(|r| r.id() == id) {
                Some(i) => {
                    self.records[i] = record;
                    stats.updated += 1;
                }
                None => {
                    self.records.push(record);
                    stats.created += 1;
                }
            }
            T::normalize(&mut self.records, &id);
        }

        self.persist()?;
        Ok(stats)
    }

    fn export(&self, format: ExportFormat) -> Result<Vec<u8>, SourceError> {
        match format {
            ExportFormat::Json => Ok(serde_json::to_vec_pretty(&self.records)?),
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(Vec::new());
                wtr.write_record(T::csv_header())?;
                for record in &self.records {
                    wtr.write_record(record.csv_record())?;
                }
                wtr.into_inner()
                    .map_err(|e| SourceError::Io(e.into_error()))
            }
        }
    }
}

impl<T> ReviewSource<T> for JsonStore<T>
where
    T: Record + Reviewable,
{
    fn transition(
        &mut self,
        id: &str,
        request: &ReviewRequest,
        reviewer: &str,
    ) -> Result<T, SourceError> {
        let index = self.position(id)?;
        let mut record = self.records[index].clone();
        record.apply_review(request, reviewer, Utc::now())?;
        debug!(
            collection = T::COLLECTION,
            id = %id,
            action = %request.action,
            status = %record.status(),
            "applied review"
        );
        self.commit(Some(index), record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::campaign::{Campaign, CampaignStatus};
    use serde_json::json;
    use tempfile::tempdir;

    fn seeded() -> JsonStore<Campaign> {
        let mut store = JsonStore::in_memory(Vec::new());
        for (id, title) in [("c1", "Clean water"), ("c2", "School roof"), ("c3", "Water pumps")] {
            store
                .create(json!({"id": id, "title": title, "goalAmount": "1000"}))
                .unwrap();
        }
        store
    }

    #[test]
    fn test_list_pages() {
        let store = seeded();
        let page = store.list(2, 2).unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].id, "c3");
        assert_eq!(page.pagination.total, 3);
        assert!(matches!(
            store.list(3, 2),
            Err(SourceError::InvalidPage(PageError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn test_search() {
        let store = seeded();
        let hits = store.search("WATER").unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(store.search("  ").unwrap().len(), 3);
    }

    #[test]
    fn test_create_assigns_ulid_and_rejects_duplicates() {
        let mut store = seeded();
        let created = store.create(json!({"title": "Library"})).unwrap();
        assert_eq!(created.id.len(), 26);
        assert!(matches!(
            store.create(json!({"id": "c1", "title": "Again"})),
            Err(SourceError::Conflict { .. })
        ));
        assert!(matches!(
            store.create(json!(["not", "an", "object"])),
            Err(SourceError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_update_merges_and_keeps_id() {
        let mut store = seeded();
        let updated = store
            .update("c2", json!({"raisedAmount": "250"}))
            .unwrap();
        assert_eq!(updated.title, "School roof");
        assert_eq!(updated.raised(), 250.0);
        assert!(matches!(
            store.update("c2", json!({"id": "other"})),
            Err(SourceError::InvalidPayload(_))
        ));
        assert!(matches!(
            store.update("missing", json!({})),
            Err(SourceError::NotFound { .. })
        ));
    }

    #[test]
    fn test_delete() {
        let mut store = seeded();
        store.delete("c1").unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.get_by_id("c1").is_err());
    }

    #[test]
    fn test_transition_persists_review() {
        let mut store = seeded();
        let approved = store
            .transition("c1", &ReviewRequest::approve(), "ana")
            .unwrap();
        assert_eq!(approved.status, CampaignStatus::Approved);
        assert_eq!(store.get_by_id("c1").unwrap().reviews.len(), 1);

        let err = store
            .transition("c2", &ReviewRequest::new(crate::core::workflow::ReviewAction::Reject), "ana")
            .unwrap_err();
        assert!(matches!(err, SourceError::Workflow(WorkflowError::ReasonRequired(_))));
        assert_eq!(
            store.get_by_id("c2").unwrap().status,
            CampaignStatus::PendingApproval
        );
    }

    #[test]
    fn test_import_counts() {
        let mut store = seeded();
        let payload = br#"[
            {"id": "c1", "title": "Clean water v2"},
            {"title": "Brand new"},
            42,
            "not a record"
        ]"#;
        let stats = store.import(payload).unwrap();
        assert_eq!(
            stats,
            ImportStats {
                created: 1,
                updated: 1,
                skipped: 2
            }
        );
        assert_eq!(store.get_by_id("c1").unwrap().title, "Clean water v2");
    }

    #[test]
    fn test_export_csv() {
        let store = seeded();
        let bytes = store.export(ExportFormat::Csv).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("id,title,"));
        assert!(lines.next().unwrap().starts_with("c1,Clean water,"));
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn test_file_backed_round_trip() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("data").join("campaigns.json");

        let mut store: JsonStore<Campaign> = JsonStore::open(&path).unwrap();
        assert!(store.is_empty());
        store.create(json!({"id": "c1", "title": "Wells"})).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());

        let reopened: JsonStore<Campaign> = JsonStore::open(&path).unwrap();
        assert_eq!(reopened.records().len(), 1);
        assert_eq!(reopened.records()[0].title, "Wells");
    }

    #[test]
    fn test_open_skips_non_object_entries() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("campaigns.json");
        std::fs::write(
            &path,
            r#"{"data": [{"id": "ok", "title": "Fine"}, "oops", 42]}"#,
        )
        .unwrap();
        let store: JsonStore<Campaign> = JsonStore::open(&path).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.records()[0].id, "ok");
    }

    #[test]
    fn test_open_keeps_records_with_null_or_mistyped_fields() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("campaigns.json");
        std::fs::write(
            &path,
            r#"[
                {"id": "ok", "title": "Fine", "status": "active"},
                {"id": "t", "title": null, "status": "pending_approval"},
                {"id": "s", "title": "No status", "status": null},
                {"id": "i", "title": "Bad images", "images": null, "reviews": "none"},
                {"id": "d", "title": "Epoch", "createdAt": 1717200000, "endDate": false},
                {"id": 7, "title": {"x": 1}, "category": ["health"]}
            ]"#,
        )
        .unwrap();

        let store: JsonStore<Campaign> = JsonStore::open(&path).unwrap();
        let ids: Vec<&str> = store.records().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["ok", "t", "s", "i", "d", "7"]);

        let get = |id: &str| store.get_by_id(id).unwrap();
        assert_eq!(get("t").title, "");
        assert_eq!(get("t").status, CampaignStatus::PendingApproval);
        assert_eq!(get("s").status, CampaignStatus::PendingApproval);
        assert!(get("i").images.is_empty());
        assert!(get("i").reviews.is_empty());
        // Unparseable dates degrade to absent rather than failing the record
        assert_eq!(get("d").created_at.as_deref(), Some("1717200000"));
        assert!(get("d").created().is_none());
        assert_eq!(get("7").title, "");
        assert!(get("7").category.is_none());
    }

    #[test]
    fn test_open_keeps_withdrawal_with_null_account_details() {
        use crate::entities::withdrawal::{Withdrawal, WithdrawalStatus};

        let tmp = tempdir().unwrap();
        let path = tmp.path().join("withdrawals.json");
        std::fs::write(
            &path,
            r#"[
                {"id": "w1", "amount": "500", "status": "pending", "accountDetails": null,
                 "paymentMethod": 3, "requestDate": null},
                {"id": "w2", "amount": "900", "status": 1,
                 "accountDetails": {"accountName": null, "bankName": "Zenith"}}
            ]"#,
        )
        .unwrap();

        let store: JsonStore<Withdrawal> = JsonStore::open(&path).unwrap();
        assert_eq!(store.len(), 2);
        let w1 = store.get_by_id("w1").unwrap();
        assert_eq!(w1.account_details.account_name, "");
        assert!(w1.payment_method.is_none());
        assert!(w1.request_date.is_none());
        let w2 = store.get_by_id("w2").unwrap();
        assert_eq!(w2.status, WithdrawalStatus::default());
        assert_eq!(w2.account_details.bank_name, "Zenith");
    }
}
