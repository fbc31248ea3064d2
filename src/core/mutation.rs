//! Optimistic mutations with per-item revert
//!
//! The displayed copy of each targeted record is changed before the data
//! source confirms anything. Each item then either commits (and takes the
//! source's returned record) or fails and is restored from its snapshot.

use tracing::{debug, warn};

use crate::core::entity::Record;
use crate::core::source::ReviewSource;
use crate::core::workflow::ReviewRequest;

/// Lifecycle of one optimistic change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationState {
    Pending,
    Committed,
    Failed(String),
}

#[derive(Debug, Clone)]
struct Entry<T> {
    id: String,
    snapshot: T,
    state: MutationState,
}

/// A set of optimistic changes awaiting confirmation
#[derive(Debug, Clone)]
pub struct OptimisticBatch<T> {
    entries: Vec<Entry<T>>,
}

impl<T: Record> OptimisticBatch<T> {
    /// Snapshot every item in `items` whose id is in `ids`, then apply `preview`.
    ///
    /// Ids not present in `items` are ignored.
    pub fn begin(items: &mut [T], ids: &[String], preview: impl Fn(&mut T)) -> Self {
        let mut entries = Vec::new();
        for id in ids {
            if entries.iter().any(|e: &Entry<T>| &e.id == id) {
                continue;
            }
            if let Some(item) = items.iter_mut().find(|r| r.id() == id) {
                entries.push(Entry {
                    id: id.clone(),
                    snapshot: item.clone(),
                    state: MutationState::Pending,
                });
                preview(item);
            }
        }
        Self { entries }
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.id.as_str())
    }

    pub fn state(&self, id: &str) -> Option<&MutationState> {
        self.entries.iter().find(|e| e.id == id).map(|e| &e.state)
    }

    /// Mark `id` committed and replace the displayed item with `confirmed`
    pub fn commit(&mut self, items: &mut [T], confirmed: T) {
        let id = confirmed.id().to_string();
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) {
            entry.state = MutationState::Committed;
        }
        if let Some(item) = items.iter_mut().find(|r| r.id() == id) {
            *item = confirmed;
        }
    }

    /// Mark `id` failed and restore its snapshot
    pub fn fail(&mut self, items: &mut [T], id: &str, message: impl Into<String>) {
        let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else {
            return;
        };
        let message = message.into();
        warn!(collection = T::COLLECTION, id = %id, error = %message, "reverting optimistic change");
        entry.state = MutationState::Failed(message);
        if let Some(item) = items.iter_mut().find(|r| r.id() == id) {
            *item = entry.snapshot.clone();
        }
    }

    pub fn committed(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.state == MutationState::Committed)
            .count()
    }

    /// Failed ids with their messages
    pub fn failures(&self) -> Vec<(&str, &str)> {
        self.entries
            .iter()
            .filter_map(|e| match &e.state {
                MutationState::Failed(msg) => Some((e.id.as_str(), msg.as_str())),
                _ => None,
            })
            .collect()
    }

    pub fn is_settled(&self) -> bool {
        self.entries
            .iter()
            .all(|e| e.state != MutationState::Pending)
    }
}

/// Apply `request` to every id, optimistically updating `items`.
///
/// Failures revert only the failing item; the rest of the batch continues.
pub fn bulk_review<T, S>(
    source: &mut S,
    items: &mut [T],
    ids: &[String],
    request: &ReviewRequest,
    reviewer: &str,
    preview: impl Fn(&mut T),
) -> OptimisticBatch<T>
where
    T: Record,
    S: ReviewSource<T>,
{
    let mut batch = OptimisticBatch::begin(items, ids, preview);
    let targets: Vec<String> = batch.ids().map(str::to_string).collect();

    for id in targets {
        match source.transition(&id, request, reviewer) {
            Ok(confirmed) => {
                debug!(collection = T::COLLECTION, id = %id, "committed");
                batch.commit(items, confirmed);
            }
            Err(e) => batch.fail(items, &id, e.to_string()),
        }
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::source::{DataSource, JsonStore, SourceError};
    use crate::entities::withdrawal::{Withdrawal, WithdrawalStatus};
    use serde_json::json;

    fn withdrawal(id: &str) -> Withdrawal {
        serde_json::from_value(json!({"id": id, "amount": "100", "status": "pending"})).unwrap()
    }

    #[test]
    fn test_bulk_approve_reverts_failures_only() {
        let mut store = JsonStore::in_memory(vec![withdrawal("w1"), withdrawal("w3")]);
        let mut displayed = vec![withdrawal("w1"), withdrawal("w2"), withdrawal("w3")];
        let ids = vec!["w1".to_string(), "w2".to_string(), "w3".to_string()];

        let batch = bulk_review(
            &mut store,
            &mut displayed,
            &ids,
            &ReviewRequest::approve(),
            "ana",
            |w| w.status = WithdrawalStatus::Approved,
        );

        assert!(batch.is_settled());
        assert_eq!(batch.committed(), 2);
        let failures = batch.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "w2");

        assert_eq!(displayed[0].status, WithdrawalStatus::Approved);
        assert!(displayed[0].review_date.is_some());
        assert_eq!(displayed[1].status, WithdrawalStatus::Pending);
        assert_eq!(displayed[2].status, WithdrawalStatus::Approved);

        assert_eq!(
            store.get_by_id("w3").unwrap().status,
            WithdrawalStatus::Approved
        );
        assert!(matches!(
            store.get_by_id("w2"),
            Err(SourceError::NotFound { .. })
        ));
    }

    #[test]
    fn test_begin_applies_preview_and_snapshots() {
        let mut items = vec![withdrawal("a"), withdrawal("b")];
        let mut batch = OptimisticBatch::begin(
            &mut items,
            &["b".to_string(), "b".to_string(), "zzz".to_string()],
            |w| w.status = WithdrawalStatus::Rejected,
        );
        assert_eq!(batch.ids().collect::<Vec<_>>(), vec!["b"]);
        assert_eq!(items[1].status, WithdrawalStatus::Rejected);
        assert_eq!(batch.state("b"), Some(&MutationState::Pending));
        assert!(!batch.is_settled());

        batch.fail(&mut items, "b", "network down");
        assert_eq!(items[1].status, WithdrawalStatus::Pending);
        assert_eq!(
            batch.state("b"),
            Some(&MutationState::Failed("network down".to_string()))
        );
    }
}
