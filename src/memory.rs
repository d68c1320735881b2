//! In-process [`DocumentStore`] used by tests, demos, and local development.
//!
//! Behaves like the hosted backend at the contract level: generated ids,
//! upsert semantics for `set_document`, ordered/limited collection queries,
//! and snapshot fan-out to every live subscriber after each write. Two test
//! hooks make failure paths reachable: [`MemoryStore::inject_error`] pushes
//! an error event to subscribers, [`MemoryStore::deny_writes`] makes writes
//! to one collection fail as unreachable.

use std::cmp::Ordering as CmpOrdering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::store::{
    CollectionQuery, CollectionSnapshot, Document, DocumentSnapshot, DocumentStore, Fields,
    SortOrder, StoreError, Subscription, Unsubscribe,
};

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, BTreeMap<String, Fields>>,
    watchers: Vec<CollectionWatcher>,
    doc_watchers: Vec<DocumentWatcher>,
    next_watcher: u64,
    denied: HashSet<String>,
}

struct CollectionWatcher {
    id: u64,
    query: CollectionQuery,
    tx: mpsc::UnboundedSender<CollectionSnapshot>,
}

struct DocumentWatcher {
    id: u64,
    collection: String,
    doc_id: String,
    tx: mpsc::UnboundedSender<DocumentSnapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Test hook: pushes an error event to every subscriber of `collection`,
    /// as the backend does when a listener's connection drops.
    pub fn inject_error(&self, collection: &str, error: StoreError) {
        let inner = self.lock();
        for watcher in &inner.watchers {
            if watcher.query.collection == collection {
                let _ = watcher.tx.send(Err(error.clone()));
            }
        }
        for watcher in &inner.doc_watchers {
            if watcher.collection == collection {
                let _ = watcher.tx.send(Err(error.clone()));
            }
        }
    }

    /// Test hook: all subsequent writes to `collection` fail as unreachable.
    pub fn deny_writes(&self, collection: &str) {
        self.lock().denied.insert(collection.to_string());
    }

    fn check_writable(inner: &Inner, collection: &str) -> Result<(), StoreError> {
        if inner.denied.contains(collection) {
            return Err(StoreError::Unavailable(format!(
                "write to {collection} refused"
            )));
        }
        Ok(())
    }

    fn notify(inner: &mut Inner, collection: &str) {
        let snapshots: Vec<(u64, Vec<Document>)> = {
            let inner: &Inner = inner;
            inner
                .watchers
                .iter()
                .filter(|watcher| watcher.query.collection == collection)
                .map(|watcher| (watcher.id, snapshot(inner, &watcher.query)))
                .collect()
        };
        for (id, docs) in snapshots {
            inner
                .watchers
                .retain(|watcher| watcher.id != id || watcher.tx.send(Ok(docs.clone())).is_ok());
        }

        let docs: Vec<(u64, Option<Document>)> = {
            let inner: &Inner = inner;
            inner
                .doc_watchers
                .iter()
                .filter(|watcher| watcher.collection == collection)
                .map(|watcher| {
                    (
                        watcher.id,
                        lookup(inner, &watcher.collection, &watcher.doc_id),
                    )
                })
                .collect()
        };
        for (id, doc) in docs {
            inner
                .doc_watchers
                .retain(|watcher| watcher.id != id || watcher.tx.send(Ok(doc.clone())).is_ok());
        }
    }
}

fn lookup(inner: &Inner, collection: &str, id: &str) -> Option<Document> {
    inner
        .collections
        .get(collection)
        .and_then(|docs| docs.get(id))
        .map(|fields| Document {
            id: id.to_string(),
            fields: fields.clone(),
        })
}

fn snapshot(inner: &Inner, query: &CollectionQuery) -> Vec<Document> {
    let mut docs: Vec<Document> = inner
        .collections
        .get(&query.collection)
        .map(|docs| {
            docs.iter()
                .map(|(id, fields)| Document {
                    id: id.clone(),
                    fields: fields.clone(),
                })
                .collect()
        })
        .unwrap_or_default();

    if let Some((field, order)) = &query.order_by {
        docs.sort_by(|a, b| {
            let ordering = compare_values(a.fields.get(field), b.fields.get(field));
            match order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            }
        });
    }

    if let Some(limit) = query.limit {
        docs.truncate(limit);
    }

    docs
}

/// Field comparison for ordered queries. Absent fields sort first; mixed
/// types fall back to their JSON text.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> CmpOrdering {
    match (a, b) {
        (None, None) => CmpOrdering::Equal,
        (None, Some(_)) => CmpOrdering::Less,
        (Some(_), None) => CmpOrdering::Greater,
        (Some(a), Some(b)) => match (a, b) {
            (Value::Number(a), Value::Number(b)) => a
                .as_f64()
                .partial_cmp(&b.as_f64())
                .unwrap_or(CmpOrdering::Equal),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            _ => a.to_string().cmp(&b.to_string()),
        },
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        Ok(lookup(&self.lock(), collection, id))
    }

    async fn create_document(
        &self,
        collection: &str,
        fields: Fields,
    ) -> Result<String, StoreError> {
        let mut inner = self.lock();
        Self::check_writable(&inner, collection)?;

        let id = Uuid::new_v4().to_string();
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);
        Self::notify(&mut inner, collection);
        Ok(id)
    }

    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        Self::check_writable(&inner, collection)?;

        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
        Self::notify(&mut inner, collection);
        Ok(())
    }

    async fn update_fields(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        Self::check_writable(&inner, collection)?;

        let existing = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        for (key, value) in fields {
            existing.insert(key, value);
        }
        Self::notify(&mut inner, collection);
        Ok(())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        Self::check_writable(&inner, collection)?;

        let removed = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id));
        // Deleting an absent document succeeds, like the backend.
        if removed.is_some() {
            Self::notify(&mut inner, collection);
        }
        Ok(())
    }

    fn subscribe_collection(&self, query: CollectionQuery) -> Subscription<CollectionSnapshot> {
        let (tx, events) = mpsc::unbounded_channel();
        let mut inner = self.lock();

        let id = inner.next_watcher;
        inner.next_watcher += 1;
        let _ = tx.send(Ok(snapshot(&inner, &query)));
        inner.watchers.push(CollectionWatcher { id, query, tx });
        drop(inner);

        let store = self.inner.clone();
        let cancel = Unsubscribe::new(move || {
            let mut inner = store.lock().unwrap_or_else(PoisonError::into_inner);
            inner.watchers.retain(|watcher| watcher.id != id);
        });
        Subscription { events, cancel }
    }

    fn subscribe_document(&self, collection: &str, id: &str) -> Subscription<DocumentSnapshot> {
        let (tx, events) = mpsc::unbounded_channel();
        let mut inner = self.lock();

        let watcher_id = inner.next_watcher;
        inner.next_watcher += 1;
        let _ = tx.send(Ok(lookup(&inner, collection, id)));
        inner.doc_watchers.push(DocumentWatcher {
            id: watcher_id,
            collection: collection.to_string(),
            doc_id: id.to_string(),
            tx,
        });
        drop(inner);

        let store = self.inner.clone();
        let cancel = Unsubscribe::new(move || {
            let mut inner = store.lock().unwrap_or_else(PoisonError::into_inner);
            inner.doc_watchers.retain(|watcher| watcher.id != watcher_id);
        });
        Subscription { events, cancel }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[tokio::test]
    async fn create_assigns_long_generated_id() {
        let store = MemoryStore::new();
        let id = store
            .create_document("services", fields(json!({ "name": "Haircut" })))
            .await
            .expect("create");
        assert!(id.len() > 15);

        let doc = store
            .get_document("services", &id)
            .await
            .expect("get")
            .expect("present");
        assert_eq!(doc.fields["name"], json!("Haircut"));
    }

    #[tokio::test]
    async fn set_document_creates_when_absent_and_replaces_when_present() {
        let store = MemoryStore::new();
        store
            .set_document("config", "branding", fields(json!({ "shopName": "A" })))
            .await
            .expect("first set");
        store
            .set_document("config", "branding", fields(json!({ "shopSlogan": "B" })))
            .await
            .expect("second set");

        let doc = store
            .get_document("config", "branding")
            .await
            .expect("get")
            .expect("present");
        // Full replace: first write's field is gone.
        assert!(doc.fields.get("shopName").is_none());
        assert_eq!(doc.fields["shopSlogan"], json!("B"));
    }

    #[tokio::test]
    async fn update_fields_patches_and_requires_existence() {
        let store = MemoryStore::new();
        let id = store
            .create_document(
                "appointments",
                fields(json!({ "status": "pending", "date": "2025-06-01" })),
            )
            .await
            .expect("create");

        store
            .update_fields("appointments", &id, fields(json!({ "status": "confirmed" })))
            .await
            .expect("patch");
        let doc = store
            .get_document("appointments", &id)
            .await
            .expect("get")
            .expect("present");
        assert_eq!(doc.fields["status"], json!("confirmed"));
        assert_eq!(doc.fields["date"], json!("2025-06-01"));

        let missing = store
            .update_fields("appointments", "nope", fields(json!({ "status": "confirmed" })))
            .await;
        assert!(matches!(missing, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn delete_of_absent_document_is_ok() {
        let store = MemoryStore::new();
        store
            .delete_document("services", "nope")
            .await
            .expect("delete");
    }

    #[tokio::test]
    async fn subscription_gets_initial_snapshot_then_changes() {
        let store = MemoryStore::new();
        store
            .create_document("offers", fields(json!({ "title": "Summer" })))
            .await
            .expect("create");

        let mut sub = store.subscribe_collection(CollectionQuery::all("offers"));
        let initial = sub.next().await.expect("event").expect("snapshot");
        assert_eq!(initial.len(), 1);

        store
            .create_document("offers", fields(json!({ "title": "Winter" })))
            .await
            .expect("create");
        let second = sub.next().await.expect("event").expect("snapshot");
        assert_eq!(second.len(), 2);
    }

    #[tokio::test]
    async fn ordered_query_sorts_descending_and_caps() {
        let store = MemoryStore::new();
        for date in ["2025-06-01", "2025-06-03", "2025-06-02", "2025-05-30"] {
            store
                .create_document("appointments", fields(json!({ "date": date })))
                .await
                .expect("create");
        }

        let mut sub = store.subscribe_collection(CollectionQuery::ordered(
            "appointments",
            "date",
            SortOrder::Descending,
            3,
        ));
        let docs = sub.next().await.expect("event").expect("snapshot");
        let dates: Vec<&str> = docs
            .iter()
            .map(|doc| doc.fields["date"].as_str().expect("date"))
            .collect();
        assert_eq!(dates, ["2025-06-03", "2025-06-02", "2025-06-01"]);
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe_collection(CollectionQuery::all("gallery"));
        let _ = sub.next().await.expect("initial");

        sub.cancel.release();
        store
            .create_document("gallery", fields(json!({ "url": "x" })))
            .await
            .expect("create");
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn document_subscription_tracks_one_document() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe_document("config", "branding");
        assert_eq!(sub.next().await.expect("event").expect("snapshot"), None);

        store
            .set_document("config", "branding", fields(json!({ "shopName": "A" })))
            .await
            .expect("set");
        let doc = sub
            .next()
            .await
            .expect("event")
            .expect("snapshot")
            .expect("present");
        assert_eq!(doc.id, "branding");
    }

    #[tokio::test]
    async fn injected_error_reaches_subscribers() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe_collection(CollectionQuery::all("services"));
        let _ = sub.next().await.expect("initial");

        store.inject_error("services", StoreError::Unavailable("gone".to_string()));
        let event = sub.next().await.expect("event");
        assert!(matches!(event, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn denied_collection_rejects_writes() {
        let store = MemoryStore::new();
        store.deny_writes("notifications");
        let result = store
            .create_document("notifications", fields(json!({ "title": "x" })))
            .await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }
}
