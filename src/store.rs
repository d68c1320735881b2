//! Contract for the hosted document store.
//!
//! The backing database is a remote collection-of-documents service consumed
//! through this trait: one-shot reads and writes, plus push-based
//! subscriptions that deliver the current snapshot immediately and every
//! subsequent one after a change. The store is the sole source of truth;
//! everything local to this crate is a disposable mirror of it.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

/// The field map of one document, without its identifier.
pub type Fields = serde_json::Map<String, Value>;

/// A document as delivered by the store: generated id plus fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// A collection read: optionally ordered by one field and capped.
#[derive(Debug, Clone)]
pub struct CollectionQuery {
    pub collection: String,
    pub order_by: Option<(String, SortOrder)>,
    pub limit: Option<usize>,
}

impl CollectionQuery {
    pub fn all(collection: &str) -> Self {
        Self {
            collection: collection.to_string(),
            order_by: None,
            limit: None,
        }
    }

    pub fn ordered(collection: &str, field: &str, order: SortOrder, limit: usize) -> Self {
        Self {
            collection: collection.to_string(),
            order_by: Some((field.to_string(), order)),
            limit: Some(limit),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// No store credentials were supplied; the app runs with empty mirrors.
    #[error("remote store is not configured")]
    NotConfigured,

    /// A partial update targeted a document that does not exist.
    #[error("document {collection}/{id} does not exist")]
    NotFound { collection: String, id: String },

    /// The backend could not be reached or rejected the call.
    #[error("remote store unavailable: {0}")]
    Unavailable(String),

    /// A payload could not be encoded as a document field map.
    #[error("invalid payload: {0}")]
    Codec(String),
}

/// One snapshot event on a collection subscription.
pub type CollectionSnapshot = Result<Vec<Document>, StoreError>;

/// One snapshot event on a single-document subscription. `Ok(None)` means the
/// document does not exist (yet).
pub type DocumentSnapshot = Result<Option<Document>, StoreError>;

/// Severs a subscription exactly once, either explicitly via
/// [`Unsubscribe::release`] or implicitly on drop.
pub struct Unsubscribe {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Unsubscribe {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Calling more than once is safe; only the first call detaches.
    pub fn release(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Unsubscribe {
    fn drop(&mut self) {
        self.release();
    }
}

/// A live stream of snapshots plus the handle that stops it.
///
/// The first event is the snapshot as of subscription time; each store change
/// afterwards pushes a fresh full snapshot. Once cancelled (or once the store
/// goes away) the stream ends with `None`.
pub struct Subscription<T> {
    pub events: mpsc::UnboundedReceiver<T>,
    pub cancel: Unsubscribe,
}

impl<T> Subscription<T> {
    pub async fn next(&mut self) -> Option<T> {
        self.events.recv().await
    }
}

/// Client capability of the hosted document database.
///
/// Writes resolve on backend acknowledgment and reject with the backend's
/// error; no retries happen at this layer. `set_document` is a full replace
/// that creates the document if absent; `update_fields` patches named fields
/// of an existing document.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, StoreError>;

    /// Creates a document with a store-generated identifier and returns it.
    async fn create_document(&self, collection: &str, fields: Fields)
        -> Result<String, StoreError>;

    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError>;

    async fn update_fields(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError>;

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    fn subscribe_collection(&self, query: CollectionQuery) -> Subscription<CollectionSnapshot>;

    fn subscribe_document(&self, collection: &str, id: &str) -> Subscription<DocumentSnapshot>;
}
