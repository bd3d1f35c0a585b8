//! User-scoped collection access
//!
//! Every screen follows the same data pattern: fetch one owner-scoped
//! collection, decode it into typed records, and filter or sort the small
//! result set client-side. The accessor owns that pattern. The remote
//! store is only asked for equality filters and single-field ordering;
//! when a query would need a composite index, the full owner-scoped set is
//! fetched and shaped in memory instead. That trade-off is only
//! acceptable because per-user datasets are hundreds of records, not
//! millions.
//!
//! Fetches carry an epoch guard: bump the epoch when the owner or the
//! mounted screen changes, and responses snapshotted under an older epoch
//! are discarded rather than applied over newer state.

use crate::{
    config::CollectionNames,
    errors::{MoirError, Result},
    store::{Document, DocumentStore, Filter},
    types::{Entry, Fields, Notebook, ThoughtDump},
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// A typed record living in one named collection.
pub trait Record: DeserializeOwned {
    /// The collection this record type is stored in.
    fn collection(names: &CollectionNames) -> &str;
}

impl Record for Notebook {
    fn collection(names: &CollectionNames) -> &str {
        &names.notebooks
    }
}

impl Record for Entry {
    fn collection(names: &CollectionNames) -> &str {
        &names.entries
    }
}

impl Record for ThoughtDump {
    fn collection(names: &CollectionNames) -> &str {
        &names.thought_dumps
    }
}

/// Snapshot of the fetch epoch taken before a request was issued.
///
/// A response is only applied while its guard is still current; a slow
/// earlier response can then never overwrite a later, correct state.
#[derive(Debug, Clone)]
pub struct FetchGuard {
    epoch: u64,
    counter: Arc<AtomicU64>,
}

impl FetchGuard {
    /// Whether no epoch bump happened since this guard was taken.
    pub fn is_current(&self) -> bool {
        self.counter.load(Ordering::SeqCst) == self.epoch
    }
}

/// Typed CRUD over the owner-scoped collections.
pub struct CollectionAccessor {
    store: Arc<dyn DocumentStore>,
    names: CollectionNames,
    epoch: Arc<AtomicU64>,
}

impl CollectionAccessor {
    /// Create an accessor over a document store.
    pub fn new(store: Arc<dyn DocumentStore>, names: CollectionNames) -> Self {
        Self {
            store,
            names,
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Collection names this accessor resolves record types against.
    pub fn names(&self) -> &CollectionNames {
        &self.names
    }

    /// Take a guard for a fetch about to be issued.
    pub fn guard(&self) -> FetchGuard {
        FetchGuard {
            epoch: self.epoch.load(Ordering::SeqCst),
            counter: Arc::clone(&self.epoch),
        }
    }

    /// Invalidate all in-flight fetches. Call on owner change or screen
    /// unmount.
    pub fn bump_epoch(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        debug!("fetch epoch bumped");
    }

    /// List every record of one owner.
    pub async fn list_owned<T: Record>(&self, user_id: &str) -> Result<Vec<T>> {
        self.list_with(Filter::owner(user_id)).await
    }

    /// List records matching a filter. Callers scope the filter to an
    /// owner; this crate never issues unscoped queries.
    pub async fn list_with<T: Record>(&self, filter: Filter) -> Result<Vec<T>> {
        let collection = T::collection(&self.names);
        let docs = self.store.list(collection, &filter).await?;
        debug!(collection, count = docs.len(), "fetched");
        docs.into_iter()
            .map(|doc| decode::<T>(collection, doc))
            .collect()
    }

    /// Get one record by id. Absence is an error here: by-id lookups sit
    /// on critical paths where the caller redirects rather than renders a
    /// hole.
    pub async fn get<T: Record>(&self, id: &str) -> Result<T> {
        let collection = T::collection(&self.names);
        match self.store.get(collection, id).await? {
            Some(doc) => decode::<T>(collection, doc),
            None => Err(MoirError::not_found(collection, id)),
        }
    }

    /// Create a record from raw fields; the store assigns the id.
    pub async fn create<T: Record>(&self, fields: Fields) -> Result<String> {
        self.store.create(T::collection(&self.names), fields).await
    }

    /// Patch fields on a record.
    pub async fn update<T: Record>(&self, id: &str, patch: Fields) -> Result<()> {
        self.store
            .update(T::collection(&self.names), id, patch)
            .await
    }

    /// Delete a record by id.
    pub async fn delete<T: Record>(&self, id: &str) -> Result<()> {
        self.store.delete(T::collection(&self.names), id).await
    }

    /// Server-side count of a filtered query.
    pub async fn count<T: Record>(&self, filter: &Filter) -> Result<u64> {
        self.store.count(T::collection(&self.names), filter).await
    }
}

/// Decode a raw document into a typed record, failing with a typed
/// decoding error instead of propagating loose fields.
fn decode<T: Record>(collection: &str, doc: Document) -> Result<T> {
    let id = doc.id.clone();
    serde_json::from_value(doc.into_value()).map_err(|source| MoirError::Decode {
        collection: collection.to_string(),
        id,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn accessor() -> (Arc<MemoryStore>, CollectionAccessor) {
        let store = Arc::new(MemoryStore::new());
        let accessor = CollectionAccessor::new(store.clone(), CollectionNames::default());
        (store, accessor)
    }

    fn notebook_fields(owner: &str, name: &str) -> Fields {
        let mut fields = Fields::new();
        fields.insert("userId".into(), json!(owner));
        fields.insert("name".into(), json!(name));
        fields
    }

    #[tokio::test]
    async fn test_list_owned_is_scoped() {
        let (_store, accessor) = accessor();
        accessor
            .create::<Notebook>(notebook_fields("u1", "Mine"))
            .await
            .unwrap();
        accessor
            .create::<Notebook>(notebook_fields("u2", "Theirs"))
            .await
            .unwrap();

        let notebooks: Vec<Notebook> = accessor.list_owned("u1").await.unwrap();
        assert_eq!(notebooks.len(), 1);
        assert_eq!(notebooks[0].name, "Mine");
        assert_eq!(notebooks[0].user_id, "u1");
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let (_store, accessor) = accessor();
        let err = accessor.get::<Notebook>("missing").await.unwrap_err();
        assert!(matches!(err, MoirError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_malformed_document_is_decode_error() {
        let (store, accessor) = accessor();
        // An entry missing its required date.
        let mut fields = Fields::new();
        fields.insert("userId".into(), json!("u1"));
        fields.insert("notebookId".into(), json!("nb1"));
        store.put_document("entries", "bad", fields).await;

        let err = accessor.get::<Entry>("bad").await.unwrap_err();
        match err {
            MoirError::Decode { collection, id, .. } => {
                assert_eq!(collection, "entries");
                assert_eq!(id, "bad");
            }
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_guard_goes_stale_on_bump() {
        let (_store, accessor) = accessor();
        let guard = accessor.guard();
        assert!(guard.is_current());
        accessor.bump_epoch();
        assert!(!guard.is_current());
        assert!(accessor.guard().is_current());
    }
}
