//! In-memory backend for tests and offline demos
//!
//! One struct stands in for both external collaborators (the identity
//! store and the document store), the same way the real backend bundles
//! them behind a single project. Holds everything in process memory,
//! mints uuid ids, resolves server-timestamp sentinels against its own
//! clock, and broadcasts identity changes. Failure injection hooks let
//! tests exercise the degraded paths without a network.

use super::{
    AuthEvent, AuthIdentity, AuthStore, Document, DocumentStore, Filter, SortDirection,
    compare_values, is_server_timestamp,
};
use crate::{
    errors::{MoirError, Result},
    types::Fields,
};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, broadcast};
use tracing::debug;

struct Account {
    uid: String,
    password: String,
    display_name: Option<String>,
}

/// An in-memory identity and document store.
///
/// Will be destroyed on drop; nothing persists across sessions, matching
/// the client's no-durable-cache resource model.
pub struct MemoryStore {
    /// Documents per collection, keyed by id
    collections: Mutex<HashMap<String, BTreeMap<String, Fields>>>,
    /// Registered accounts, keyed by email
    accounts: Mutex<HashMap<String, Account>>,
    /// Currently signed-in identity
    current: Mutex<Option<AuthIdentity>>,
    /// Identity-change notifications
    events: broadcast::Sender<AuthEvent>,
    fail_next_fetch: AtomicBool,
    fail_next_write: AtomicBool,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        let (events, _rx) = broadcast::channel(16);
        Self {
            collections: Mutex::new(HashMap::new()),
            accounts: Mutex::new(HashMap::new()),
            current: Mutex::new(None),
            events,
            fail_next_fetch: AtomicBool::new(false),
            fail_next_write: AtomicBool::new(false),
        }
    }

    /// Make the next list/get/count call fail with a fetch error.
    pub fn fail_next_fetch(&self) {
        self.fail_next_fetch.store(true, Ordering::SeqCst);
    }

    /// Make the next create/update/set/delete call fail with a write
    /// error.
    pub fn fail_next_write(&self) {
        self.fail_next_write.store(true, Ordering::SeqCst);
    }

    /// Place a document at a fixed id, bypassing id assignment and
    /// timestamp resolution. Intended for seeding test fixtures,
    /// malformed ones included.
    pub async fn put_document(&self, collection: &str, id: &str, fields: Fields) {
        let mut collections = self.collections.lock().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
    }

    fn take_fetch_failure(&self, collection: &str) -> Result<()> {
        if self.fail_next_fetch.swap(false, Ordering::SeqCst) {
            debug!(collection, "injected fetch failure");
            return Err(MoirError::fetch(collection, "network unavailable"));
        }
        Ok(())
    }

    fn take_write_failure(&self, collection: &str) -> Result<()> {
        if self.fail_next_write.swap(false, Ordering::SeqCst) {
            debug!(collection, "injected write failure");
            return Err(MoirError::write(collection, "network unavailable"));
        }
        Ok(())
    }

    /// Replace server-timestamp sentinels with the store's clock.
    fn resolve_timestamps(fields: &mut Fields) {
        let now = serde_json::to_value(Utc::now()).unwrap_or(Value::Null);
        for value in fields.values_mut() {
            if is_server_timestamp(value) {
                *value = now.clone();
            }
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>> {
        self.take_fetch_failure(collection)?;
        let collections = self.collections.lock().await;
        let mut docs: Vec<Document> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, fields)| filter.matches(fields))
                    .map(|(id, fields)| Document {
                        id: id.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        if let Some((ref field, direction)) = filter.order_by {
            docs.sort_by(|a, b| {
                let av = a.fields.get(field).unwrap_or(&Value::Null);
                let bv = b.fields.get(field).unwrap_or(&Value::Null);
                let ordering = compare_values(av, bv);
                match direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = filter.limit {
            docs.truncate(limit);
        }

        Ok(docs)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        self.take_fetch_failure(collection)?;
        let collections = self.collections.lock().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document {
                id: id.to_string(),
                fields: fields.clone(),
            }))
    }

    async fn create(&self, collection: &str, mut fields: Fields) -> Result<String> {
        self.take_write_failure(collection)?;
        Self::resolve_timestamps(&mut fields);
        let id = uuid::Uuid::new_v4().to_string();
        let mut collections = self.collections.lock().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, mut patch: Fields) -> Result<()> {
        self.take_write_failure(collection)?;
        Self::resolve_timestamps(&mut patch);
        let mut collections = self.collections.lock().await;
        let fields = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| MoirError::not_found(collection, id))?;
        fields.extend(patch);
        Ok(())
    }

    async fn set(&self, collection: &str, id: &str, mut fields: Fields) -> Result<()> {
        self.take_write_failure(collection)?;
        Self::resolve_timestamps(&mut fields);
        let mut collections = self.collections.lock().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        self.take_write_failure(collection)?;
        let mut collections = self.collections.lock().await;
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64> {
        self.take_fetch_failure(collection)?;
        let collections = self.collections.lock().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.values()
                    .filter(|fields| filter.matches(fields))
                    .count() as u64
            })
            .unwrap_or(0))
    }
}

#[async_trait]
impl AuthStore for MemoryStore {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthIdentity> {
        let accounts = self.accounts.lock().await;
        let account = accounts
            .get(email)
            .filter(|account| account.password == password)
            .ok_or(MoirError::InvalidCredentials)?;
        let identity = AuthIdentity {
            uid: account.uid.clone(),
            email: email.to_string(),
            display_name: account.display_name.clone(),
        };
        drop(accounts);

        *self.current.lock().await = Some(identity.clone());
        let _ = self.events.send(AuthEvent::SignedIn(identity.clone()));
        Ok(identity)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthIdentity> {
        let mut accounts = self.accounts.lock().await;
        if accounts.contains_key(email) {
            return Err(MoirError::DuplicateRegistration {
                email: email.to_string(),
            });
        }
        let uid = uuid::Uuid::new_v4().to_string();
        accounts.insert(
            email.to_string(),
            Account {
                uid: uid.clone(),
                password: password.to_string(),
                display_name: None,
            },
        );
        drop(accounts);

        let identity = AuthIdentity {
            uid,
            email: email.to_string(),
            display_name: None,
        };
        *self.current.lock().await = Some(identity.clone());
        let _ = self.events.send(AuthEvent::SignedIn(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<()> {
        *self.current.lock().await = None;
        let _ = self.events.send(AuthEvent::SignedOut);
        Ok(())
    }

    async fn current_identity(&self) -> Option<AuthIdentity> {
        self.current.lock().await.clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
