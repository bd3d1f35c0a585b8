//! Backend abstractions for the remote document and identity stores
//!
//! The Moir client delegates all persistence and authentication to an
//! external backend-as-a-service. This module defines the two traits the
//! rest of the crate talks through, plus the small query vocabulary the
//! remote store actually offers: equality filters, single-field ordering,
//! a limit, and a server-side count. Anything richer is done client-side
//! on the already-fetched, owner-scoped set.

use crate::{errors::Result, types::Fields};
use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::broadcast;

pub mod memory;

pub use memory::MemoryStore;

/// Field carrying the owner's identity id on every user-scoped document.
pub const OWNER_FIELD: &str = "userId";

/// A raw document as returned by the store: server-assigned id plus loose
/// fields. Typed decoding happens at the accessor boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Store-assigned identifier
    pub id: String,
    /// Document fields
    pub fields: Fields,
}

impl Document {
    /// Flatten into a single JSON object with the id folded in, ready for
    /// typed decoding.
    pub fn into_value(self) -> Value {
        let mut fields = self.fields;
        fields.insert("id".into(), json!(self.id));
        Value::Object(fields)
    }
}

/// Sort direction for an ordered query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Smallest first
    Ascending,
    /// Largest first
    Descending,
}

/// A query against a named collection: conjunction of equality clauses,
/// optional single-field ordering, optional limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    /// Equality clauses, all of which must match
    pub clauses: Vec<(String, Value)>,
    /// Optional ordering
    pub order_by: Option<(String, SortDirection)>,
    /// Optional result cap, applied after ordering
    pub limit: Option<usize>,
}

impl Filter {
    /// An empty filter matching every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// A filter scoped to one owner's documents.
    pub fn owner(user_id: &str) -> Self {
        Self::new().with_eq(OWNER_FIELD, json!(user_id))
    }

    /// Adds an equality clause.
    pub fn with_eq(mut self, field: impl Into<String>, value: Value) -> Self {
        self.clauses.push((field.into(), value));
        self
    }

    /// Orders results by a field.
    pub fn with_order(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    /// Caps the number of results.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a document's fields satisfy every equality clause.
    pub fn matches(&self, fields: &Fields) -> bool {
        self.clauses
            .iter()
            .all(|(field, expected)| fields.get(field) == Some(expected))
    }
}

/// Ordering between two loose JSON values, for client- or store-side
/// sorting. Strings compare lexically, numbers numerically; anything else
/// falls back to its JSON text.
pub fn compare_values(a: &Value, b: &Value) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// Sentinel value the store replaces with its own clock at write time.
pub fn server_timestamp() -> Value {
    json!({ "__server_timestamp": true })
}

/// Whether a value is the server-timestamp sentinel.
pub fn is_server_timestamp(value: &Value) -> bool {
    value
        .get("__server_timestamp")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Remote document store consumed by the client.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Query a named collection.
    async fn list(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>>;

    /// Get a single document by id, `None` when it does not exist.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Add a document; the store assigns and returns the id.
    async fn create(&self, collection: &str, fields: Fields) -> Result<String>;

    /// Update fields on an existing document.
    async fn update(&self, collection: &str, id: &str, patch: Fields) -> Result<()>;

    /// Set a document at a known id, creating it if absent. Used for
    /// profile documents keyed by identity id.
    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<()>;

    /// Delete a document by id.
    async fn delete(&self, collection: &str, id: &str) -> Result<()>;

    /// Server-side count of a filtered query, without fetching documents.
    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64>;
}

/// The signed-in identity as the auth backend reports it, before the
/// profile document has been consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthIdentity {
    /// Identity id
    pub uid: String,
    /// Email the identity was created with
    pub email: String,
    /// Display name, when the backend has one
    pub display_name: Option<String>,
}

/// Identity-change notification from the auth backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// An identity signed in
    SignedIn(AuthIdentity),
    /// The current identity signed out
    SignedOut,
}

/// Identity store consumed by the client.
#[async_trait]
pub trait AuthStore: Send + Sync {
    /// Sign in with an email/password credential.
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthIdentity>;

    /// Create a new identity with an email/password credential and sign
    /// it in.
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthIdentity>;

    /// Sign out the current identity.
    async fn sign_out(&self) -> Result<()>;

    /// The currently signed-in identity, if any.
    async fn current_identity(&self) -> Option<AuthIdentity>;

    /// Subscribe to identity-change notifications.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}
