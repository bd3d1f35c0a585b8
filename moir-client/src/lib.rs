//! # Moir client core
//!
//! The backend-agnostic core of the Moir journaling app: session and
//! profile management, user-scoped access to notebooks, entries, and
//! thought dumps in a remote document store, pure view derivations for
//! the dashboard, calendar, search, and weekly digest, and flow
//! controllers for the multi-step interactions.
//!
//! ## Features
//!
//! - **Pluggable storage**: a [`store::DocumentStore`] / [`store::AuthStore`]
//!   seam with an in-memory implementation for tests and offline demos
//! - **Owner scoping**: every read and write is filtered to the signed-in
//!   user
//! - **Pure views**: recency lists, calendar counts, writing streak,
//!   highlighting, and digest eligibility as plain functions over fetched
//!   data
//! - **Flow controllers**: thought-dump funnel, entry editor with
//!   debounced autosave, debounced search
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use moir_client::{JournalClient, MoirConfig, NotebookDraft, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let (journal, _store) = JournalClient::in_memory(MoirConfig::default());
//!     journal.session().register("ada", "ada@example.com", "hunter2").await?;
//!
//!     let notebook = journal.create_notebook(&NotebookDraft::new("Daily")).await?;
//!     println!("created notebook {}", notebook.id);
//!
//!     let stats = journal.dashboard_stats().await?;
//!     println!("{} entries, {}-day streak", stats.total_entries, stats.writing_streak);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod collections;
pub mod config;
mod errors;
pub mod flows;
mod journal;
pub mod session;
/// Document and auth store abstractions, plus the in-memory backend
pub mod store;
mod types;
pub mod views;

pub use collections::{CollectionAccessor, FetchGuard, Record};
pub use config::{CollectionNames, MoirConfig, MoirConfigBuilder, NotebookDeletePolicy};
pub use errors::{MoirError, Result};
pub use flows::{
    Debouncer, EntryEditor, SaveOutcome, SearchController, ThoughtDumpFlow, ThoughtDumpState,
};
pub use journal::JournalClient;
pub use session::{SessionContext, SessionEvent, SessionState};
pub use store::{
    AuthEvent, AuthIdentity, AuthStore, Document, DocumentStore, Filter, MemoryStore,
    SortDirection,
};
pub use types::{
    DEFAULT_COLOR_THEME, Entry, EntryDraft, Fields, Notebook, NotebookDraft, ThoughtDump, User,
    UserPatch,
};
pub use views::{DashboardStats, TextSpan, WeeklyDigest};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Entry, EntryDraft, JournalClient, MoirConfig, MoirError, Notebook, NotebookDraft, Result,
        SessionContext, ThoughtDump, User,
    };
}
