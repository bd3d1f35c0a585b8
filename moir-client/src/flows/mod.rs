//! Flow controllers
//!
//! Small finite-state sequences for the multi-step interactions: the
//! thought-dump funnel, the entry editor with debounced autosave, and the
//! debounced search input. Each controller owns its own state and talks
//! to the store only through [`crate::journal::JournalClient`].

mod debounce;
mod editor;
mod search;
mod thought_dump;

pub use debounce::Debouncer;
pub use editor::{EntryEditor, SaveOutcome};
pub use search::SearchController;
pub use thought_dump::{ThoughtDumpFlow, ThoughtDumpState};
