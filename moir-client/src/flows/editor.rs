//! Entry editor with debounced autosave
//!
//! A draft starts unpersisted: nothing autosaves until the first explicit
//! save has created the record and assigned an identifier, after which
//! the caller rewrites the navigable location in place. From then on,
//! content changes arm the autosave debouncer and each quiet period
//! triggers exactly one update. Manual save and in-flight autosave are
//! not coordinated beyond last-write-wins at the store.

use super::Debouncer;
use crate::{errors::Result, journal::JournalClient, types::EntryDraft};
use chrono::NaiveDate;
use tokio::time::Instant;
use tracing::debug;

/// What an explicit save did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// First save created the record; the caller should update the
    /// address bar in place with the new id.
    Created {
        /// Store-assigned identifier
        id: String,
    },
    /// An existing record was updated
    Updated,
}

/// Controller for one entry draft.
#[derive(Debug)]
pub struct EntryEditor {
    id: Option<String>,
    draft: EntryDraft,
    autosave: Debouncer,
    dirty: bool,
}

impl EntryEditor {
    /// Start editing a new, unpersisted draft.
    pub fn new(draft: EntryDraft, journal: &JournalClient) -> Self {
        Self {
            id: None,
            draft,
            autosave: Debouncer::new(journal.config().autosave_debounce),
            dirty: false,
        }
    }

    /// Start editing an existing entry.
    pub fn for_entry(entry: &crate::types::Entry, journal: &JournalClient) -> Self {
        Self {
            id: Some(entry.id.clone()),
            draft: EntryDraft {
                title: entry.title.clone(),
                content: entry.content.clone(),
                entry_date: entry.entry_date,
                notebook_id: entry.notebook_id.clone(),
            },
            autosave: Debouncer::new(journal.config().autosave_debounce),
            dirty: false,
        }
    }

    /// The persisted identifier, once the first save assigned one.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The current draft.
    pub fn draft(&self) -> &EntryDraft {
        &self.draft
    }

    /// Whether edits exist that no save has picked up yet.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether an autosave is scheduled.
    pub fn autosave_armed(&self) -> bool {
        self.autosave.is_armed()
    }

    /// Words in the body, for the editor toolbar.
    pub fn word_count(&self) -> usize {
        self.draft
            .content
            .split_whitespace()
            .filter(|word| !word.is_empty())
            .count()
    }

    /// Update the body text. Content changes are what schedule autosave,
    /// and only once an identifier exists; before the first save there is
    /// nothing to update.
    pub fn set_content(&mut self, content: &str) {
        self.draft.content = content.to_string();
        self.dirty = true;
        if self.id.is_some() {
            self.autosave.poke();
        }
    }

    /// Update the title.
    pub fn set_title(&mut self, title: &str) {
        self.draft.title = title.to_string();
        self.dirty = true;
    }

    /// Re-date the entry.
    pub fn set_entry_date(&mut self, date: NaiveDate) {
        self.draft.entry_date = date;
        self.dirty = true;
    }

    /// Move the entry to another notebook.
    pub fn set_notebook(&mut self, notebook_id: &str) {
        self.draft.notebook_id = notebook_id.to_string();
        self.dirty = true;
    }

    /// Explicit save: create on first save, update afterwards. Cancels
    /// any pending autosave; the explicit write already carries the same
    /// fields.
    pub async fn save(&mut self, journal: &JournalClient) -> Result<SaveOutcome> {
        self.autosave.cancel();
        let outcome = match &self.id {
            None => {
                let id = journal.create_entry(&self.draft).await?;
                self.id = Some(id.clone());
                SaveOutcome::Created { id }
            }
            Some(id) => {
                journal.update_entry(id, &self.draft).await?;
                SaveOutcome::Updated
            }
        };
        self.dirty = false;
        Ok(outcome)
    }

    /// Run the autosave if its quiet period has elapsed. Returns whether
    /// a save happened. A draft without an identifier never autosaves.
    pub async fn autosave_if_due(
        &mut self,
        journal: &JournalClient,
        now: Instant,
    ) -> Result<bool> {
        let Some(id) = self.id.clone() else {
            return Ok(false);
        };
        if !self.autosave.fire_if_due(now) {
            return Ok(false);
        }
        debug!(entry = %id, "autosaving");
        journal.update_entry(&id, &self.draft).await?;
        self.dirty = false;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::MoirConfig,
        types::NotebookDraft,
    };
    use std::time::Duration;
    use tokio::time::{self, Instant};

    async fn editor_fixture() -> (JournalClient, EntryEditor) {
        let (journal, _store) = JournalClient::in_memory(MoirConfig::default());
        journal
            .session()
            .register("ada", "ada@example.com", "pw")
            .await
            .unwrap();
        let notebook = journal
            .create_notebook(&NotebookDraft::new("Journal"))
            .await
            .unwrap();
        let draft = EntryDraft::new("2024-03-01".parse().unwrap(), notebook.id);
        let editor = EntryEditor::new(draft, &journal);
        (journal, editor)
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_autosave_before_first_save() {
        let (journal, mut editor) = editor_fixture().await;
        editor.set_content("typed before any save");
        assert!(!editor.autosave_armed());

        time::advance(Duration::from_secs(10)).await;
        let fired = editor.autosave_if_due(&journal, Instant::now()).await.unwrap();
        assert!(!fired);
        assert!(journal.entries().await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_save_creates_then_autosave_updates() {
        let (journal, mut editor) = editor_fixture().await;
        editor.set_content("first words");
        let outcome = editor.save(&journal).await.unwrap();
        let id = match outcome {
            SaveOutcome::Created { ref id } => id.clone(),
            SaveOutcome::Updated => panic!("expected creation"),
        };
        assert_eq!(editor.id(), Some(id.as_str()));

        editor.set_content("first words, revised");
        assert!(editor.autosave_armed());
        time::advance(Duration::from_secs(2)).await;
        assert!(editor.autosave_if_due(&journal, Instant::now()).await.unwrap());
        // One update per quiet period.
        assert!(!editor.autosave_if_due(&journal, Instant::now()).await.unwrap());

        let entry = journal.entry(&id).await.unwrap();
        assert_eq!(entry.content, "first words, revised");
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_keeps_postponing_autosave() {
        let (journal, mut editor) = editor_fixture().await;
        editor.set_content("draft");
        editor.save(&journal).await.unwrap();

        editor.set_content("draft a");
        time::advance(Duration::from_secs(1)).await;
        editor.set_content("draft ab");
        time::advance(Duration::from_secs(1)).await;
        // Two seconds total, but only one since the last keystroke.
        assert!(!editor.autosave_if_due(&journal, Instant::now()).await.unwrap());
        time::advance(Duration::from_secs(1)).await;
        assert!(editor.autosave_if_due(&journal, Instant::now()).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_save_cancels_pending_autosave() {
        let (journal, mut editor) = editor_fixture().await;
        editor.set_content("draft");
        editor.save(&journal).await.unwrap();

        editor.set_content("draft, more");
        assert!(editor.autosave_armed());
        assert!(matches!(
            editor.save(&journal).await.unwrap(),
            SaveOutcome::Updated
        ));
        assert!(!editor.autosave_armed());
        time::advance(Duration::from_secs(5)).await;
        assert!(!editor.autosave_if_due(&journal, Instant::now()).await.unwrap());
    }

    #[tokio::test]
    async fn test_word_count() {
        let (journal, mut editor) = editor_fixture().await;
        assert_eq!(editor.word_count(), 0);
        editor.set_content("  three  little words \n");
        assert_eq!(editor.word_count(), 3);
        let _ = journal;
    }
}
