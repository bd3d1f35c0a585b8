//! High-level journal client
//!
//! The facade screens talk to: it binds the session context and the
//! collection accessor together and exposes one method per screen-level
//! operation. Fetches are owner-scoped through the current session;
//! derivations delegate to [`crate::views`].

use crate::{
    collections::CollectionAccessor,
    config::{MoirConfig, NotebookDeletePolicy},
    errors::{MoirError, Result},
    session::SessionContext,
    store::{AuthStore, DocumentStore, Filter, MemoryStore, SortDirection, server_timestamp},
    types::{Entry, EntryDraft, Notebook, NotebookDraft, ThoughtDump, User},
    views::{self, DashboardStats, WeeklyDigest},
};
use chrono::{NaiveDate, Utc};
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Client for one user's journal: notebooks, entries, thought dumps, and
/// the derived dashboard/calendar/search/digest views.
pub struct JournalClient {
    session: Arc<SessionContext>,
    accessor: CollectionAccessor,
    config: MoirConfig,
}

impl JournalClient {
    /// Create a client over the two external backends.
    pub fn new(
        auth: Arc<dyn AuthStore>,
        store: Arc<dyn DocumentStore>,
        config: MoirConfig,
    ) -> Self {
        let session = Arc::new(SessionContext::new(
            auth,
            Arc::clone(&store),
            config.collections.clone(),
        ));
        let accessor = CollectionAccessor::new(store, config.collections.clone());
        Self {
            session,
            accessor,
            config,
        }
    }

    /// Create a client over a fresh in-memory backend, for tests and
    /// demos.
    pub fn in_memory(config: MoirConfig) -> (Self, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let client = Self::new(store.clone(), store.clone(), config);
        (client, store)
    }

    /// The session context.
    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    /// The collection accessor, exposed for epoch management.
    pub fn accessor(&self) -> &CollectionAccessor {
        &self.accessor
    }

    /// The client configuration.
    pub fn config(&self) -> &MoirConfig {
        &self.config
    }

    /// The signed-in user, or [`MoirError::NotSignedIn`].
    pub async fn owner(&self) -> Result<User> {
        self.session.current_user().await.ok_or(MoirError::NotSignedIn)
    }

    // --- Notebooks ---

    /// The owner's notebooks, sorted by name.
    pub async fn notebooks(&self) -> Result<Vec<Notebook>> {
        let owner = self.owner().await?;
        let mut notebooks: Vec<Notebook> = self.accessor.list_owned(&owner.id).await?;
        notebooks.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(notebooks)
    }

    /// The notebook new drafts default into: the first of the owner's
    /// notebooks, when any exist.
    pub async fn default_notebook(&self) -> Result<Option<Notebook>> {
        Ok(self.notebooks().await?.into_iter().next())
    }

    /// Get one notebook by id, owner-checked.
    pub async fn notebook(&self, id: &str) -> Result<Notebook> {
        let owner = self.owner().await?;
        let notebook: Notebook = self.accessor.get(id).await?;
        if notebook.user_id != owner.id {
            return Err(MoirError::not_found(&self.config.collections.notebooks, id));
        }
        Ok(notebook)
    }

    /// Create a notebook from a draft.
    pub async fn create_notebook(&self, draft: &NotebookDraft) -> Result<Notebook> {
        let owner = self.owner().await?;
        if draft.name.trim().is_empty() {
            return Err(MoirError::empty_field("name"));
        }
        let id = self
            .accessor
            .create::<Notebook>(draft.to_fields(&owner.id))
            .await?;
        info!(notebook = %id, "notebook created");
        Ok(Notebook {
            id,
            user_id: owner.id,
            name: draft.name.clone(),
            description: draft.description.clone(),
            color_theme: draft.color_theme.clone(),
            include_in_weekly_digest: draft.include_in_weekly_digest,
        })
    }

    /// Update a notebook's editable fields.
    pub async fn update_notebook(&self, id: &str, draft: &NotebookDraft) -> Result<()> {
        let owner = self.owner().await?;
        if draft.name.trim().is_empty() {
            return Err(MoirError::empty_field("name"));
        }
        self.accessor
            .update::<Notebook>(id, draft.to_fields(&owner.id))
            .await
    }

    /// Delete a notebook, applying the configured policy to the entries
    /// still inside it.
    pub async fn delete_notebook(&self, id: &str) -> Result<()> {
        let owner = self.owner().await?;
        let filter = Filter::owner(&owner.id).with_eq("notebookId", json!(id));
        let entries: Vec<Entry> = self.accessor.list_with(filter).await?;

        match self.config.notebook_delete_policy {
            NotebookDeletePolicy::Block if !entries.is_empty() => {
                return Err(MoirError::NotebookNotEmpty {
                    id: id.to_string(),
                    entry_count: entries.len(),
                });
            }
            NotebookDeletePolicy::Cascade => {
                for entry in &entries {
                    self.accessor.delete::<Entry>(&entry.id).await?;
                }
                if !entries.is_empty() {
                    info!(notebook = %id, count = entries.len(), "cascade-deleted entries");
                }
            }
            NotebookDeletePolicy::Block => {}
        }

        self.accessor.delete::<Notebook>(id).await?;
        info!(notebook = %id, "notebook deleted");
        Ok(())
    }

    // --- Entries ---

    /// All of the owner's entries, recency ordered.
    pub async fn entries(&self) -> Result<Vec<Entry>> {
        let owner = self.owner().await?;
        let mut entries: Vec<Entry> = self.accessor.list_owned(&owner.id).await?;
        views::recency_sort(&mut entries);
        Ok(entries)
    }

    /// The entries of one notebook, recency ordered.
    pub async fn notebook_entries(&self, notebook_id: &str) -> Result<Vec<Entry>> {
        let owner = self.owner().await?;
        let filter = Filter::owner(&owner.id).with_eq("notebookId", json!(notebook_id));
        let mut entries: Vec<Entry> = self.accessor.list_with(filter).await?;
        views::recency_sort(&mut entries);
        Ok(entries)
    }

    /// Get one entry by id, owner-checked.
    pub async fn entry(&self, id: &str) -> Result<Entry> {
        let owner = self.owner().await?;
        let entry: Entry = self.accessor.get(id).await?;
        if entry.user_id != owner.id {
            return Err(MoirError::not_found(&self.config.collections.entries, id));
        }
        Ok(entry)
    }

    /// Create an entry from a draft; both timestamps are stamped by the
    /// store. Returns the assigned id.
    pub async fn create_entry(&self, draft: &EntryDraft) -> Result<String> {
        let owner = self.owner().await?;
        if draft.notebook_id.is_empty() {
            return Err(MoirError::empty_field("notebook"));
        }
        let mut fields = draft.to_fields(&owner.id);
        fields.insert("created_at".into(), server_timestamp());
        fields.insert("updated_at".into(), server_timestamp());
        let id = self.accessor.create::<Entry>(fields).await?;
        debug!(entry = %id, "entry created");
        Ok(id)
    }

    /// Save a draft over an existing entry, stamping the modification
    /// time. Applying the same draft twice yields the same record state
    /// aside from that stamp.
    pub async fn update_entry(&self, id: &str, draft: &EntryDraft) -> Result<()> {
        let owner = self.owner().await?;
        let mut patch = draft.to_fields(&owner.id);
        patch.insert("updated_at".into(), server_timestamp());
        self.accessor.update::<Entry>(id, patch).await?;
        debug!(entry = %id, "entry saved");
        Ok(())
    }

    /// Delete an entry, returning the removed record so an optimistic
    /// caller can restore its local list if a later step fails.
    pub async fn delete_entry(&self, id: &str) -> Result<Entry> {
        let entry = self.entry(id).await?;
        self.accessor.delete::<Entry>(id).await?;
        info!(entry = %id, "entry deleted");
        Ok(entry)
    }

    // --- Derived views ---

    /// Dashboard stats as of today.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        self.dashboard_stats_at(Utc::now().date_naive()).await
    }

    /// Dashboard stats as of a given day. Counts use the store's
    /// server-side aggregation; the recent strip and the streak come from
    /// one owner-scoped fetch.
    pub async fn dashboard_stats_at(&self, today: NaiveDate) -> Result<DashboardStats> {
        let owner = self.owner().await?;
        let owner_filter = Filter::owner(&owner.id);
        let total_entries = self.accessor.count::<Entry>(&owner_filter).await?;
        let total_notebooks = self.accessor.count::<Notebook>(&owner_filter).await?;

        let entries: Vec<Entry> = self.accessor.list_owned(&owner.id).await?;
        let entry_dates: HashSet<NaiveDate> = entries.iter().map(|e| e.entry_date).collect();
        let writing_streak = views::writing_streak(&entry_dates, today);
        let recent_entries = views::most_recent(entries, self.config.recent_entries_limit);

        Ok(DashboardStats {
            total_entries,
            total_notebooks,
            writing_streak,
            recent_entries,
        })
    }

    /// Per-day entry counts for one month of the owner's calendar.
    pub async fn calendar(&self, year: i32, month: u32) -> Result<BTreeMap<NaiveDate, u32>> {
        let owner = self.owner().await?;
        let entries: Vec<Entry> = self.accessor.list_owned(&owner.id).await?;
        Ok(views::calendar_counts(year, month, &entries))
    }

    /// Case-insensitive substring search over the owner's entries,
    /// recency ordered. A blank query returns no results without
    /// fetching.
    pub async fn search(&self, query: &str) -> Result<Vec<Entry>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let owner = self.owner().await?;
        let entries: Vec<Entry> = self.accessor.list_owned(&owner.id).await?;
        Ok(views::search_entries(entries, query))
    }

    /// The weekly digest as of today.
    pub async fn weekly_digest(&self) -> Result<WeeklyDigest> {
        self.weekly_digest_at(Utc::now().date_naive()).await
    }

    /// The weekly digest as of a given day.
    pub async fn weekly_digest_at(&self, today: NaiveDate) -> Result<WeeklyDigest> {
        let owner = self.owner().await?;
        let notebooks: Vec<Notebook> = self.accessor.list_owned(&owner.id).await?;
        let entries: Vec<Entry> = self.accessor.list_owned(&owner.id).await?;
        Ok(views::weekly_digest(
            &notebooks,
            &entries,
            today,
            self.config.digest_window_days,
            self.config.digest_min_entries,
        ))
    }

    // --- Thought dumps ---

    /// The owner's thought-dump archive, newest first.
    pub async fn thought_dumps(&self) -> Result<Vec<ThoughtDump>> {
        let owner = self.owner().await?;
        let filter =
            Filter::owner(&owner.id).with_order("created_at", SortDirection::Descending);
        self.accessor.list_with(filter).await
    }

    /// The most recent thought dump, for the dashboard's latest-action
    /// widget.
    pub async fn latest_thought_dump(&self) -> Result<Option<ThoughtDump>> {
        Ok(self.thought_dumps().await?.into_iter().next())
    }

    /// Persist a compressed thought dump. Problem and action must be
    /// non-empty and within the configured character cap.
    pub async fn save_thought_dump(
        &self,
        dump_text: &str,
        problem: &str,
        action: &str,
    ) -> Result<String> {
        let owner = self.owner().await?;
        validate_compression_field("problem", problem, self.config.compression_max_len)?;
        validate_compression_field("action", action, self.config.compression_max_len)?;

        let mut fields = crate::types::Fields::new();
        fields.insert("userId".into(), json!(owner.id));
        fields.insert("dump_text".into(), json!(dump_text));
        fields.insert("problem_text".into(), json!(problem));
        fields.insert("action_text".into(), json!(action));
        fields.insert("created_at".into(), server_timestamp());

        let id = self.accessor.create::<ThoughtDump>(fields).await;
        match id {
            Ok(id) => {
                info!(dump = %id, "thought dump archived");
                Ok(id)
            }
            Err(err) => {
                warn!(%err, "thought dump persistence failed");
                Err(err)
            }
        }
    }
}

fn validate_compression_field(name: &str, value: &str, max_len: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(MoirError::empty_field(name));
    }
    if value.chars().count() > max_len {
        return Err(MoirError::too_long(name, max_len));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    async fn signed_in_client() -> JournalClient {
        let (client, _store) = JournalClient::in_memory(MoirConfig::default());
        client
            .session()
            .register("ada", "ada@example.com", "hunter2")
            .await
            .unwrap();
        client
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_operations_require_session() {
        let (client, _store) = JournalClient::in_memory(MoirConfig::default());
        client.session().initialize().await.unwrap();
        assert!(matches!(
            client.notebooks().await.unwrap_err(),
            MoirError::NotSignedIn
        ));
    }

    #[tokio::test]
    async fn test_notebook_of_other_user_is_hidden() {
        let client = signed_in_client().await;
        let notebook = client
            .create_notebook(&NotebookDraft::new("Private"))
            .await
            .unwrap();

        client.session().logout().await.unwrap();
        client
            .session()
            .register("grace", "grace@example.com", "pw")
            .await
            .unwrap();

        let err = client.notebook(&notebook.id).await.unwrap_err();
        assert!(matches!(err, MoirError::NotFound { .. }));
        assert!(client.notebooks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_notebook_validates_name() {
        let client = signed_in_client().await;
        let err = client
            .create_notebook(&NotebookDraft::new("   "))
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_cascade_delete_removes_entries() {
        let client = signed_in_client().await;
        let notebook = client
            .create_notebook(&NotebookDraft::new("Doomed"))
            .await
            .unwrap();
        let keeper = client
            .create_notebook(&NotebookDraft::new("Keeper"))
            .await
            .unwrap();

        let draft = EntryDraft::new(date("2024-03-01"), notebook.id.clone());
        client.create_entry(&draft).await.unwrap();
        let kept = client
            .create_entry(&EntryDraft::new(date("2024-03-02"), keeper.id.clone()))
            .await
            .unwrap();

        client.delete_notebook(&notebook.id).await.unwrap();

        let remaining = client.entries().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, kept);
    }

    #[tokio::test]
    async fn test_block_delete_refuses_nonempty_notebook() {
        let config = MoirConfig::builder()
            .notebook_delete_policy(NotebookDeletePolicy::Block)
            .build();
        let (client, _store) = JournalClient::in_memory(config);
        client
            .session()
            .register("ada", "ada@example.com", "pw")
            .await
            .unwrap();

        let notebook = client
            .create_notebook(&NotebookDraft::new("Busy"))
            .await
            .unwrap();
        client
            .create_entry(&EntryDraft::new(date("2024-03-01"), notebook.id.clone()))
            .await
            .unwrap();

        let err = client.delete_notebook(&notebook.id).await.unwrap_err();
        assert!(matches!(err, MoirError::NotebookNotEmpty { entry_count: 1, .. }));

        // Empty notebooks still delete under Block.
        let empty = client
            .create_notebook(&NotebookDraft::new("Empty"))
            .await
            .unwrap();
        client.delete_notebook(&empty.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_entry_is_idempotent_apart_from_stamp() {
        let client = signed_in_client().await;
        let notebook = client
            .create_notebook(&NotebookDraft::new("Journal"))
            .await
            .unwrap();
        let mut draft = EntryDraft::new(date("2024-03-01"), notebook.id.clone());
        draft.content = "first".into();
        let id = client.create_entry(&draft).await.unwrap();

        draft.content = "revised".into();
        client.update_entry(&id, &draft).await.unwrap();
        let once = client.entry(&id).await.unwrap();
        client.update_entry(&id, &draft).await.unwrap();
        let twice = client.entry(&id).await.unwrap();

        assert_eq!(once.content, twice.content);
        assert_eq!(once.title, twice.title);
        assert_eq!(once.entry_date, twice.entry_date);
        assert_eq!(once.created_at, twice.created_at);
    }

    #[tokio::test]
    async fn test_delete_entry_returns_removed_record() {
        let client = signed_in_client().await;
        let notebook = client
            .create_notebook(&NotebookDraft::new("Journal"))
            .await
            .unwrap();
        let mut draft = EntryDraft::new(date("2024-03-01"), notebook.id.clone());
        draft.title = "Keep me around".into();
        let id = client.create_entry(&draft).await.unwrap();

        let removed = client.delete_entry(&id).await.unwrap();
        assert_eq!(removed.title, "Keep me around");
        assert!(matches!(
            client.entry(&id).await.unwrap_err(),
            MoirError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_dashboard_stats() {
        let client = signed_in_client().await;
        let notebook = client
            .create_notebook(&NotebookDraft::new("Journal"))
            .await
            .unwrap();
        for day in ["2024-03-08", "2024-03-09", "2024-03-10", "2024-03-01"] {
            client
                .create_entry(&EntryDraft::new(date(day), notebook.id.clone()))
                .await
                .unwrap();
        }

        let stats = client.dashboard_stats_at(date("2024-03-10")).await.unwrap();
        assert_eq!(stats.total_entries, 4);
        assert_eq!(stats.total_notebooks, 1);
        assert_eq!(stats.writing_streak, 3);
        assert_eq!(stats.recent_entries.len(), 3);
        assert_eq!(stats.recent_entries[0].entry_date, date("2024-03-10"));
    }

    #[tokio::test]
    async fn test_calendar_counts_scoped_to_month() {
        let client = signed_in_client().await;
        let notebook = client
            .create_notebook(&NotebookDraft::new("Journal"))
            .await
            .unwrap();
        for day in ["2024-03-05", "2024-03-05", "2024-04-01"] {
            client
                .create_entry(&EntryDraft::new(date(day), notebook.id.clone()))
                .await
                .unwrap();
        }

        let counts = client.calendar(2024, 3).await.unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[&date("2024-03-05")], 2);
    }

    #[tokio::test]
    async fn test_search_blank_query_is_empty() {
        let client = signed_in_client().await;
        assert!(client.search("   ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_thought_dump_archive_newest_first() {
        let client = signed_in_client().await;
        let first = client
            .save_thought_dump("dump one", "Problem one", "Action one")
            .await
            .unwrap();
        let second = client
            .save_thought_dump("dump two", "Problem two", "Action two")
            .await
            .unwrap();

        let dumps = client.thought_dumps().await.unwrap();
        assert_eq!(dumps.len(), 2);
        // Same-instant creations fall back to store order; both ids present.
        let ids: Vec<_> = dumps.iter().map(|d| d.id.as_str()).collect();
        assert!(ids.contains(&first.as_str()));
        assert!(ids.contains(&second.as_str()));

        let latest = client.latest_thought_dump().await.unwrap().unwrap();
        assert!([first.as_str(), second.as_str()].contains(&latest.id.as_str()));
    }

    #[tokio::test]
    async fn test_thought_dump_validation() {
        let client = signed_in_client().await;
        assert!(client
            .save_thought_dump("text", "  ", "Action")
            .await
            .unwrap_err()
            .is_validation());
        let long = "x".repeat(256);
        assert!(client
            .save_thought_dump("text", "Problem", &long)
            .await
            .unwrap_err()
            .is_validation());
    }
}
