//! Debounced search input
//!
//! Keystrokes restart a short quiet window; only the final query in the
//! window runs. Each run takes a fetch guard first, so a run that
//! completes after a newer query has started (or after the input was
//! cleared) throws its results away instead of clobbering the list.

use super::Debouncer;
use crate::{
    collections::FetchGuard,
    errors::Result,
    journal::JournalClient,
    types::Entry,
};
use tokio::time::Instant;
use tracing::debug;

/// Controller for the entry search box.
#[derive(Debug)]
pub struct SearchController {
    query: String,
    debouncer: Debouncer,
    has_searched: bool,
    results: Vec<Entry>,
}

impl SearchController {
    /// Create a controller with the journal's configured debounce.
    pub fn new(journal: &JournalClient) -> Self {
        Self {
            query: String::new(),
            debouncer: Debouncer::new(journal.config().search_debounce),
            has_searched: false,
            results: Vec::new(),
        }
    }

    /// The current query text.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Matches from the last completed run.
    pub fn results(&self) -> &[Entry] {
        &self.results
    }

    /// Whether at least one run has completed for the current query, so
    /// the caller can tell "no matches" apart from "not searched yet".
    pub fn has_searched(&self) -> bool {
        self.has_searched
    }

    /// Whether a run is scheduled.
    pub fn is_pending(&self) -> bool {
        self.debouncer.is_armed()
    }

    /// Update the query. Blank input clears results immediately and
    /// schedules nothing; anything else restarts the quiet window.
    pub fn set_query(&mut self, journal: &JournalClient, query: &str) {
        self.query = query.to_string();
        if self.query.trim().is_empty() {
            self.debouncer.cancel();
            self.results.clear();
            self.has_searched = false;
            // A clear also invalidates any run still in flight.
            journal.accessor().bump_epoch();
        } else {
            self.debouncer.poke();
        }
    }

    /// Run the search if the quiet window has elapsed. Returns whether a
    /// run completed and its results were applied.
    pub async fn run_if_due(&mut self, journal: &JournalClient, now: Instant) -> Result<bool> {
        if !self.debouncer.fire_if_due(now) {
            return Ok(false);
        }
        let guard = journal.accessor().guard();
        let query = self.query.clone();
        let hits = journal.search(&query).await?;
        self.apply(guard, query, hits)
    }

    fn apply(&mut self, guard: FetchGuard, query: String, hits: Vec<Entry>) -> Result<bool> {
        if !guard.is_current() || query != self.query {
            debug!(%query, "discarding stale search results");
            return Ok(false);
        }
        self.results = hits;
        self.has_searched = true;
        Ok(true)
    }
}
