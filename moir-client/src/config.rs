//! Client configuration
//!
//! Tunables that recur across screens: debounce intervals, the weekly
//! digest window, collection names, and the notebook deletion policy.
//! Defaults reproduce the shipped application's behavior.

use std::time::Duration;

/// What deleting a notebook does with the entries still inside it.
///
/// The store itself enforces nothing, so the client has to pick a policy
/// or leave orphaned entries behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotebookDeletePolicy {
    /// Delete the notebook's entries along with the notebook
    #[default]
    Cascade,
    /// Refuse to delete while the notebook still contains entries
    Block,
}

/// Names of the remote collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionNames {
    /// Profile documents keyed by identity id
    pub users: String,
    /// Notebook documents
    pub notebooks: String,
    /// Entry documents
    pub entries: String,
    /// Thought dump documents
    pub thought_dumps: String,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            users: "users".into(),
            notebooks: "notebooks".into(),
            entries: "entries".into(),
            thought_dumps: "thought_dumps".into(),
        }
    }
}

/// Configuration for the Moir client core.
#[derive(Debug, Clone, PartialEq)]
pub struct MoirConfig {
    /// Quiet period before a search query is issued
    pub search_debounce: Duration,
    /// Quiet period before a persisted entry draft is autosaved
    pub autosave_debounce: Duration,
    /// How long the thought-dump success screen lingers before
    /// auto-navigating to the dashboard
    pub success_redirect_delay: Duration,
    /// Trailing window, in days, for weekly digest eligibility
    pub digest_window_days: u32,
    /// Minimum opted-in entries inside the window for the digest to render
    pub digest_min_entries: usize,
    /// How many recent entries the dashboard shows
    pub recent_entries_limit: usize,
    /// Character cap on the thought-dump problem and action fields
    pub compression_max_len: usize,
    /// Policy for entries left behind by a notebook deletion
    pub notebook_delete_policy: NotebookDeletePolicy,
    /// Remote collection names
    pub collections: CollectionNames,
}

impl Default for MoirConfig {
    fn default() -> Self {
        Self {
            search_debounce: Duration::from_millis(300),
            autosave_debounce: Duration::from_secs(2),
            success_redirect_delay: Duration::from_secs(2),
            digest_window_days: 7,
            digest_min_entries: 3,
            recent_entries_limit: 3,
            compression_max_len: 255,
            notebook_delete_policy: NotebookDeletePolicy::default(),
            collections: CollectionNames::default(),
        }
    }
}

impl MoirConfig {
    /// Creates a builder with default values.
    pub fn builder() -> MoirConfigBuilder {
        MoirConfigBuilder::new()
    }
}

/// Builder for [`MoirConfig`].
pub struct MoirConfigBuilder {
    config: MoirConfig,
}

impl MoirConfigBuilder {
    /// Creates a new builder with default config.
    pub fn new() -> Self {
        Self {
            config: MoirConfig::default(),
        }
    }

    /// Sets the search debounce interval.
    pub fn search_debounce(mut self, d: Duration) -> Self {
        self.config.search_debounce = d;
        self
    }

    /// Sets the autosave debounce interval.
    pub fn autosave_debounce(mut self, d: Duration) -> Self {
        self.config.autosave_debounce = d;
        self
    }

    /// Sets the success screen auto-redirect delay.
    pub fn success_redirect_delay(mut self, d: Duration) -> Self {
        self.config.success_redirect_delay = d;
        self
    }

    /// Sets the weekly digest trailing window in days.
    pub fn digest_window_days(mut self, days: u32) -> Self {
        self.config.digest_window_days = days;
        self
    }

    /// Sets the weekly digest entry threshold.
    pub fn digest_min_entries(mut self, min: usize) -> Self {
        self.config.digest_min_entries = min;
        self
    }

    /// Sets how many recent entries the dashboard shows.
    pub fn recent_entries_limit(mut self, limit: usize) -> Self {
        self.config.recent_entries_limit = limit;
        self
    }

    /// Sets the character cap on thought-dump compression fields.
    pub fn compression_max_len(mut self, max: usize) -> Self {
        self.config.compression_max_len = max;
        self
    }

    /// Sets the notebook deletion policy.
    pub fn notebook_delete_policy(mut self, policy: NotebookDeletePolicy) -> Self {
        self.config.notebook_delete_policy = policy;
        self
    }

    /// Sets the remote collection names.
    pub fn collections(mut self, names: CollectionNames) -> Self {
        self.config.collections = names;
        self
    }

    /// Builds the config.
    pub fn build(self) -> MoirConfig {
        self.config
    }
}

impl Default for MoirConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_shipped_behavior() {
        let config = MoirConfig::default();
        assert_eq!(config.search_debounce, Duration::from_millis(300));
        assert_eq!(config.autosave_debounce, Duration::from_secs(2));
        assert_eq!(config.success_redirect_delay, Duration::from_secs(2));
        assert_eq!(config.digest_window_days, 7);
        assert_eq!(config.digest_min_entries, 3);
        assert_eq!(config.recent_entries_limit, 3);
        assert_eq!(config.compression_max_len, 255);
        assert_eq!(
            config.notebook_delete_policy,
            NotebookDeletePolicy::Cascade
        );
        assert_eq!(config.collections.thought_dumps, "thought_dumps");
    }

    #[test]
    fn test_builder() {
        let config = MoirConfig::builder()
            .search_debounce(Duration::from_millis(100))
            .digest_min_entries(5)
            .notebook_delete_policy(NotebookDeletePolicy::Block)
            .build();
        assert_eq!(config.search_debounce, Duration::from_millis(100));
        assert_eq!(config.digest_min_entries, 5);
        assert_eq!(config.notebook_delete_policy, NotebookDeletePolicy::Block);
    }
}
