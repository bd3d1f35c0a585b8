//! Thought-dump flow
//!
//! Guides free-form venting into a single problem/action pair:
//! `Dump -> Compress -> Success`, with a read-only `Archive` view
//! reachable from `Dump`. Persistence errors surface inline on the
//! compress step without discarding the entered text, so the user can
//! resubmit.

use crate::{
    errors::{MoirError, Result},
    journal::JournalClient,
};
use std::time::Duration;
use tracing::debug;

/// States of the thought-dump flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThoughtDumpState {
    /// Free-text venting
    Dump,
    /// Compressing the dump into a problem/action pair
    Compress,
    /// Saved; auto-navigates to the dashboard after a fixed delay
    Success,
    /// Read-only archive of past dumps
    Archive,
}

/// Controller for the thought-dump flow.
#[derive(Debug)]
pub struct ThoughtDumpFlow {
    state: ThoughtDumpState,
    dump_text: String,
    problem: String,
    action: String,
    error: Option<String>,
}

impl ThoughtDumpFlow {
    /// Start a new flow on the dump step.
    pub fn new() -> Self {
        Self {
            state: ThoughtDumpState::Dump,
            dump_text: String::new(),
            problem: String::new(),
            action: String::new(),
            error: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> ThoughtDumpState {
        self.state
    }

    /// The dump text captured on the first step.
    pub fn dump_text(&self) -> &str {
        &self.dump_text
    }

    /// Problem statement entered on the compress step.
    pub fn problem(&self) -> &str {
        &self.problem
    }

    /// Action statement entered on the compress step.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Inline persistence error from the last submission, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Submit the dump text, advancing to the compress step. Blank text
    /// stays on the dump step.
    pub fn submit_dump(&mut self, text: &str) -> Result<()> {
        if self.state != ThoughtDumpState::Dump {
            return Err(MoirError::invalid_state("dump text accepted only on the dump step"));
        }
        if text.trim().is_empty() {
            return Err(MoirError::empty_field("dump"));
        }
        self.dump_text = text.to_string();
        self.state = ThoughtDumpState::Compress;
        Ok(())
    }

    /// Update the problem statement.
    pub fn set_problem(&mut self, problem: &str) {
        self.problem = problem.to_string();
    }

    /// Update the action statement.
    pub fn set_action(&mut self, action: &str) {
        self.action = action.to_string();
    }

    /// Whether the compress form is submittable: both fields non-empty
    /// and within the character cap.
    pub fn can_submit(&self, max_len: usize) -> bool {
        let ok = |field: &str| !field.trim().is_empty() && field.chars().count() <= max_len;
        self.state == ThoughtDumpState::Compress && ok(&self.problem) && ok(&self.action)
    }

    /// Persist the compressed pair, advancing to the success step. On
    /// failure the flow stays on compress with the entered text intact
    /// and an inline error set.
    pub async fn submit_compression(&mut self, journal: &JournalClient) -> Result<String> {
        if self.state != ThoughtDumpState::Compress {
            return Err(MoirError::invalid_state("nothing to submit outside the compress step"));
        }
        match journal
            .save_thought_dump(&self.dump_text, &self.problem, &self.action)
            .await
        {
            Ok(id) => {
                self.error = None;
                self.state = ThoughtDumpState::Success;
                Ok(id)
            }
            Err(err) => {
                debug!(%err, "compression submit failed, staying on compress");
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// How long the success screen lingers before auto-navigating to the
    /// dashboard.
    pub fn success_redirect_delay(&self, journal: &JournalClient) -> Duration {
        journal.config().success_redirect_delay
    }

    /// Leave the success screen and start a fresh dump.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Open the archive view from the dump step.
    pub fn open_archive(&mut self) -> Result<()> {
        if self.state != ThoughtDumpState::Dump {
            return Err(MoirError::invalid_state("archive opens from the dump step"));
        }
        self.state = ThoughtDumpState::Archive;
        Ok(())
    }

    /// Back-navigate from the archive to the dump step.
    pub fn close_archive(&mut self) -> Result<()> {
        if self.state != ThoughtDumpState::Archive {
            return Err(MoirError::invalid_state("not on the archive view"));
        }
        self.state = ThoughtDumpState::Dump;
        Ok(())
    }
}

impl Default for ThoughtDumpFlow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_dump_stays_put() {
        let mut flow = ThoughtDumpFlow::new();
        assert!(flow.submit_dump("   ").is_err());
        assert_eq!(flow.state(), ThoughtDumpState::Dump);
    }

    #[test]
    fn test_dump_advances_to_compress() {
        let mut flow = ThoughtDumpFlow::new();
        flow.submit_dump("I feel overwhelmed...").unwrap();
        assert_eq!(flow.state(), ThoughtDumpState::Compress);
        assert_eq!(flow.dump_text(), "I feel overwhelmed...");
    }

    #[test]
    fn test_can_submit_gating() {
        let mut flow = ThoughtDumpFlow::new();
        flow.submit_dump("venting").unwrap();
        assert!(!flow.can_submit(255));

        flow.set_problem("Too many tasks");
        assert!(!flow.can_submit(255));

        flow.set_action("Write a list");
        assert!(flow.can_submit(255));

        flow.set_action(&"x".repeat(256));
        assert!(!flow.can_submit(255));
    }

    #[test]
    fn test_archive_round_trip() {
        let mut flow = ThoughtDumpFlow::new();
        flow.open_archive().unwrap();
        assert_eq!(flow.state(), ThoughtDumpState::Archive);
        flow.close_archive().unwrap();
        assert_eq!(flow.state(), ThoughtDumpState::Dump);

        flow.submit_dump("text").unwrap();
        assert!(flow.open_archive().is_err());
    }
}
