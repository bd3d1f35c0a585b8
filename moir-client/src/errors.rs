//! Error types for the Moir client core
//!
//! One taxonomy covers the whole crate: authentication failures surface
//! inline on the login/register forms, fetch failures degrade to an empty
//! or previously-known view state, write failures surface at the point of
//! action, and validation failures are caught before a submission is
//! enabled. Nothing in this crate retries automatically; every retry is a
//! user-initiated resubmission.

use thiserror::Error;

/// Main error type for the Moir client core
#[derive(Error, Debug)]
pub enum MoirError {
    /// Email/password pair was rejected by the identity store
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// An identity already exists for this email address
    #[error("An account with email {email} already exists")]
    DuplicateRegistration {
        /// Email that collided with an existing identity
        email: String,
    },

    /// An operation that needs an authenticated user ran without one
    #[error("Not signed in")]
    NotSignedIn,

    /// Network or permission failure while reading from the document store
    #[error("Failed to fetch from {collection}: {message}")]
    Fetch {
        /// Collection that was being read
        collection: String,
        /// Failure description from the store
        message: String,
    },

    /// A by-id lookup found nothing
    #[error("Document not found in {collection}: {id}")]
    NotFound {
        /// Collection that was searched
        collection: String,
        /// Identifier that matched no document
        id: String,
    },

    /// Network or permission failure while writing to the document store
    #[error("Failed to write to {collection}: {message}")]
    Write {
        /// Collection that was being written
        collection: String,
        /// Failure description from the store
        message: String,
    },

    /// A fetched document did not match the collection's schema
    #[error("Failed to decode document {id} from {collection}")]
    Decode {
        /// Collection the document came from
        collection: String,
        /// Identifier of the malformed document
        id: String,
        /// Underlying decoding error
        #[source]
        source: serde_json::Error,
    },

    /// Client-side validation rejected the input before submission
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Field that failed validation
        field: String,
        /// What was wrong with it
        message: String,
    },

    /// A flow was driven through a transition its current state forbids
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Description of the misuse
        message: String,
    },

    /// Deletion was refused because the notebook still contains entries
    #[error("Notebook {id} still contains {entry_count} entries")]
    NotebookNotEmpty {
        /// Notebook that was to be deleted
        id: String,
        /// How many entries still reference it
        entry_count: usize,
    },
}

/// Result type alias for Moir client operations
pub type Result<T> = std::result::Result<T, MoirError>;

impl MoirError {
    /// Create a new Fetch error
    pub fn fetch(collection: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            collection: collection.into(),
            message: message.into(),
        }
    }

    /// Create a new NotFound error
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Create a new Write error
    pub fn write(collection: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Write {
            collection: collection.into(),
            message: message.into(),
        }
    }

    /// Create a Validation error for a required field left empty
    pub fn empty_field(field: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: "must not be empty".into(),
        }
    }

    /// Create a Validation error for an over-length field
    pub fn too_long(field: impl Into<String>, max: usize) -> Self {
        Self::Validation {
            field: field.into(),
            message: format!("must be at most {max} characters"),
        }
    }

    /// Create a new InvalidState error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Check if the error belongs on the login/register form
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials | Self::DuplicateRegistration { .. } | Self::NotSignedIn
        )
    }

    /// Check if the error is a client-side validation failure
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if the caller can recover by showing a cached or empty state
    ///
    /// Fetch failures on non-critical paths fall back to whatever the view
    /// already had. By-id lookups and writes are not recoverable this way.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MoirError::DuplicateRegistration {
            email: "ada@example.com".to_string(),
        };
        assert!(err.to_string().contains("ada@example.com"));

        let err = MoirError::fetch("entries", "connection reset");
        assert_eq!(
            err.to_string(),
            "Failed to fetch from entries: connection reset"
        );
    }

    #[test]
    fn test_is_auth() {
        assert!(MoirError::InvalidCredentials.is_auth());
        assert!(MoirError::NotSignedIn.is_auth());
        assert!(!MoirError::fetch("entries", "boom").is_auth());
    }

    #[test]
    fn test_is_recoverable() {
        assert!(MoirError::fetch("notebooks", "offline").is_recoverable());
        assert!(!MoirError::not_found("entries", "e1").is_recoverable());
        assert!(!MoirError::write("entries", "offline").is_recoverable());
    }

    #[test]
    fn test_validation_helpers() {
        let err = MoirError::empty_field("problem");
        assert!(err.is_validation());
        assert!(err.to_string().contains("problem"));

        let err = MoirError::too_long("action", 255);
        assert!(err.to_string().contains("255"));
    }
}
