//! Domain records for the Moir collections
//!
//! One struct per remote collection, decoded at the accessor boundary
//! instead of spreading loose document fields around. Wire field names
//! follow the documents the original backend already holds (`userId`,
//! `notebookId`, `include_in_weekly_summary`), so a reimplemented client
//! reads existing data unchanged.
//!
//! Identifiers are opaque strings assigned by the remote store; the client
//! never generates them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Raw field map of a store document, before typed decoding.
pub type Fields = Map<String, Value>;

/// Default notebook color theme, matching the app's sage palette.
pub const DEFAULT_COLOR_THEME: &str = "#9fb09f";

/// An authenticated user's profile.
///
/// Owned by the identity store; created at registration and mutated only
/// through explicit profile updates. The session layer can also construct
/// a minimal `User` from the auth record alone when the profile document
/// is missing or unreadable, so a UI is always renderable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Identity id assigned by the auth backend
    pub id: String,
    /// Display name
    pub username: String,
    /// Email address
    pub email: String,
    /// Optional given name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Optional occupation line shown on the profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    /// Optional avatar reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Partial update to a user profile.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UserPatch {
    /// New display name
    pub username: Option<String>,
    /// New given name
    pub first_name: Option<String>,
    /// New occupation line
    pub occupation: Option<String>,
    /// New avatar reference
    pub avatar: Option<String>,
}

impl UserPatch {
    /// Convert to store fields, skipping unset members.
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        if let Some(ref v) = self.username {
            fields.insert("username".into(), json!(v));
        }
        if let Some(ref v) = self.first_name {
            fields.insert("first_name".into(), json!(v));
        }
        if let Some(ref v) = self.occupation {
            fields.insert("occupation".into(), json!(v));
        }
        if let Some(ref v) = self.avatar {
            fields.insert("avatar".into(), json!(v));
        }
        fields
    }

    /// Apply the patch to an in-memory profile.
    pub fn apply(&self, user: &mut User) {
        if let Some(ref v) = self.username {
            user.username = v.clone();
        }
        if let Some(ref v) = self.first_name {
            user.first_name = Some(v.clone());
        }
        if let Some(ref v) = self.occupation {
            user.occupation = Some(v.clone());
        }
        if let Some(ref v) = self.avatar {
            user.avatar = Some(v.clone());
        }
    }
}

/// A notebook grouping entries, owned by exactly one user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    /// Store-assigned identifier
    pub id: String,
    /// Owner's identity id
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Notebook name
    pub name: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Color tag, hex string
    #[serde(default = "default_color_theme")]
    pub color_theme: String,
    /// Whether entries in this notebook feed the weekly digest
    #[serde(rename = "include_in_weekly_summary", default)]
    pub include_in_weekly_digest: bool,
}

fn default_color_theme() -> String {
    DEFAULT_COLOR_THEME.to_string()
}

/// Fields for creating or editing a notebook.
#[derive(Clone, Debug, PartialEq)]
pub struct NotebookDraft {
    /// Notebook name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Color tag, hex string
    pub color_theme: String,
    /// Weekly digest opt-in
    pub include_in_weekly_digest: bool,
}

impl NotebookDraft {
    /// Create a draft with the default color theme and digest opt-out.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            color_theme: DEFAULT_COLOR_THEME.to_string(),
            include_in_weekly_digest: false,
        }
    }

    /// Convert to store fields for the given owner.
    pub fn to_fields(&self, user_id: &str) -> Fields {
        let mut fields = Fields::new();
        fields.insert("userId".into(), json!(user_id));
        fields.insert("name".into(), json!(self.name));
        if let Some(ref d) = self.description {
            fields.insert("description".into(), json!(d));
        }
        fields.insert("color_theme".into(), json!(self.color_theme));
        fields.insert(
            "include_in_weekly_summary".into(),
            json!(self.include_in_weekly_digest),
        );
        fields
    }
}

/// Editable fields of an entry, before or between saves.
#[derive(Clone, Debug, PartialEq)]
pub struct EntryDraft {
    /// Optional title
    pub title: String,
    /// Body text
    pub content: String,
    /// Calendar date the entry is filed under
    pub entry_date: NaiveDate,
    /// Owning notebook id
    pub notebook_id: String,
}

impl EntryDraft {
    /// Create an empty draft dated `entry_date` in the given notebook.
    pub fn new(entry_date: NaiveDate, notebook_id: impl Into<String>) -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            entry_date,
            notebook_id: notebook_id.into(),
        }
    }

    /// Convert to store fields for the given owner. Timestamps are added
    /// by the caller, which knows whether this is a create or an update.
    pub fn to_fields(&self, user_id: &str) -> Fields {
        let mut fields = Fields::new();
        fields.insert("userId".into(), json!(user_id));
        fields.insert("title".into(), json!(self.title));
        fields.insert("content".into(), json!(self.content));
        fields.insert("entry_date".into(), json!(self.entry_date));
        fields.insert("notebookId".into(), json!(self.notebook_id));
        fields
    }
}

/// A dated journal entry belonging to one notebook and one user.
///
/// `entry_date` is a plain calendar date used for grouping and sorting,
/// distinct from `created_at`, which tie-breaks recency ordering.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Store-assigned identifier
    pub id: String,
    /// Owner's identity id
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Owning notebook id
    #[serde(rename = "notebookId")]
    pub notebook_id: String,
    /// Optional title
    #[serde(default)]
    pub title: String,
    /// Body text
    #[serde(default)]
    pub content: String,
    /// Calendar date the entry is filed under
    pub entry_date: NaiveDate,
    /// Creation timestamp, stamped by the store
    pub created_at: DateTime<Utc>,
    /// Last-modified timestamp, stamped on every save
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entry {
    /// Timestamp shown when viewing the entry: last modification if one
    /// was recorded, otherwise creation.
    pub fn display_timestamp(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }
}

/// A compressed thought dump: free-form venting reduced to one
/// problem/action pair. Immutable after creation; the archive is
/// append-only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThoughtDump {
    /// Store-assigned identifier
    pub id: String,
    /// Owner's identity id
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Raw dump text as entered
    pub dump_text: String,
    /// Derived problem statement
    pub problem_text: String,
    /// Derived action statement
    pub action_text: String,
    /// Creation timestamp, stamped by the store
    pub created_at: DateTime<Utc>,
}
