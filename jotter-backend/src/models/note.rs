use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Note - the sole persisted resource.
///
/// `id` and `created_at` are assigned by the store on creation and never
/// change afterwards; `updated_at` is refreshed on every successful update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a note.
///
/// Fields default to empty strings so an absent field fails validation
/// the same way an empty one does, instead of dying in deserialization.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateNoteRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

/// Request to overwrite a note's title and content.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateNoteRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}
