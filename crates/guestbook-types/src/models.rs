use serde::{Deserialize, Serialize};

/// A guestbook entry as returned by `GET /api/messages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub author: String,
    pub content: String,
    /// Server-local time, formatted when the message was posted.
    pub timestamp: String,
    pub is_pinned: bool,
}

/// Metadata for an uploaded file. `path` is the public access path of the blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub id: i64,
    pub name: String,
    pub path: String,
    pub comment: Option<String>,
    pub upload_time: String,
}

/// A non-admin account as listed for moderation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub username: String,
    pub is_banned: bool,
}
