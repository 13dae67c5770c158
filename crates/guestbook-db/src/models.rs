/// Database row types — these map directly to SQLite rows.
/// Distinct from guestbook-types wire models to keep the DB layer independent.

pub struct UserRow {
    pub id: i64,
    pub username: String,
    /// Argon2 PHC string.
    pub password: String,
    pub is_admin: bool,
    pub is_banned: bool,
}

pub struct UserSummaryRow {
    pub username: String,
    pub is_banned: bool,
}

pub struct MessageRow {
    pub id: i64,
    pub author: String,
    pub content: String,
    pub timestamp: String,
    pub is_pinned: bool,
}

pub struct FileRow {
    pub id: i64,
    pub name: String,
    pub path: String,
    pub comment: Option<String>,
    pub upload_time: String,
}
