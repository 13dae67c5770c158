use crate::Database;
use crate::models::{FileRow, MessageRow, UserRow, UserSummaryRow};
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Users --

    /// Insert a user unless the username is taken. Returns whether a row was inserted.
    pub fn create_user_if_absent(
        &self,
        username: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO users (username, password, is_admin) VALUES (?1, ?2, ?3)",
                rusqlite::params![username, password_hash, is_admin],
            )?;
            Ok(inserted > 0)
        })
    }

    /// Insert a regular user. Fails with a unique violation if the username exists.
    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, password) VALUES (?1, ?2)",
                (username, password_hash),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    pub fn list_non_admin_users(&self) -> Result<Vec<UserSummaryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT username, is_banned FROM users WHERE is_admin = 0 ORDER BY id")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(UserSummaryRow {
                        username: row.get(0)?,
                        is_banned: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn set_user_banned(&self, username: &str, banned: bool) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET is_banned = ?1 WHERE username = ?2",
                rusqlite::params![banned, username],
            )?;
            Ok(())
        })
    }

    pub fn delete_user(&self, username: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM users WHERE username = ?1", [username])?;
            Ok(())
        })
    }

    // -- Messages --

    pub fn insert_message(&self, author: &str, content: &str, timestamp: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (author, content, timestamp) VALUES (?1, ?2, ?3)",
                (author, content, timestamp),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// All messages, newest id first. Pinned messages are flagged, not reordered.
    pub fn list_messages(&self) -> Result<Vec<MessageRow>> {
        self.with_conn(query_messages)
    }

    pub fn delete_message(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM messages WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    /// Flip the pin flag. Touches nothing if the id does not exist.
    pub fn toggle_message_pin(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE messages SET is_pinned = 1 - is_pinned WHERE id = ?1",
                [id],
            )?;
            Ok(())
        })
    }

    pub fn delete_messages_by_author(&self, author: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM messages WHERE author = ?1", [author])?;
            Ok(removed)
        })
    }

    // -- Files --

    pub fn insert_file(&self, name: &str, path: &str, upload_time: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO files (name, path, upload_time) VALUES (?1, ?2, ?3)",
                (name, path, upload_time),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn list_files(&self) -> Result<Vec<FileRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, path, comment, upload_time FROM files ORDER BY id DESC",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(FileRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        path: row.get(2)?,
                        comment: row.get(3)?,
                        upload_time: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_file_path(&self, id: i64) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row("SELECT path FROM files WHERE id = ?1", [id], |row| row.get(0))
                .optional()
        })
    }

    pub fn delete_file(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM files WHERE id = ?1", [id])?;
            Ok(())
        })
    }
}

/// True when `err` was caused by a UNIQUE constraint violation.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<rusqlite::Error>(),
        Some(rusqlite::Error::SqliteFailure(e, _))
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, password, is_admin, is_banned FROM users WHERE username = ?1",
    )?;

    stmt.query_row([username], |row| {
        Ok(UserRow {
            id: row.get(0)?,
            username: row.get(1)?,
            password: row.get(2)?,
            is_admin: row.get(3)?,
            is_banned: row.get(4)?,
        })
    })
    .optional()
}

fn query_messages(conn: &Connection) -> Result<Vec<MessageRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, author, content, timestamp, is_pinned FROM messages ORDER BY id DESC",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok(MessageRow {
                id: row.get(0)?,
                author: row.get(1)?,
                content: row.get(2)?,
                timestamp: row.get(3)?,
                is_pinned: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
