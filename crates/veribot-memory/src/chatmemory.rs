use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension};
use veribot_core::ChatSessionId;

use crate::error::{MemoryError, Result};
use crate::types::{ChatMessage, ChatRole};

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChatMessage> {
    let role_str: String = row.get(2)?;
    Ok(ChatMessage {
        id: row.get(0)?,
        session_id: row.get(1)?,
        role: role_str.parse().unwrap_or(ChatRole::User),
        content: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// RAG-side conversation memory: one `chat_sessions` row per live
/// conversation, with an append-only `chat_messages` log underneath.
/// Grounded on skynet-memory's `save_message`/`get_history`, including the
/// "query DESC then reverse in Rust" idiom for fetching the most recent N
/// messages in chronological order without a second sort.
pub struct ChatMemory {
    db: Mutex<Connection>,
}

impl ChatMemory {
    pub fn new(conn: Connection) -> Self {
        Self { db: Mutex::new(conn) }
    }

    pub fn create_session(&self, tenant_id: &str) -> Result<ChatSessionId> {
        let id = ChatSessionId::new();
        let now = chrono::Utc::now().to_rfc3339();
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO chat_sessions (id, tenant_id, created_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![id.as_str(), tenant_id, now],
        )?;
        Ok(id)
    }

    pub fn session_exists(&self, session_id: &str) -> Result<bool> {
        let db = self.db.lock().unwrap();
        let exists: Option<i64> = db
            .query_row(
                "SELECT 1 FROM chat_sessions WHERE id = ?1",
                [session_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(exists.is_some())
    }

    pub fn append(&self, session_id: &str, role: ChatRole, content: &str) -> Result<()> {
        if !self.session_exists(session_id)? {
            return Err(MemoryError::SessionNotFound(session_id.to_string()));
        }
        let now = chrono::Utc::now().to_rfc3339();
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO chat_messages (session_id, role, content, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![session_id, role.as_str(), content, now],
        )?;
        Ok(())
    }

    /// Most recent `limit` messages, oldest first — ready to render
    /// directly into a prompt's chat-history section.
    pub fn recent(&self, session_id: &str, limit: usize) -> Result<Vec<ChatMessage>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT id, session_id, role, content, created_at
             FROM chat_messages
             WHERE session_id = ?1
             ORDER BY created_at DESC, id DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(rusqlite::params![session_id, limit as i64], row_to_message)?;
        let mut msgs: Vec<_> = rows.filter_map(|r| r.ok()).collect();
        msgs.reverse();
        Ok(msgs)
    }

    pub fn all(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT id, session_id, role, content, created_at
             FROM chat_messages WHERE session_id = ?1 ORDER BY created_at ASC, id ASC",
        )?;
        let rows = stmt.query_map([session_id], row_to_message)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn delete_session(&self, session_id: &str) -> Result<()> {
        let db = self.db.lock().unwrap();
        db.execute("DELETE FROM chat_messages WHERE session_id = ?1", [session_id])?;
        db.execute("DELETE FROM chat_sessions WHERE id = ?1", [session_id])?;
        Ok(())
    }
}
