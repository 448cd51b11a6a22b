use rusqlite::{Connection, OptionalExtension, Result};

use crate::types::ConversationBinding;

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS conversation_bindings (
            tenant_id       TEXT NOT NULL,
            external_id     TEXT NOT NULL,
            chat_session_id TEXT,
            paused          INTEGER NOT NULL DEFAULT 0,
            updated_at      TEXT NOT NULL,
            UNIQUE(tenant_id, external_id)
        );
        CREATE INDEX IF NOT EXISTS idx_bindings_lookup
            ON conversation_bindings (tenant_id, external_id);",
    )
}

fn row_to_binding(row: &rusqlite::Row<'_>) -> rusqlite::Result<ConversationBinding> {
    Ok(ConversationBinding {
        tenant_id: row.get(0)?,
        external_id: row.get(1)?,
        chat_session_id: row.get(2)?,
        paused: row.get::<_, i64>(3)? != 0,
        updated_at: row.get(4)?,
    })
}

const BINDING_SELECT_SQL: &str =
    "SELECT tenant_id, external_id, chat_session_id, paused, updated_at FROM conversation_bindings";

pub fn find(conn: &Connection, tenant_id: &str, external_id: &str) -> Result<Option<ConversationBinding>> {
    let sql = format!("{} WHERE tenant_id = ?1 AND external_id = ?2", BINDING_SELECT_SQL);
    conn.query_row(&sql, rusqlite::params![tenant_id, external_id], row_to_binding)
        .optional()
}

/// Idempotent insert relying on the UNIQUE(tenant_id, external_id) index —
/// a concurrent duplicate insert is silently ignored, the read-back that
/// follows always sees a single authoritative row.
pub fn get_or_create(conn: &Connection, tenant_id: &str, external_id: &str) -> Result<ConversationBinding> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT OR IGNORE INTO conversation_bindings (tenant_id, external_id, chat_session_id, paused, updated_at)
         VALUES (?1, ?2, NULL, 0, ?3)",
        rusqlite::params![tenant_id, external_id, now],
    )?;
    find(conn, tenant_id, external_id)?.ok_or_else(|| rusqlite::Error::QueryReturnedNoRows)
}

pub fn set_paused(conn: &Connection, tenant_id: &str, external_id: &str, paused: bool) -> Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "UPDATE conversation_bindings SET paused = ?3, updated_at = ?4
         WHERE tenant_id = ?1 AND external_id = ?2",
        rusqlite::params![tenant_id, external_id, paused as i64, now],
    )?;
    Ok(())
}

pub fn set_chat_session(conn: &Connection, tenant_id: &str, external_id: &str, chat_session_id: &str) -> Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "UPDATE conversation_bindings SET chat_session_id = ?3, updated_at = ?4
         WHERE tenant_id = ?1 AND external_id = ?2",
        rusqlite::params![tenant_id, external_id, chat_session_id, now],
    )?;
    Ok(())
}

pub fn clear_chat_session(conn: &Connection, tenant_id: &str, external_id: &str) -> Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "UPDATE conversation_bindings SET chat_session_id = NULL, updated_at = ?3
         WHERE tenant_id = ?1 AND external_id = ?2",
        rusqlite::params![tenant_id, external_id, now],
    )?;
    Ok(())
}
