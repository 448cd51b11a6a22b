use rusqlite::{Connection, Result};

/// Initialise all memory tables. Safe to call on every startup (idempotent).
pub fn init_db(conn: &Connection) -> Result<()> {
    create_documents_table(conn)?;
    create_documents_fts(conn)?;
    create_chat_tables(conn)?;
    create_query_cache_table(conn)?;
    Ok(())
}

fn create_documents_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS documents (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            tenant_id       TEXT NOT NULL,
            filename        TEXT NOT NULL,
            content         TEXT NOT NULL,
            embedding_json  TEXT NOT NULL,
            created_at      TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_documents_tenant
            ON documents(tenant_id);",
    )
}

/// FTS5 virtual table over `documents.content`. `content='documents'` makes
/// it an external-content table — rows are synced manually on write the way
/// skynet-memory's `user_memory_fts` is, since SQLite does not auto-sync
/// external-content FTS tables.
fn create_documents_fts(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE VIRTUAL TABLE IF NOT EXISTS documents_fts
            USING fts5(content, content='documents', content_rowid='id');",
    )
}

fn create_chat_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS chat_sessions (
            id          TEXT PRIMARY KEY NOT NULL,
            tenant_id   TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS chat_messages (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id  TEXT NOT NULL REFERENCES chat_sessions(id),
            role        TEXT NOT NULL,
            content     TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_chat_messages_session
            ON chat_messages(session_id, created_at);",
    )
}

fn create_query_cache_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS query_cache (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            tenant_id       TEXT NOT NULL,
            query_text      TEXT NOT NULL,
            embedding_json  TEXT NOT NULL,
            answer_text     TEXT NOT NULL,
            created_at      TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_query_cache_tenant
            ON query_cache(tenant_id);",
    )
}
