use std::sync::Mutex;

use rusqlite::Connection;

use crate::error::Result;
use crate::types::CachedQuery;
use crate::vector::{cosine_similarity, decode, encode};

/// Opt-in semantic cache: a tenant-scoped table of (query, answer) pairs,
/// reusable when a new query's embedding is close enough to a cached one.
/// Never consulted automatically by `RAGEngine::query` — callers opt in via
/// `TenantConfig.rag.semantic_cache`.
pub struct QueryCache {
    db: Mutex<Connection>,
}

impl QueryCache {
    pub fn new(conn: Connection) -> Self {
        Self { db: Mutex::new(conn) }
    }

    pub fn insert(&self, tenant_id: &str, query_text: &str, embedding: &[f32], answer_text: &str) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO query_cache (tenant_id, query_text, embedding_json, answer_text, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![tenant_id, query_text, encode(embedding), answer_text, now],
        )?;
        Ok(())
    }

    /// Return the best cached answer whose embedding's cosine similarity to
    /// `query_embedding` meets or exceeds `threshold`, if any.
    pub fn lookup(&self, tenant_id: &str, query_embedding: &[f32], threshold: f64) -> Result<Option<CachedQuery>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT id, tenant_id, query_text, embedding_json, answer_text, created_at
             FROM query_cache WHERE tenant_id = ?1",
        )?;
        let rows: Vec<CachedQuery> = stmt
            .query_map([tenant_id], |row| {
                let embedding_json: String = row.get(3)?;
                Ok(CachedQuery {
                    id: row.get(0)?,
                    tenant_id: row.get(1)?,
                    query_text: row.get(2)?,
                    embedding: decode(&embedding_json),
                    answer_text: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        let best = rows
            .into_iter()
            .map(|entry| {
                let sim = cosine_similarity(query_embedding, &entry.embedding);
                (sim, entry)
            })
            .filter(|(sim, _)| *sim >= threshold)
            .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

        Ok(best.map(|(_, entry)| entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_db(&conn).unwrap();
        conn
    }

    #[test]
    fn lookup_below_threshold_returns_none() {
        let cache = QueryCache::new(conn());
        cache.insert("t1", "hello", &[1.0, 0.0], "hi there").unwrap();
        let hit = cache.lookup("t1", &[0.0, 1.0], 0.9).unwrap();
        assert!(hit.is_none());
    }

    #[test]
    fn lookup_above_threshold_returns_entry() {
        let cache = QueryCache::new(conn());
        cache.insert("t1", "hello", &[1.0, 0.0], "hi there").unwrap();
        let hit = cache.lookup("t1", &[1.0, 0.0], 0.9).unwrap();
        assert_eq!(hit.unwrap().answer_text, "hi there");
    }
}
