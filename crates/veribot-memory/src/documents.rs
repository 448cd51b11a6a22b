use std::sync::Mutex;

use rusqlite::Connection;
use tracing::debug;

use crate::error::Result;
use crate::types::{DocumentChunk, ScoredChunk};
use crate::vector::{cosine_similarity, decode, encode};

/// RRF smoothing constant. Matches the `1.0 / (rank + 60)` fusion formula
/// exactly.
const RRF_K: f64 = 60.0;

fn row_to_chunk(row: &rusqlite::Row<'_>) -> rusqlite::Result<DocumentChunk> {
    let embedding_json: String = row.get(4)?;
    Ok(DocumentChunk {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        filename: row.get(2)?,
        content: row.get(3)?,
        embedding: decode(&embedding_json),
        created_at: row.get(5)?,
    })
}

const CHUNK_SELECT_SQL: &str =
    "SELECT id, tenant_id, filename, content, embedding_json, created_at FROM documents";

/// Tenant-scoped store of embedded knowledge-base chunks, searchable by
/// vector similarity, FTS5 lexical match, or both fused with Reciprocal
/// Rank Fusion. Vector similarity is computed in Rust over a BLOB-encoded
/// embedding column rather than a vector extension, since SQLite has no
/// built-in pgvector equivalent.
pub struct DocumentStore {
    db: Mutex<Connection>,
}

impl DocumentStore {
    pub fn new(conn: Connection) -> Self {
        Self { db: Mutex::new(conn) }
    }

    pub fn insert_chunk(
        &self,
        tenant_id: &str,
        filename: &str,
        content: &str,
        embedding: &[f32],
    ) -> Result<i64> {
        let db = self.db.lock().unwrap();
        let now = chrono::Utc::now().to_rfc3339();
        db.execute(
            "INSERT INTO documents (tenant_id, filename, content, embedding_json, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![tenant_id, filename, content, encode(embedding), now],
        )?;
        let id = db.last_insert_rowid();
        db.execute(
            "INSERT INTO documents_fts(rowid, content) VALUES (?1, ?2)",
            rusqlite::params![id, content],
        )?;
        Ok(id)
    }

    /// Delete every chunk ingested under `filename` for the tenant, used
    /// when a document is re-uploaded or removed from the knowledge base.
    pub fn delete_by_filename(&self, tenant_id: &str, filename: &str) -> Result<usize> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT id FROM documents WHERE tenant_id = ?1 AND filename = ?2",
        )?;
        let ids: Vec<i64> = stmt
            .query_map(rusqlite::params![tenant_id, filename], |row| row.get(0))?
            .filter_map(|r| r.ok())
            .collect();
        drop(stmt);

        for id in &ids {
            db.execute(
                "INSERT INTO documents_fts(documents_fts, rowid, content)
                 SELECT 'delete', id, content FROM documents WHERE id = ?1",
                rusqlite::params![id],
            )?;
        }
        let deleted = db.execute(
            "DELETE FROM documents WHERE tenant_id = ?1 AND filename = ?2",
            rusqlite::params![tenant_id, filename],
        )?;
        Ok(deleted)
    }

    /// Hybrid retrieval: rank by embedding cosine similarity, rank by FTS5
    /// lexical match, and fuse with RRF (`1/(rank+60)` per side, summed).
    /// `candidate_limit` bounds how many rows each side contributes before
    /// fusion — callers widen it (e.g. 4x) when a rerank stage follows.
    pub fn hybrid_search(
        &self,
        tenant_id: &str,
        query_embedding: &[f32],
        query_text: &str,
        candidate_limit: usize,
    ) -> Result<Vec<ScoredChunk>> {
        let db = self.db.lock().unwrap();

        // Unlimited so ties can be broken below even for ids that only
        // ranked on the lexical side.
        let vector_scored = self.rank_by_vector(&db, tenant_id, query_embedding)?;
        let vector_similarity: std::collections::HashMap<i64, f64> = vector_scored.iter().cloned().collect();
        let lexical_ranked = self.rank_by_text(&db, tenant_id, query_text, candidate_limit)?;
        drop(db);

        let mut scores: std::collections::HashMap<i64, f64> = std::collections::HashMap::new();
        for (rank, (id, _similarity)) in vector_scored.iter().take(candidate_limit).enumerate() {
            *scores.entry(*id).or_insert(0.0) += 1.0 / (rank as f64 + 1.0 + RRF_K);
        }
        for (rank, id) in lexical_ranked.iter().enumerate() {
            *scores.entry(*id).or_insert(0.0) += 1.0 / (rank as f64 + 1.0 + RRF_K);
        }

        let mut fused: Vec<(i64, f64)> = scores.into_iter().collect();
        // Ties broken by vector distance ascending (similarity descending),
        // then by insertion order ascending (lower id = inserted earlier),
        // so equal-score rows come out in a deterministic order across runs.
        fused.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap()
                .then_with(|| {
                    let sim_a = vector_similarity.get(&a.0).copied().unwrap_or(f64::NEG_INFINITY);
                    let sim_b = vector_similarity.get(&b.0).copied().unwrap_or(f64::NEG_INFINITY);
                    sim_b.partial_cmp(&sim_a).unwrap()
                })
                .then_with(|| a.0.cmp(&b.0))
        });
        fused.truncate(candidate_limit);

        debug!(tenant_id, candidates = fused.len(), "hybrid search fused");

        let db = self.db.lock().unwrap();
        let mut results = Vec::with_capacity(fused.len());
        for (id, score) in fused {
            let sql = format!("{} WHERE id = ?1", CHUNK_SELECT_SQL);
            if let Ok(chunk) = db.query_row(&sql, [id], row_to_chunk) {
                results.push(ScoredChunk { chunk, score });
            }
        }
        Ok(results)
    }

    /// Rank every chunk for the tenant by cosine similarity to the query
    /// embedding, in process — no vector index, matching the "embeddings as
    /// JSON text, similarity in Rust" storage decision. Returns the full,
    /// unlimited ranking (descending similarity) so callers can use it both
    /// for top-N selection and as a tie-break key.
    fn rank_by_vector(
        &self,
        db: &Connection,
        tenant_id: &str,
        query_embedding: &[f32],
    ) -> Result<Vec<(i64, f64)>> {
        let mut stmt = db.prepare(
            "SELECT id, embedding_json FROM documents WHERE tenant_id = ?1",
        )?;
        let rows: Vec<(i64, String)> = stmt
            .query_map([tenant_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .filter_map(|r| r.ok())
            .collect();

        let mut scored: Vec<(i64, f64)> = rows
            .into_iter()
            .map(|(id, emb_json)| {
                let emb = decode(&emb_json);
                (id, cosine_similarity(query_embedding, &emb))
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap().then_with(|| a.0.cmp(&b.0)));
        Ok(scored)
    }

    fn rank_by_text(
        &self,
        db: &Connection,
        tenant_id: &str,
        query_text: &str,
        limit: usize,
    ) -> Result<Vec<i64>> {
        if query_text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let mut stmt = db.prepare(
            "SELECT d.id FROM documents d
             JOIN documents_fts f ON d.id = f.rowid
             WHERE d.tenant_id = ?1 AND documents_fts MATCH ?2
             ORDER BY bm25(documents_fts)
             LIMIT ?3",
        )?;
        let rows = stmt.query_map(
            rusqlite::params![tenant_id, fts_query(query_text), limit as i64],
            |row| row.get(0),
        );
        match rows {
            Ok(rows) => Ok(rows.filter_map(|r| r.ok()).collect()),
            // A malformed FTS5 query string (stray quotes, bare operators)
            // degrades to "no lexical matches" rather than failing the
            // whole hybrid search.
            Err(_) => Ok(Vec::new()),
        }
    }
}

/// FTS5 treats `"`, `*`, `:` and bare boolean keywords specially; quote the
/// whole query as a phrase so arbitrary user/chat text never trips the
/// query-syntax parser.
fn fts_query(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::fts_query;

    #[test]
    fn fts_query_escapes_quotes() {
        assert_eq!(fts_query("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
