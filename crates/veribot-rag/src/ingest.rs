use tracing::{info, warn};
use veribot_providers::Step;

use crate::chunk::split_into_chunks;
use crate::engine::RagEngine;
use crate::error::{RagError, Result};
use crate::types::IngestResult;

/// Raw content handed to `RagEngine::ingest_document` — either already-text
/// or image bytes that must be described first.
pub enum IngestContent {
    Text(String),
    Image { bytes: Vec<u8>, mime: String },
}

impl RagEngine {
    /// Ingest one document for a tenant: describe (if an image), chunk,
    /// batch-embed, and persist. A batch embedding failure aborts the whole
    /// file; a single chunk's insert failure is logged and the rest proceed.
    pub async fn ingest_document(
        &self,
        tenant_id: &str,
        filename: &str,
        content: IngestContent,
    ) -> Result<IngestResult> {
        let text = match content {
            IngestContent::Text(text) => text,
            IngestContent::Image { bytes, mime } => {
                let (provider, model) = self
                    .providers
                    .resolve(self.llm_config.as_ref(), Step::ImageDescription)
                    .ok_or(RagError::NoProvider("image_description"))?;
                let description = provider.describe_image(&model, &bytes, &mime).await?;
                format!("[IMAGE DESCRIPTION for {filename}]\n{description}")
            }
        };

        let chunks = split_into_chunks(&text);
        if chunks.is_empty() {
            return Ok(IngestResult { filename: filename.to_string(), chunks_total: 0, chunks_inserted: 0 });
        }

        let embeddings = self.embedder.embed_batch(&chunks).await?;
        if embeddings.len() != chunks.len() {
            return Err(RagError::DimensionMismatch { expected: chunks.len(), got: embeddings.len() });
        }
        for embedding in &embeddings {
            if embedding.len() != self.embedding_dim {
                return Err(RagError::DimensionMismatch { expected: self.embedding_dim, got: embedding.len() });
            }
        }

        let mut inserted = 0;
        for (chunk, embedding) in chunks.iter().zip(embeddings.iter()) {
            match self.documents.insert_chunk(tenant_id, filename, chunk, embedding) {
                Ok(_) => inserted += 1,
                Err(e) => warn!(tenant_id, filename, error = %e, "chunk insert failed, continuing"),
            }
        }

        info!(tenant_id, filename, chunks_total = chunks.len(), chunks_inserted = inserted, "document ingested");
        Ok(IngestResult { filename: filename.to_string(), chunks_total: chunks.len(), chunks_inserted: inserted })
    }

    /// Remove every chunk previously ingested under `filename`, used when a
    /// document is replaced or deleted from the knowledge base.
    pub fn forget_document(&self, tenant_id: &str, filename: &str) -> Result<usize> {
        Ok(self.documents.delete_by_filename(tenant_id, filename)?)
    }
}
