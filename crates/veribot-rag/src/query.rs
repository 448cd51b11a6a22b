use std::sync::Arc;

use tracing::{info, warn};
use veribot_memory::ChatRole;
use veribot_providers::{LlmProvider, Step};

use crate::engine::RagEngine;
use crate::error::{RagError, Result};
use crate::prompts::{
    self, CONTEXTUALIZE_PROMPT_TEMPLATE, HYDE_PROMPT_TEMPLATE, RAG_ANSWER_PROMPT_TEMPLATE,
    RERANK_PROMPT_TEMPLATE, SMALL_TALK_PROMPT_TEMPLATE,
};
use crate::types::{AnswerResult, QueryOptions};

/// How many chat turns are rendered into `history_str` for contextualization
/// and generation prompts.
const HISTORY_TURNS: usize = 10;

impl RagEngine {
    /// Run the full query pipeline — contextualize, route, retrieve,
    /// optionally rerank, generate — and return the generated answer plus
    /// whether document context was used.
    pub async fn query(&self, tenant_id: &str, query: &str, opts: &QueryOptions) -> Result<AnswerResult> {
        let history = match &opts.session_id {
            Some(session_id) => self.chat_memory.recent(session_id, HISTORY_TURNS)?,
            None => Vec::new(),
        };
        let history_str = history
            .iter()
            .map(|m| format!("{}: {}", m.role.as_str().to_uppercase(), m.content))
            .collect::<Vec<_>>()
            .join("\n");

        // Step 1: contextualization.
        let search_query = if !history.is_empty() {
            self.contextualize(query, &history_str, opts).await?
        } else {
            query.to_string()
        };

        let lang_instruction = language_instruction(&opts.preferred_languages);

        // Step 2: intent routing is the caller's job (opts.small_talk).
        let answer_text = if opts.small_talk {
            self.generate_small_talk(&search_query, &history_str, &lang_instruction, opts).await?
        } else {
            self.generate_with_retrieval(tenant_id, &search_query, &history_str, &lang_instruction, opts)
                .await?
        };

        // Step 8: persist.
        if let Some(session_id) = &opts.session_id {
            self.chat_memory.append(session_id, ChatRole::User, query)?;
            self.chat_memory.append(session_id, ChatRole::Assistant, &answer_text.answer_text)?;
        }

        Ok(answer_text)
    }

    /// Resolve `(provider, model)` for a step, honoring `opts.provider` as an
    /// explicit override before falling back to the tenant's step routing
    /// table.
    fn resolve_step(&self, opts: &QueryOptions, step: Step) -> Option<(Arc<dyn LlmProvider>, String)> {
        if let Some(name) = &opts.provider {
            if let Some(provider) = self.providers.get(name) {
                let model = self
                    .llm_config
                    .as_ref()
                    .map(|c| c.resolve(step.as_str()).model)
                    .unwrap_or_default();
                return Some((provider, model));
            }
        }
        self.providers.resolve(self.llm_config.as_ref(), step)
    }

    async fn contextualize(&self, query: &str, history_str: &str, opts: &QueryOptions) -> Result<String> {
        let (provider, model) =
            self.resolve_step(opts, Step::Contextualize).ok_or(RagError::NoProvider("contextualize"))?;
        let prompt = prompts::fill(CONTEXTUALIZE_PROMPT_TEMPLATE, &[("history_str", history_str), ("query", query)]);
        Ok(provider.complete(&model, &prompt).await?)
    }

    async fn generate_small_talk(
        &self,
        search_query: &str,
        history_str: &str,
        lang_instruction: &str,
        opts: &QueryOptions,
    ) -> Result<AnswerResult> {
        let (provider, model) = self.resolve_step(opts, Step::SmallTalk).ok_or(RagError::NoProvider("small_talk"))?;
        let prompt = prompts::fill(
            SMALL_TALK_PROMPT_TEMPLATE,
            &[("lang_instruction", lang_instruction), ("history_str", history_str), ("search_query", search_query)],
        );
        let text = provider.complete(&model, &prompt).await?;
        Ok(AnswerResult { answer_text: text, references_used: false })
    }

    async fn generate_with_retrieval(
        &self,
        tenant_id: &str,
        search_query: &str,
        history_str: &str,
        lang_instruction: &str,
        opts: &QueryOptions,
    ) -> Result<AnswerResult> {
        // Step 3: HyDE expansion — embeds a hypothetical passage instead of
        // the query itself, but reranking still compares against the query.
        let embed_input = if opts.use_hyde {
            let (provider, model) = self.resolve_step(opts, Step::Hyde).ok_or(RagError::NoProvider("hyde"))?;
            let prompt = prompts::fill(HYDE_PROMPT_TEMPLATE, &[("query", search_query)]);
            provider.complete(&model, &prompt).await?
        } else {
            search_query.to_string()
        };

        // Step 4: retrieval.
        let candidate_limit = if opts.use_rerank { self.base_limit * 4 } else { self.base_limit };
        let query_embedding = self.embedder.embed_query(&embed_input).await?;
        if query_embedding.len() != self.embedding_dim {
            return Err(RagError::DimensionMismatch { expected: self.embedding_dim, got: query_embedding.len() });
        }
        let mut hits = self.documents.hybrid_search(tenant_id, &query_embedding, search_query, candidate_limit)?;

        // Step 5: reranking.
        if opts.use_rerank && !hits.is_empty() {
            hits = self.rerank(search_query, hits, opts).await?;
            hits.truncate(self.base_limit);
        }

        let mut context_str = hits
            .iter()
            .map(|h| h.chunk.content.clone())
            .collect::<Vec<_>>()
            .join("\n---\n");
        if let Some(external) = &opts.external_context {
            if !external.trim().is_empty() {
                context_str = format!("{context_str}\n---\n{external}");
            }
        }
        let references_used = !hits.is_empty();

        // Step 7: answer generation.
        let (provider, model) = self.resolve_step(opts, Step::Generation).ok_or(RagError::NoProvider("generation"))?;
        let prompt = prompts::fill(
            RAG_ANSWER_PROMPT_TEMPLATE,
            &[
                ("lang_instruction", lang_instruction),
                ("history_str", history_str),
                ("context_str", &context_str),
                ("search_query", search_query),
            ],
        );
        let text = provider.complete(&model, &prompt).await?;
        Ok(AnswerResult { answer_text: text, references_used })
    }

    async fn rerank(
        &self,
        query: &str,
        hits: Vec<veribot_memory::ScoredChunk>,
        opts: &QueryOptions,
    ) -> Result<Vec<veribot_memory::ScoredChunk>> {
        let (provider, model) = self.resolve_step(opts, Step::Rerank).ok_or(RagError::NoProvider("rerank"))?;

        let mut scored = Vec::with_capacity(hits.len());
        for hit in hits {
            let prompt = prompts::fill(RERANK_PROMPT_TEMPLATE, &[("query", query), ("content", &hit.chunk.content)]);
            let score = match provider.complete(&model, &prompt).await {
                Ok(raw) => parse_rerank_score(&raw),
                Err(e) => {
                    warn!(error = %e, "rerank call failed, scoring as 0");
                    0.0
                }
            };
            scored.push((score, hit));
        }
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap());
        info!(candidates = scored.len(), "reranked");
        Ok(scored
            .into_iter()
            .map(|(score, mut hit)| {
                hit.score = score;
                hit
            })
            .collect())
    }
}

/// Parse a `{"score": N}` JSON reply; malformed JSON degrades to score 0
/// rather than failing the rerank step.
fn parse_rerank_score(raw: &str) -> f64 {
    #[derive(serde::Deserialize)]
    struct RerankReply {
        score: f64,
    }
    let trimmed = raw.trim().trim_start_matches("```json").trim_start_matches("```").trim_end_matches("```").trim();
    serde_json::from_str::<RerankReply>(trimmed).map(|r| r.score).unwrap_or_else(|_| {
        warn!(raw, "malformed rerank JSON, scoring as 0");
        0.0
    })
}

/// Build the directive embedded in the answer prompt from an ordered list of
/// preferred languages; the first entry wins.
fn language_instruction(preferred: &[String]) -> String {
    match preferred.first() {
        Some(lang) => format!("Respond in {lang} unless the user's message is clearly in another language."),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rerank_score_handles_plain_json() {
        assert_eq!(parse_rerank_score(r#"{"score": 7}"#), 7.0);
    }

    #[test]
    fn parse_rerank_score_handles_fenced_json() {
        assert_eq!(parse_rerank_score("```json\n{\"score\": 9}\n```"), 9.0);
    }

    #[test]
    fn parse_rerank_score_defaults_to_zero_on_garbage() {
        assert_eq!(parse_rerank_score("not json at all"), 0.0);
    }

    #[test]
    fn language_instruction_empty_when_no_preference() {
        assert_eq!(language_instruction(&[]), "");
    }
}
