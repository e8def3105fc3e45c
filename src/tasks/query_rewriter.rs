use crate::error::RewriteError;
use crate::models::Turn;
use crate::tools::llm::LanguageModel;
use std::sync::Arc;
use tracing::{info, instrument};

const REWRITER_PREAMBLE: &str =
    "You are a helpful assistant that rewrites follow-up questions as standalone search queries.";

/// Turns a follow-up question into a query that can be searched without the conversation.
#[derive(Clone)]
pub struct QueryRewriter {
    llm: Arc<dyn LanguageModel>,
}

impl QueryRewriter {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    #[instrument(skip(self, history), fields(history = history.len()))]
    pub async fn rewrite(&self, history: &[Turn], latest_query: &str) -> Result<String, RewriteError> {
        if history.is_empty() {
            return Ok(latest_query.to_string());
        }

        let start_time = std::time::Instant::now();
        info!("Rewriting follow-up query");

        let prompt = build_rewrite_prompt(history, latest_query);
        let response = self.llm.complete(REWRITER_PREAMBLE, &prompt).await?;

        let rewritten = response.trim().to_string();
        if rewritten.is_empty() {
            return Err(RewriteError::EmptyRewrite);
        }

        info!(
            "Rewrote {:?} as {:?} in {}ms",
            latest_query,
            rewritten,
            start_time.elapsed().as_millis()
        );
        Ok(rewritten)
    }
}

fn build_rewrite_prompt(history: &[Turn], latest_query: &str) -> String {
    let transcript = history
        .iter()
        .map(|turn| format!("Q: {}\nA: {}", turn.question, turn.answer))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Given the following conversation, rewrite the last user question as a standalone search query. Only return the rewritten query, nothing else.

{}
Q: {}
Standalone search query:"#,
        transcript, latest_query
    )
}
