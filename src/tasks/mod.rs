mod query_rewriter;
mod searcher;
mod summarizer;

pub use query_rewriter::QueryRewriter;
pub use searcher::{normalize_batch, SearchClient};
pub use summarizer::{build_grounding_prompt, compose_messages, SummaryStream, Summarizer};
