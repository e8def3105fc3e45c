pub mod exa;
pub mod llm;

pub use exa::{ExaSearch, SearchProvider, SearchProviderError};
pub use llm::{ChunkSender, ChunkStream, LanguageModel, LlmError, OpenAiModel, StreamEvent};
