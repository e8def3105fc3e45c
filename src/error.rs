use crate::tools::exa::SearchProviderError;
use crate::tools::llm::LlmError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("search provider failed: {0}")]
    ProviderFailure(String),
    #[error("invalid search result format")]
    InvalidFormat,
}

impl From<SearchProviderError> for SearchError {
    fn from(err: SearchProviderError) -> Self {
        SearchError::ProviderFailure(err.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    #[error("query rewrite failed: {0}")]
    ProviderFailure(String),
    #[error("query rewrite returned an empty query")]
    EmptyRewrite,
}

impl From<LlmError> for RewriteError {
    fn from(err: LlmError) -> Self {
        RewriteError::ProviderFailure(err.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SummarizeError {
    /// The completion could not be started; no chunk was produced.
    #[error("summary generation failed: {0}")]
    ProviderFailure(String),
    /// The completion started but terminated abnormally.
    #[error("summary stream failed: {0}")]
    StreamFailure(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrchestrationError {
    #[error("query is empty")]
    EmptyQuery,
    #[error("a turn is already in progress")]
    TurnInProgress,
    #[error(transparent)]
    Rewrite(#[from] RewriteError),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error("search returned no results")]
    NoResults,
    #[error(transparent)]
    Summarize(#[from] SummarizeError),
    #[error("turn cancelled by the caller")]
    Cancelled,
    #[error("no turn in flight")]
    NoTurnInFlight,
}

impl OrchestrationError {
    /// The single message shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            OrchestrationError::EmptyQuery => "Please enter a question.".to_string(),
            OrchestrationError::TurnInProgress => {
                "A previous question is still being answered. Try again when it finishes."
                    .to_string()
            }
            OrchestrationError::Rewrite(e) => {
                format!("Could not understand the follow-up question: {}", e)
            }
            OrchestrationError::Search(SearchError::InvalidFormat) => {
                "Invalid search result format".to_string()
            }
            OrchestrationError::Search(SearchError::ProviderFailure(msg)) => {
                format!("Failed to search: {}", msg)
            }
            OrchestrationError::NoResults => "No search results found.".to_string(),
            OrchestrationError::Summarize(SummarizeError::ProviderFailure(msg)) => {
                format!("Failed to generate AI summary: {}", msg)
            }
            OrchestrationError::Summarize(SummarizeError::StreamFailure(msg)) => {
                format!("Error reading AI response: {}", msg)
            }
            OrchestrationError::Cancelled => "The request was cancelled.".to_string(),
            OrchestrationError::NoTurnInFlight => "An unexpected error occurred".to_string(),
        }
    }
}
