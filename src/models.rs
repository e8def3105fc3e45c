use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const UNTITLED: &str = "Untitled";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequestBody {
    pub query: String,
    #[serde(default)]
    pub max_results: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub conversation_id: String,
    pub turns: Vec<Turn>,
}

/// Caller-facing result envelope shared by the search and summarize entry points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionState<T> {
    pub succeeded: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ActionState<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            succeeded: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            message: message.into(),
            data: None,
        }
    }
}

/// A validated search hit. Only the search client constructs these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub text: String,
    #[serde(default)]
    pub summary: String,
}

/// A provider record before normalization. Every field may be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSearchRecord {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

/// Provider-agnostic search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub max_results: usize,
    pub autoprompt: bool,
    pub live_crawl: bool,
    pub include_text: bool,
    pub include_summary: bool,
}

impl SearchRequest {
    pub fn live(query: impl Into<String>, max_results: usize) -> Self {
        Self {
            query: query.into(),
            max_results,
            autoprompt: true,
            live_crawl: true,
            include_text: true,
            include_summary: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExaSearchRequest {
    pub query: String,
    #[serde(rename = "type")]
    pub search_type: String,
    pub use_autoprompt: bool,
    pub num_results: usize,
    pub contents: ExaContentsOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExaContentsOptions {
    pub text: bool,
    pub summary: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub livecrawl: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExaSearchResponse {
    #[serde(default)]
    pub results: Vec<RawSearchRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
}

impl ConversationMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// One committed question/answer/sources unit of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub question: String,
    pub answer: String,
    pub sources: Vec<SearchResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    Idle,
    Rewriting,
    Searching,
    Summarizing,
    Committing,
    Errored,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnReport {
    pub turn: Turn,
    pub search_query: String,
    pub total_time_ms: u64,
    pub task_times: HashMap<String, u64>,
}

/// Progress of a single turn as seen by the caller.
#[derive(Debug, Clone)]
pub enum TurnEvent {
    Phase(TurnPhase),
    Rewritten(String),
    Sources(Vec<SearchResult>),
    Chunk(String),
    Completed(TurnReport),
    Failed(String),
}

impl TurnEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnEvent::Completed(_) | TurnEvent::Failed(_))
    }
}
