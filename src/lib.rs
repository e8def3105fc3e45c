pub mod config;
pub mod conversation;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod render;
pub mod server;
pub mod tasks;
pub mod tools;

pub use config::AppConfig;
pub use conversation::ConversationState;
pub use error::{OrchestrationError, RewriteError, SearchError, SummarizeError};
pub use orchestrator::{ConversationHandle, Orchestrator};
pub use server::{create_router, AppState};
