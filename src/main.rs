use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use web_search_assistant::config::DEFAULT_LOG_FILTER;
use web_search_assistant::tasks::{QueryRewriter, SearchClient, Summarizer};
use web_search_assistant::tools::{ExaSearch, LanguageModel, OpenAiModel, SearchProvider};
use web_search_assistant::{create_router, AppConfig, AppState, ConversationHandle, Orchestrator};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = AppConfig::from_env()?;

    let llm: Arc<dyn LanguageModel> = Arc::new(OpenAiModel::new(
        &config.openai_api_key,
        &config.rewrite_model,
        &config.model,
    ));
    let provider: Arc<dyn SearchProvider> = Arc::new(ExaSearch::new(config.exa_api_key.clone()));
    let search = SearchClient::new(provider);

    let orchestrator = Orchestrator::new(
        QueryRewriter::new(llm.clone()),
        search.clone(),
        Summarizer::new(llm),
    )
    .with_result_count(config.result_count);

    let conversation = ConversationHandle::new(orchestrator);
    info!("Conversation {} ready", conversation.id());

    let state = AppState {
        conversation,
        search,
        result_count: config.result_count,
    };
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Web search assistant running on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
