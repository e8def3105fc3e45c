use crate::models::{
    ExaContentsOptions, ExaSearchRequest, ExaSearchResponse, RawSearchRecord, SearchRequest,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

const EXA_SEARCH_URL: &str = "https://api.exa.ai/search";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchProviderError(pub String);

impl std::fmt::Display for SearchProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Search provider error: {}", self.0)
    }
}

impl std::error::Error for SearchProviderError {}

/// A web search backend returning raw, unvalidated records in rank order.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<RawSearchRecord>, SearchProviderError>;
}

#[derive(Debug, Clone)]
pub struct ExaSearch {
    client: reqwest::Client,
    api_key: String,
}

impl ExaSearch {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
        }
    }
}

pub(crate) fn exa_request(request: &SearchRequest) -> ExaSearchRequest {
    let search_type = if request.autoprompt { "neural" } else { "keyword" };
    ExaSearchRequest {
        query: request.query.clone(),
        search_type: search_type.to_string(),
        use_autoprompt: request.autoprompt,
        num_results: request.max_results,
        contents: ExaContentsOptions {
            text: request.include_text,
            summary: request.include_summary,
            livecrawl: request.live_crawl.then(|| "always".to_string()),
        },
    }
}

#[async_trait]
impl SearchProvider for ExaSearch {
    #[instrument(skip(self, request), fields(query = %request.query))]
    async fn search(&self, request: &SearchRequest) -> Result<Vec<RawSearchRecord>, SearchProviderError> {
        let body = exa_request(request);

        let response = self
            .client
            .post(EXA_SEARCH_URL)
            .header("x-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SearchProviderError(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SearchProviderError(format!("HTTP {}: {}", status, text)));
        }

        let search_response: ExaSearchResponse = response
            .json()
            .await
            .map_err(|e| SearchProviderError(format!("Failed to parse response: {}", e)))?;

        debug!("Exa returned {} records", search_response.results.len());
        Ok(search_response.results)
    }
}
