use crate::error::SearchError;
use crate::models::{ActionState, RawSearchRecord, SearchRequest, SearchResult, UNTITLED};
use crate::tools::exa::SearchProvider;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use url::Url;

/// Calls the search provider and turns its records into validated [`SearchResult`]s.
#[derive(Clone)]
pub struct SearchClient {
    provider: Arc<dyn SearchProvider>,
}

impl SearchClient {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self { provider }
    }

    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>, SearchError> {
        let start_time = std::time::Instant::now();
        let request = SearchRequest::live(query, max_results);

        let records = self.provider.search(&request).await?;
        let mut results = normalize_batch(records)?;
        results.truncate(max_results);

        info!(
            "Retrieved {} search results in {}ms",
            results.len(),
            start_time.elapsed().as_millis()
        );
        Ok(results)
    }

    /// Search wrapped in the caller-facing envelope.
    pub async fn search_action(&self, query: &str, max_results: usize) -> ActionState<Vec<SearchResult>> {
        match self.search(query, max_results).await {
            Ok(results) => ActionState::success("Search results retrieved successfully", results),
            Err(SearchError::InvalidFormat) => ActionState::failure("Invalid search result format"),
            Err(SearchError::ProviderFailure(message)) => {
                tracing::error!("Error searching: {}", message);
                ActionState::failure(format!("Failed to search: {}", message))
            }
        }
    }
}

/// Applies the title/text/summary defaults and validates every record.
/// A single bad record rejects the whole batch.
pub fn normalize_batch(records: Vec<RawSearchRecord>) -> Result<Vec<SearchResult>, SearchError> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let result = normalize_record(record);
            if is_valid(&result) {
                Ok(result)
            } else {
                warn!("Rejecting search batch: record {} has url {:?}", index, result.url);
                Err(SearchError::InvalidFormat)
            }
        })
        .collect()
}

fn normalize_record(record: RawSearchRecord) -> SearchResult {
    SearchResult {
        title: record
            .title
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| UNTITLED.to_string()),
        url: record.url.unwrap_or_default(),
        text: record.text.unwrap_or_default(),
        summary: record.summary.unwrap_or_default(),
    }
}

/// Only absolute http(s) URLs are accepted; they end up in rendered links.
fn is_valid(result: &SearchResult) -> bool {
    if result.title.is_empty() || result.url.is_empty() {
        return false;
    }
    match Url::parse(&result.url) {
        Ok(url) => matches!(url.scheme(), "http" | "https"),
        Err(_) => false,
    }
}
