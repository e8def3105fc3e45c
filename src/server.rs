use crate::error::OrchestrationError;
use crate::models::{
    ActionState, AskRequest, HistoryResponse, SearchRequestBody, SearchResult, TurnEvent,
};
use crate::orchestrator::ConversationHandle;
use crate::render::{render_history, render_turn};
use crate::tasks::SearchClient;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, IntoResponse, Json, Response,
    },
    routing::{get, post},
    Router,
};
use futures::Stream;
use serde::Serialize;
use std::convert::Infallible;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

#[derive(Clone)]
pub struct AppState {
    pub conversation: ConversationHandle,
    pub search: SearchClient,
    pub result_count: usize,
}

type Rejection = (StatusCode, Json<ActionState<()>>);

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/search", post(search))
        .route("/ask", post(ask))
        .route("/history", get(history))
        .route("/history/:index", get(history_turn))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

#[instrument(skip(state))]
async fn search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequestBody>,
) -> (StatusCode, Json<ActionState<Vec<SearchResult>>>) {
    if req.query.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ActionState::failure(OrchestrationError::EmptyQuery.user_message())),
        );
    }

    let max_results = req.max_results.unwrap_or(state.result_count).max(1);
    let outcome = state.search.search_action(&req.query, max_results).await;
    let status = if outcome.succeeded {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    };
    (status, Json(outcome))
}

#[instrument(skip(state))]
async fn ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, Rejection> {
    let events = state.conversation.start_turn(&req.query).map_err(|e| {
        let status = match &e {
            OrchestrationError::EmptyQuery => StatusCode::BAD_REQUEST,
            OrchestrationError::TurnInProgress => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ActionState::failure(e.user_message())))
    })?;

    info!("Started turn for conversation {}", state.conversation.id());
    let stream = futures::stream::unfold(events, |mut events| async move {
        events
            .recv()
            .await
            .map(|event| (Ok::<_, Infallible>(sse_event(event)), events))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// JSON by default, the rendered conversation (newest first) for `Accept: text/html`.
async fn history(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let turns = state.conversation.history();
    if wants_html(&headers) {
        return Html(render_history(&turns)).into_response();
    }
    Json(HistoryResponse {
        conversation_id: state.conversation.id().to_string(),
        turns,
    })
    .into_response()
}

fn wants_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

async fn history_turn(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Html<String>, StatusCode> {
    let turns = state.conversation.history();
    let turn = turns.get(index).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Html(render_turn(turn)))
}

/// Every payload is JSON, so text with line breaks survives the SSE framing unchanged.
fn sse_event(event: TurnEvent) -> Event {
    match event {
        TurnEvent::Phase(phase) => json_event("phase", &phase),
        TurnEvent::Rewritten(query) => json_event("rewritten", &query),
        TurnEvent::Sources(sources) => json_event("sources", &sources),
        TurnEvent::Chunk(text) => json_event("chunk", &text),
        TurnEvent::Completed(report) => json_event("completed", &report),
        TurnEvent::Failed(message) => json_event("failed", &message),
    }
}

fn json_event<T: Serialize>(name: &str, value: &T) -> Event {
    Event::default()
        .event(name)
        .json_data(value)
        .unwrap_or_else(|e| {
            tracing::error!("Failed to encode {} event: {}", name, e);
            Event::default()
                .event("failed")
                .data("\"An unexpected error occurred\"")
        })
}
