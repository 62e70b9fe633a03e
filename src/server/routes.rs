//! HTTP route handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::events::{EventError, EventMatch, EventQuery, GeoPoint};
use crate::rag::{
    Answer, CandidateSummary, IndexInconsistency, PartialRetrieverFailure, RagEngine,
    RetrievalError,
};

use super::state::AppState;

/// Error body returned as plain text with a status code.
type ApiError = (StatusCode, String);

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/events/search", post(search_events))
        .route("/api/retrieve", post(retrieve))
        .route("/api/ask", post(ask))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "gout",
        "version": env!("CARGO_PKG_VERSION"),
        "events": state.events.len(),
        "rag": state.rag.is_some(),
    }))
}

/// Event search response.
#[derive(Debug, Serialize)]
pub struct EventSearchResponse {
    /// Ranked matches.
    pub results: Vec<EventMatch>,
    /// Number of matches.
    pub count: usize,
    /// Where a map of the results should be centered.
    pub map_center: GeoPoint,
}

/// Handle event search requests.
async fn search_events(
    State(state): State<Arc<AppState>>,
    Json(query): Json<EventQuery>,
) -> Result<Json<EventSearchResponse>, ApiError> {
    let results = state.events.search(&query).map_err(event_error)?;
    let map_center = state.events.map_center(&results);
    let count = results.len();

    Ok(Json(EventSearchResponse {
        results,
        count,
        map_center,
    }))
}

/// Retrieval request.
#[derive(Debug, Deserialize)]
pub struct RetrieveRequest {
    /// Query text.
    pub query: String,
}

/// Retrieval response.
#[derive(Debug, Serialize)]
pub struct RetrieveResponse {
    /// Deduplicated candidates, dense first.
    pub candidates: Vec<CandidateSummary>,
    /// Number of candidates.
    pub count: usize,
    /// Set when one retriever failed.
    pub partial: Option<PartialRetrieverFailure>,
    /// Ids whose content differs between the two indexes.
    pub inconsistencies: Vec<IndexInconsistency>,
}

/// Handle hybrid retrieval requests.
async fn retrieve(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RetrieveRequest>,
) -> Result<Json<RetrieveResponse>, ApiError> {
    let engine = rag_engine(&state)?;
    let retrieval = engine
        .retrieve(&request.query)
        .await
        .map_err(retrieval_error)?;

    let candidates: Vec<CandidateSummary> =
        retrieval.candidates.iter().map(|c| c.summary()).collect();
    let count = candidates.len();

    Ok(Json(RetrieveResponse {
        candidates,
        count,
        partial: retrieval.partial,
        inconsistencies: retrieval.inconsistencies,
    }))
}

/// Question request.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    /// The question.
    pub question: String,
}

/// Answer response.
#[derive(Debug, Serialize)]
pub struct AskResponse {
    /// Generated answer and its sources.
    #[serde(flatten)]
    pub answer: Answer,
    /// Model used.
    pub model: String,
}

/// Handle question answering requests.
async fn ask(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let engine = rag_engine(&state)?;
    let answer = engine
        .ask(&request.question)
        .await
        .map_err(retrieval_error)?;

    Ok(Json(AskResponse {
        answer,
        model: engine.model_name().to_string(),
    }))
}

fn rag_engine(state: &AppState) -> Result<&RagEngine, ApiError> {
    state.rag.as_deref().ok_or_else(|| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            "Question answering is not configured".to_string(),
        )
    })
}

fn event_error(e: EventError) -> ApiError {
    if e.is_invalid_input() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, format!("Event search error: {e}"))
    }
}

fn retrieval_error(e: RetrievalError) -> ApiError {
    if e.is_invalid_input() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else {
        tracing::error!("Retrieval failed: {e}");
        (StatusCode::INTERNAL_SERVER_ERROR, format!("Retrieval error: {e}"))
    }
}
