// HTTP surface: the form page plus a small JSON API the page talks to.
//
// Response states mirror the form contract: a validation warning for empty
// text, a success payload with the feedback and saved date, or an error
// payload naming the failing subsystem.

use crate::core::ai::AiProvider;
use crate::core::diary::{canonical_date, DiaryRecord, DiaryService, DiaryStore};
use crate::core::reference::ReferenceSource;
use crate::core::submission::{SubmissionError, SubmissionOrchestrator, SubmissionRequest};
use crate::web::page;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

// The backends are chosen at runtime in main, so the shared state works in
// trait objects (each port has a Box<dyn ...> blanket impl in core).
pub type AppOrchestrator =
    SubmissionOrchestrator<Box<dyn DiaryStore>, Box<dyn AiProvider>, Box<dyn ReferenceSource>>;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<AppOrchestrator>,
    pub diary: Arc<DiaryService<Box<dyn DiaryStore>>>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/entry", get(get_entry))
        .route("/api/submit", post(submit))
        .route("/api/status", get(status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// ERROR MAPPING
// =============================================================================

/// API error payload: `{ "subsystem": ..., "error": ... }` with a status code
/// matching the failure class.
pub enum ApiError {
    Validation(String),
    Upstream {
        subsystem: &'static str,
        message: String,
    },
}

impl From<SubmissionError> for ApiError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::EmptyEntry => ApiError::Validation(err.to_string()),
            other => ApiError::Upstream {
                subsystem: other.subsystem(),
                message: other.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, subsystem, message) = match self {
            ApiError::Validation(message) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation", message)
            }
            ApiError::Upstream { subsystem, message } => {
                (StatusCode::BAD_GATEWAY, subsystem, message)
            }
        };

        let body = Json(serde_json::json!({
            "subsystem": subsystem,
            "error": message,
        }));

        (status, body).into_response()
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

async fn index() -> Html<&'static str> {
    Html(page::FORM_PAGE)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Where the orchestrator currently is in its Idle → Submitting →
/// Succeeded/Failed cycle.
async fn status(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "state": state.orchestrator.state().await.as_str() }))
}

#[derive(Debug, Deserialize)]
struct EntryQuery {
    date: NaiveDate,
}

#[derive(Debug, Serialize)]
struct EntryResponse {
    date: String,
    diary: String,
    feedback: String,
    warnings: Vec<String>,
}

/// Prefill lookup for the selected date.
///
/// An unreachable store degrades to an empty entry plus a warning, so the
/// page still renders and the user can write.
async fn get_entry(
    State(state): State<AppState>,
    Query(query): Query<EntryQuery>,
) -> Json<EntryResponse> {
    let date = canonical_date(query.date);

    match state.diary.entry_for(&date).await {
        Ok(entry) => {
            let entry = entry.unwrap_or_else(|| DiaryRecord {
                date: date.clone(),
                diary: String::new(),
                feedback: String::new(),
            });
            Json(EntryResponse {
                date,
                diary: entry.diary,
                feedback: entry.feedback,
                warnings: Vec::new(),
            })
        }
        Err(err) => {
            tracing::warn!("Prefill read degraded: {err}");
            Json(EntryResponse {
                date,
                diary: String::new(),
                feedback: String::new(),
                warnings: vec![format!("Existing entries unavailable: {err}")],
            })
        }
    }
}

#[derive(Debug, Deserialize)]
struct SubmitBody {
    date: NaiveDate,
    text: String,
}

#[derive(Debug, Serialize)]
struct SubmitResponse {
    date: String,
    feedback: String,
    warnings: Vec<String>,
}

async fn submit(
    State(state): State<AppState>,
    Json(body): Json<SubmitBody>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let outcome = state
        .orchestrator
        .submit(SubmissionRequest {
            date: body.date,
            text: body.text,
        })
        .await?;

    Ok(Json(SubmitResponse {
        date: outcome.date,
        feedback: outcome.feedback,
        warnings: outcome.warnings,
    }))
}
