//! Read API for the aggregate report.
//!
//! A single read-through lookup: the current total if any cycle has
//! committed, 404 otherwise. Reads run in their own short-lived scope and
//! never block the writer loop.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router, extract::State};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::core::{NUMBER_OF_VOTES_KEY, REPORTS_STORE, ReportError};
use crate::store::ReportStore;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug)]
pub enum WebError {
    NotFound(String),
    Internal(String),
}

impl From<ReportError> for WebError {
    fn from(err: ReportError) -> Self {
        WebError::Internal(err.to_string())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, message, code) = match self {
            WebError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "not_found".to_string()),
            WebError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                msg,
                "internal_error".to_string(),
            ),
        };

        let body = Json(ErrorResponse {
            error: message,
            code,
        });

        (status, body).into_response()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: ReportStore,
}

pub fn router(store: ReportStore) -> Router {
    let state = AppState { store };
    Router::new()
        .route("/api/report/NumberOfVotes", get(number_of_votes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn number_of_votes(State(state): State<AppState>) -> Result<Json<i64>, WebError> {
    match state.store.try_get(REPORTS_STORE, NUMBER_OF_VOTES_KEY).await {
        Some(total) => Ok(Json(total)),
        None => Err(WebError::NotFound(
            "no report has been generated yet".to_string(),
        )),
    }
}
