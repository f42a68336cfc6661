//! Demo endpoint backed by an external joke API.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::http::server::AppState;
use crate::sample::{SampleError, StoredJoke};

#[derive(Debug, Serialize)]
pub struct SampleResponse {
    pub api_data: Value,
    pub jokes: Vec<StoredJoke>,
}

impl IntoResponse for SampleError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, "Sample upstream failed");
        let body = Json(json!({ "error": self.to_string() }));
        (StatusCode::BAD_GATEWAY, body).into_response()
    }
}

/// Fetch a joke, remember it, and return it with the most recent ones.
pub async fn sample(State(state): State<AppState>) -> Result<Json<SampleResponse>, SampleError> {
    let fetched = state.jokes.fetch().await?;
    if state.recent.record(&fetched.text) {
        tracing::debug!("Stored new joke");
    }

    Ok(Json(SampleResponse {
        api_data: fetched.api_data,
        jokes: state.recent.latest(),
    }))
}
