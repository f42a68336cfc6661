//! Application metadata endpoint.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::http::server::AppState;

/// Format of the `time` field, e.g. `03:04:05 PM on 2024-01-31`.
pub const TIME_FORMAT: &str = "%I:%M:%S %p on %Y-%m-%d";

#[derive(Debug, Serialize)]
pub struct AppInfo {
    pub hostname: String,
    pub app_name: String,
    pub description: String,
    pub env: String,
    pub time: String,
}

pub async fn info(State(state): State<AppState>) -> Json<AppInfo> {
    Json(AppInfo {
        hostname: state.hostname.to_string(),
        app_name: state.config.app.name.clone(),
        description: state.config.app.description.clone(),
        env: state.config.app.env.clone(),
        time: chrono::Local::now().format(TIME_FORMAT).to_string(),
    })
}
