use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Deserialize;

use crate::{
    checks::{run_checks, CheckReport, NodeKind},
    detect::detect_node_kind,
    state::AppState,
};

#[derive(Debug, Deserialize)]
struct CheckRequest {
    url: String,
    #[serde(default)]
    kind: Option<NodeKind>,
}

/// `POST /api/check`: run every check for one node.
async fn check_node(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CheckRequest>,
) -> Result<Json<CheckReport>, (StatusCode, String)> {
    let url = req.url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("url must start with http:// or https://: {url}"),
        ));
    }

    let kind = match req.kind {
        Some(kind) => kind,
        None => detect_node_kind(&state.http, url, state.config.timeout)
            .await
            .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, format!("{e:#}")))?,
    };

    // API checks are only cancelled by dropping the request future.
    let (_cancel_tx, mut cancel_rx) = tokio::sync::oneshot::channel();
    let report = run_checks(&state.http, url, kind, &state.config, &mut cancel_rx).await;
    Ok(Json(report))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/check", post(check_node))
}
