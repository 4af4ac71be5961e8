//! HTTP routes.

use std::sync::Arc;

use axum::extract::State;
use axum::response::{Html, Redirect};
use axum::routing::{get, post};
use axum::{Json, Router};
use ratewatch_fx::RateReport;
use tracing::info;

use crate::render;
use crate::session::Session;

/// Build the dashboard router over a shared session.
pub fn router(session: Arc<Session>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/refresh", post(refresh))
        .route("/api/snapshot", get(api_snapshot))
        .route("/health", get(health))
        .with_state(session)
}

async fn index(State(session): State<Arc<Session>>) -> Html<String> {
    Html(render::page(&session.report().await))
}

async fn refresh(State(session): State<Arc<Session>>) -> Redirect {
    let snapshot = session.refresh().await;
    info!(available = snapshot.available_sources(), "Manual refresh");
    Redirect::to("/")
}

async fn api_snapshot(State(session): State<Arc<Session>>) -> Json<RateReport> {
    Json(session.report().await)
}

async fn health() -> &'static str {
    "ok"
}
