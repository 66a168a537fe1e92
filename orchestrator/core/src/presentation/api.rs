// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0

// Webhook receiver. A delivery is acknowledged as soon as its check run is
// opened; the stage itself keeps running in the background.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::application::{Dispatch, EventRouter};
use crate::domain::webhook::WebhookEvent;
use crate::infrastructure::webhook_signature::{WebhookVerifier, SIGNATURE_HEADER};

pub const EVENT_HEADER: &str = "x-github-event";
pub const WEBHOOKS_METRIC: &str = "monocrat_webhooks_total";

pub struct AppState {
    router: Arc<EventRouter>,
    verifier: WebhookVerifier,
    started_at: Instant,
}

impl AppState {
    pub fn new(router: Arc<EventRouter>, verifier: WebhookVerifier) -> Self {
        Self {
            router,
            verifier,
            started_at: Instant::now(),
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", post(receive_webhook))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn record(event: &str, outcome: &'static str) {
    metrics::counter!(WEBHOOKS_METRIC, "event" => event.to_string(), "outcome" => outcome).increment(1);
}

fn reject(message: String) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": message }))).into_response()
}

async fn receive_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let event_type = header(&headers, EVENT_HEADER).unwrap_or_default().to_string();

    if let Err(e) = state.verifier.verify(&body, header(&headers, SIGNATURE_HEADER)) {
        warn!(event = %event_type, error = %e, "Rejected webhook delivery");
        record(&event_type, "unauthenticated");
        return reject(e.to_string());
    }

    let event = match WebhookEvent::parse(&event_type, &body) {
        Ok(event) => event,
        Err(e) => {
            warn!(event = %event_type, error = %e, "Malformed webhook payload");
            record(&event_type, "malformed");
            return reject(e.to_string());
        }
    };

    match state.router.route(&event).await {
        Ok(Dispatch::Ignored { reason }) => {
            record(&event_type, "ignored");
            (StatusCode::OK, Json(json!({ "status": "ignored", "reason": reason }))).into_response()
        }
        // Dropping the handle detaches the stage.
        Ok(Dispatch::Launched { stage, run, .. }) => {
            record(&event_type, "launched");
            (
                StatusCode::OK,
                Json(json!({ "status": "launched", "stage": stage.as_str(), "check_run_id": run.0 })),
            )
                .into_response()
        }
        Err(e) => {
            error!(event = %event_type, error = %e, "Failed to start stage");
            record(&event_type, "error");
            reject(e.to_string())
        }
    }
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "uptime_seconds": state.started_at.elapsed().as_secs(),
    }))
}
