//! The HTTP surface: alert intake and the recent-alerts feed.
//!
//! `POST /alert` runs the ingestion state machine; `GET /alerts` is the
//! read-only feed the dashboard polls. The server runs until a shutdown
//! signal arrives on its watch channel.

use crate::core::{AlertPayload, AlertStore};
use crate::ingest::{IngestError, IngestService};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// How many records `GET /alerts` returns at most.
pub const FEED_LIMIT: usize = 20;

/// Shared state handed to the axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub ingest: Arc<IngestService>,
    pub store: Arc<dyn AlertStore>,
}

/// Builds the application router. Exposed separately from [`AlertServer`]
/// so tests can serve it on an ephemeral port.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/alert", post(post_alert))
        .route("/alerts", get(get_alerts))
        .with_state(state)
}

async fn post_alert(State(state): State<AppState>, body: Bytes) -> Response {
    let payload: AlertPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            debug!(error = %e, "rejected unparseable alert payload");
            metrics::counter!("alerts_rejected").increment(1);
            return invalid_json();
        }
    };

    match state.ingest.ingest(payload).await {
        Ok(ack) => (StatusCode::OK, Json(ack)).into_response(),
        Err(IngestError::Validation(reason)) => {
            debug!(%reason, "rejected invalid alert payload");
            invalid_json()
        }
        Err(IngestError::Storage(e)) => {
            error!(error = %e, "failed to persist alert");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// Returns the most recent alerts, oldest first (most-recent-last).
async fn get_alerts(State(state): State<AppState>) -> Response {
    match state.store.recent(FEED_LIMIT).await {
        Ok(records) => Json(records).into_response(),
        Err(e) => {
            error!(error = %e, "failed to read alert feed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

fn invalid_json() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "Invalid JSON" })),
    )
        .into_response()
}

/// The intake server and its graceful-shutdown run loop.
pub struct AlertServer {
    listener: TcpListener,
    state: AppState,
    shutdown_rx: watch::Receiver<bool>,
}

impl AlertServer {
    /// Creates a server over an already-bound listener.
    pub fn new(listener: TcpListener, state: AppState, shutdown_rx: watch::Receiver<bool>) -> Self {
        Self {
            listener,
            state,
            shutdown_rx,
        }
    }

    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Returns a future that serves requests until the shutdown signal.
    pub fn run(self) -> impl Future<Output = ()> {
        let Self {
            listener,
            state,
            mut shutdown_rx,
        } = self;
        let app = router(state);
        async move {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    info!("alert server received shutdown signal");
                }
                result = axum::serve(listener, app.into_make_service()) => {
                    if let Err(e) = result {
                        error!("alert server error: {}", e);
                    }
                }
            }
            info!("alert server task finished");
        }
    }
}
