//! HTTP binding for the signaling broker
//!
//! Thin transport layer over [`SignalBroker`]; the broker itself is
//! transport-agnostic. Endpoints:
//! - `POST /signal` - post a signaling message (ping short-circuits to pong)
//! - `GET /signal?roomId=&peerId=` - poll pending messages
//! - `GET /health` - liveness check with room count
//!
//! Responses always carry permissive CORS headers; the scouting app is served
//! from arbitrary origins on competition networks.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::broker::{PostOutcome, SignalBroker};
use crate::messages::{BrokerError, SignalMessage};

/// HTTP server over a shared broker
pub struct SignalServer {
    broker: Arc<SignalBroker>,
}

impl SignalServer {
    pub fn new(broker: Arc<SignalBroker>) -> Self {
        Self { broker }
    }

    /// Build the router with all endpoints
    pub fn router(&self) -> Router {
        Router::new()
            .route("/signal", get(poll_handler).post(post_handler))
            .route("/health", get(health_handler))
            .with_state(self.broker.clone())
            .layer(
                tower::ServiceBuilder::new()
                    .layer(tower_http::trace::TraceLayer::new_for_http())
                    .layer(tower_http::cors::CorsLayer::permissive()),
            )
    }

    /// Serve until the listener fails
    pub async fn serve(&self, addr: SocketAddr) -> Result<(), std::io::Error> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Signal server listening on {}", addr);

        axum::serve(listener, self.router()).await
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PollParams {
    room_id: Option<String>,
    peer_id: Option<String>,
}

/// `POST /signal`
///
/// The body is parsed by hand rather than through the `Json` extractor so a
/// bad body yields the same `{"error": ...}` shape as a missing field.
async fn post_handler(State(broker): State<Arc<SignalBroker>>, body: String) -> Response {
    let message: SignalMessage = match serde_json::from_str(&body) {
        Ok(message) => message,
        Err(e) => {
            debug!("Rejected unparseable signal body: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid JSON" })),
            )
                .into_response();
        }
    };

    match broker.post_message(message) {
        Ok(PostOutcome::Pong) => Json(json!({ "pong": true })).into_response(),
        Ok(PostOutcome::Posted(room)) => {
            Json(json!({ "success": true, "room": room })).into_response()
        }
        Err(BrokerError::InvalidRequest { received }) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing roomId or peerId", "received": received })),
        )
            .into_response(),
    }
}

/// `GET /signal?roomId=&peerId=`
async fn poll_handler(
    State(broker): State<Arc<SignalBroker>>,
    Query(params): Query<PollParams>,
) -> Response {
    let (room_id, peer_id) = match (params.room_id, params.peer_id) {
        (Some(room_id), Some(peer_id)) => (room_id, peer_id),
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Missing roomId or peerId" })),
            )
                .into_response();
        }
    };

    Json(broker.poll_messages(&room_id, &peer_id)).into_response()
}

/// `GET /health`
async fn health_handler(State(broker): State<Arc<SignalBroker>>) -> Response {
    Json(json!({ "status": "healthy", "rooms": broker.room_count() })).into_response()
}
