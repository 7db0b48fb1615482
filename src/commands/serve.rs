//! `portguide serve`: the migration endpoint over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use tracing::info;

use crate::config::Config;
use crate::context::ServiceContext;
use crate::error::{MigrationError, ValidationError};
use crate::pipeline::cancel::Cancellation;
use crate::ports::RenderedDocument;
use crate::request::{self, ErrorPayload, MigrationRequest};

/// Path of the migration endpoint.
pub const MIGRATION_ROUTE: &str = "/generate-migration-guide";

/// Shared state of the HTTP server.
pub struct AppState {
    ctx: ServiceContext,
    config: Config,
}

/// Builds the router serving [`MIGRATION_ROUTE`].
pub fn router(ctx: ServiceContext, config: Config) -> Router {
    Router::new()
        .route(MIGRATION_ROUTE, post(generate_guide))
        .with_state(Arc::new(AppState { ctx, config }))
}

/// Binds `addr` and serves until the process is interrupted.
///
/// # Errors
///
/// Returns an error string if the address cannot be bound or the server fails.
pub async fn run(ctx: ServiceContext, config: Config, addr: SocketAddr) -> Result<(), String> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind {addr}: {e}"))?;
    let local_addr = listener.local_addr().map_err(|e| e.to_string())?;
    info!(addr = %local_addr, route = MIGRATION_ROUTE, "serving migration endpoint");

    axum::serve(listener, router(ctx, config))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .map_err(|e| format!("HTTP server failed: {e}"))
}

/// A request whose connection drops has its future dropped, which stops
/// any outstanding outbound calls with it.
async fn generate_guide(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let request: MigrationRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            let err = MigrationError::from(ValidationError::new(format!("malformed JSON body: {e}")));
            return error_response(&ErrorPayload::from(&err));
        }
    };

    match request::handle(&state.ctx, &state.config, &request, Cancellation::never()).await {
        Ok(document) => document_response(document),
        Err(payload) => error_response(&payload),
    }
}

fn document_response(document: RenderedDocument) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", document.file_name);
    (
        StatusCode::OK,
        [(CONTENT_TYPE, document.content_type), (CONTENT_DISPOSITION, disposition)],
        Body::from(document.body),
    )
        .into_response()
}

fn error_response(payload: &ErrorPayload) -> Response {
    let status = StatusCode::from_u16(payload.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(payload.clone())).into_response()
}
