//! Webhook ingress. One POST route; every request is acknowledged with 200
//! no matter what happens downstream, so the platform never retries a
//! poisoned update at us forever.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use gavel_telegram::TelegramUpdate;
use tracing::{error, info, warn};

use crate::dispatch::Dispatcher;

pub fn router(dispatcher: Arc<Dispatcher>, path: &str) -> Router {
    Router::new()
        .route(path, post(receive_update))
        .with_state(dispatcher)
}

/// Binds the listener and serves until the task is aborted.
pub async fn serve(dispatcher: Arc<Dispatcher>, port: u16, path: &str) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, path, "webhook listening");
    axum::serve(listener, router(dispatcher, path))
        .await
        .context("webhook server terminated")?;
    Ok(())
}

async fn receive_update(
    State(dispatcher): State<Arc<Dispatcher>>,
    body: Bytes,
) -> StatusCode {
    let update: TelegramUpdate = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(err) => {
            warn!(error = %err, "discarding unparseable update payload");
            return StatusCode::OK;
        }
    };

    // Run the pipeline on its own task so a handler panic is contained
    // there instead of tearing down the connection handler.
    let handled = tokio::spawn(async move { dispatcher.handle_update(&update).await });
    if let Err(err) = handled.await {
        error!(error = %err, "update handler aborted");
    }
    StatusCode::OK
}
