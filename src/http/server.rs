use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{HeaderMap, Method, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, Instrument};

use super::dispatcher::Dispatcher;
use crate::telemetry::{create_request_span, generate_correlation_id};

/// Every path and every method lands on the dispatcher
pub fn router(dispatcher: Dispatcher) -> Router {
    Router::new().fallback(handle_request).with_state(dispatcher)
}

async fn handle_request(
    State(dispatcher): State<Dispatcher>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let correlation_id = generate_correlation_id();
    let span = create_request_span(method.as_str(), uri.path(), &correlation_id);

    async move {
        match dispatcher.dispatch(&method, &headers).await {
            Ok(response) => response,
            Err(e) => e.into_response(),
        }
    }
    .instrument(span)
    .await
}

/// Serve HTCPCP on `addr` until `shutdown` resolves
pub async fn serve<F>(addr: SocketAddr, dispatcher: Dispatcher, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "HTCPCP server listening");

    axum::serve(listener, router(dispatcher))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Fatal server error")?;

    Ok(())
}
