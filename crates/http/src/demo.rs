//! Standalone hello-world listener.

use anyhow::Context;
use axum::{http::header, response::IntoResponse, Router};

pub const HELLO_BODY: &str = "Hello World\n";

/// Router answering every path and method with the same plaintext body.
pub fn hello_router() -> Router {
    Router::new().fallback(hello)
}

async fn hello() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain")], HELLO_BODY)
}

/// Bind `host:port` and serve the hello router until the process ends.
pub async fn serve_hello(host: &str, port: u16) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(format!("{host}:{port}"))
        .await
        .with_context(|| format!("failed to bind demo listener to {host}:{port}"))?;

    tracing::info!("Server running at http://{host}:{port}/");

    axum::serve(listener, hello_router())
        .await
        .context("demo listener failed")?;

    Ok(())
}
