//! HTTP server facade for the Local Library: Axum router, error mapping and views.

use std::future::Future;

use anyhow::Context;
use axum::{extract::Request, http::HeaderValue, routing::get, Router};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::{Timestamp, Uuid};

use library_kernel::{settings::Settings, ModuleRegistry};

pub mod demo;
pub mod error;
pub mod router;
pub mod view;

use router::RouterBuilder;

/// Start the HTTP server and serve until `shutdown` resolves
pub async fn start_server(
    registry: &ModuleRegistry,
    settings: &Settings,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = build_router(registry, settings);

    let listener = tokio::net::TcpListener::bind(settings.server_addr())
        .await
        .with_context(|| format!("failed to bind to {}", settings.server_addr()))?;

    tracing::info!(
        "HTTP server listening on http://{}{}",
        settings.server_addr(),
        settings.server.base_path
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")?;

    Ok(())
}

/// Build the main HTTP router with all module routes mounted
pub fn build_router(registry: &ModuleRegistry, settings: &Settings) -> Router {
    let base_path = settings.server.base_path.as_str();
    let module_routes = registry.modules().iter().fold(Router::new(), |routes, module| {
        tracing::info!(
            module = module.name(),
            "mounting module routes under '{}'",
            if base_path.is_empty() { "/" } else { base_path }
        );
        routes.merge(module.routes())
    });

    // Layers wrap only the routes registered before them.
    RouterBuilder::new()
        .route("/healthz", get(health_check))
        .mount_module(base_path, module_routes)
        .with_openapi(registry, base_path)
        .with_tracing()
        .with_cors()
        .with_request_id()
        .with_timeout(settings.server.request_timeout_ms)
        .build()
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "ok"
}

/// Request ID generator for tracing
#[derive(Clone)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let timestamp = Timestamp::now(uuid::NoContext);
        let request_id = Uuid::new_v7(timestamp)
            .to_string()
            .parse::<HeaderValue>()
            .ok()?;
        Some(RequestId::new(request_id))
    }
}
