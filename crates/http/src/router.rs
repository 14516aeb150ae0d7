//! Router builder for the library HTTP server

use axum::{http::StatusCode, routing::get, Json, Router};
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::SetRequestIdLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};

use library_kernel::ModuleRegistry;

use crate::MakeRequestUuid;

/// Builder for constructing the main HTTP router
pub struct RouterBuilder {
    router: Router,
}

impl RouterBuilder {
    /// Create a new router builder
    pub fn new() -> Self {
        Self {
            router: Router::new(),
        }
    }

    /// Add a route to the router
    pub fn route(mut self, path: &str, route: axum::routing::MethodRouter) -> Self {
        self.router = self.router.route(path, route);
        self
    }

    /// Mount a module's router under `base_path`, or at the root when it is empty
    pub fn mount_module(mut self, base_path: &str, module_router: Router) -> Self {
        let base_path = base_path.trim_end_matches('/');
        self.router = if base_path.is_empty() {
            self.router.merge(module_router)
        } else {
            self.router.nest(base_path, module_router)
        };
        self
    }

    /// Add tracing middleware
    pub fn with_tracing(mut self) -> Self {
        self.router = self.router.layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_request(DefaultOnRequest::new().level(tracing::Level::INFO))
                .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
        );
        self
    }

    /// Add CORS middleware
    pub fn with_cors(mut self) -> Self {
        self.router = self.router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
        self
    }

    /// Add request ID middleware
    pub fn with_request_id(mut self) -> Self {
        self.router = self
            .router
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));
        self
    }

    /// Add timeout middleware
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.router = self
            .router
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_millis(timeout_ms),
            ));
        self
    }

    /// Serve the OpenAPI document merged from every module's fragment
    pub fn with_openapi(mut self, registry: &ModuleRegistry, base_path: &str) -> Self {
        let document = merged_openapi(registry, base_path);
        self.router = self.router.route(
            "/docs/openapi.json",
            get(move || {
                let document = document.clone();
                async move { Json(document) }
            }),
        );
        self
    }

    /// Build the final router
    pub fn build(self) -> Router {
        self.router
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Merge module fragments into one document and check it against the OpenAPI model.
pub fn merged_openapi(registry: &ModuleRegistry, base_path: &str) -> utoipa::openapi::OpenApi {
    let base_path = base_path.trim_end_matches('/');
    let mut openapi_spec = serde_json::json!({
        "openapi": "3.1.0",
        "info": {
            "title": "Local Library API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Catalog of authors, books, genres and book copies"
        },
        "paths": {
            "/healthz": {
                "get": {
                    "summary": "Health check",
                    "responses": { "200": { "description": "OK" } }
                }
            }
        }
    });

    for module in registry.modules() {
        let Some(module_spec) = module.openapi() else {
            continue;
        };
        if let Some(paths) = module_spec.get("paths").and_then(|p| p.as_object()) {
            for (path, path_item) in paths {
                let prefixed_path = format!("{}{}", base_path, path);
                openapi_spec["paths"][prefixed_path] = path_item.clone();
            }
        }
    }

    serde_json::from_value(openapi_spec).unwrap_or_else(|error| {
        tracing::warn!(%error, "merged OpenAPI document is invalid; serving an empty one");
        utoipa::openapi::OpenApiBuilder::new()
            .info(
                utoipa::openapi::InfoBuilder::new()
                    .title("Local Library API")
                    .version(env!("CARGO_PKG_VERSION"))
                    .build(),
            )
            .build()
    })
}
