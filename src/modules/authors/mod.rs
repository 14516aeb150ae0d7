pub mod handlers;
pub mod models;

use async_trait::async_trait;
use axum::{routing::get, Router};
use library_db::{Document, Filter};
use library_kernel::{InitCtx, Module};

use crate::{state::AppState, utils};

/// Authors module: listing, detail, create and delete guarded by authored books
pub struct AuthorsModule {
    state: AppState,
}

impl AuthorsModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for AuthorsModule {
    fn name(&self) -> &'static str {
        "authors"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let records = ctx
            .store
            .count(models::Author::COLLECTION, &Filter::all())
            .await?;
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            records,
            "authors module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/authors", get(handlers::author_list))
            .route(
                "/author/create",
                get(handlers::author_create_get).post(handlers::author_create_post),
            )
            .route("/author/{id}", get(handlers::author_detail))
            .route(
                "/author/{id}/delete",
                get(handlers::author_delete_get).post(handlers::author_delete_post),
            )
            .route(
                "/author/{id}/update",
                get(handlers::author_update_get).post(handlers::author_update_post),
            )
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(utils::openapi_paths(
            "Authors",
            &[
                ("get", "/authors", "List authors by family name"),
                ("get", "/author/create", "Author create form"),
                ("post", "/author/create", "Create an author"),
                ("get", "/author/{id}", "Author detail with their books"),
                ("get", "/author/{id}/delete", "Author delete confirmation"),
                ("post", "/author/{id}/delete", "Delete an author without books"),
                ("get", "/author/{id}/update", "Author update form (not implemented)"),
                ("post", "/author/{id}/update", "Update an author (not implemented)"),
            ],
        ))
    }
}

/// Create a new instance of the authors module
pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(AuthorsModule::new(state))
}
