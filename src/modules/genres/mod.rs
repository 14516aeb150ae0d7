pub mod handlers;
pub mod models;

use async_trait::async_trait;
use axum::{routing::get, Router};
use library_db::{Document, Filter};
use library_kernel::{InitCtx, Module};

use crate::{state::AppState, utils};

/// Genres module: listing, detail, idempotent create and guarded delete
pub struct GenresModule {
    state: AppState,
}

impl GenresModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for GenresModule {
    fn name(&self) -> &'static str {
        "genres"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let records = ctx
            .store
            .count(models::Genre::COLLECTION, &Filter::all())
            .await?;
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            records,
            "genres module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/genres", get(handlers::genre_list))
            .route(
                "/genre/create",
                get(handlers::genre_create_get).post(handlers::genre_create_post),
            )
            .route("/genre/{id}", get(handlers::genre_detail))
            .route(
                "/genre/{id}/delete",
                get(handlers::genre_delete_get).post(handlers::genre_delete_post),
            )
            .route(
                "/genre/{id}/update",
                get(handlers::genre_update_get).post(handlers::genre_update_post),
            )
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(utils::openapi_paths(
            "Genres",
            &[
                ("get", "/genres", "List genres by name"),
                ("get", "/genre/create", "Genre create form"),
                ("post", "/genre/create", "Create a genre, reusing one with the same name"),
                ("get", "/genre/{id}", "Genre detail with its books"),
                ("get", "/genre/{id}/delete", "Genre delete confirmation"),
                ("post", "/genre/{id}/delete", "Delete a genre no book refers to"),
                ("get", "/genre/{id}/update", "Genre update form (not implemented)"),
                ("post", "/genre/{id}/update", "Update a genre (not implemented)"),
            ],
        ))
    }
}

/// Create a new instance of the genres module
pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(GenresModule::new(state))
}
