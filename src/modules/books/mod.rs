pub mod handlers;
pub mod models;

use async_trait::async_trait;
use axum::{routing::get, Router};
use library_db::{Document, Filter};
use library_kernel::{InitCtx, Module};

use crate::{state::AppState, utils};

/// Books module: listing with resolved references, create form and guarded delete
pub struct BooksModule {
    state: AppState,
}

impl BooksModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let records = ctx
            .store
            .count(models::Book::COLLECTION, &Filter::all())
            .await?;
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            records,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/books", get(handlers::book_list))
            .route(
                "/book/create",
                get(handlers::book_create_get).post(handlers::book_create_post),
            )
            .route("/book/{id}", get(handlers::book_detail))
            .route(
                "/book/{id}/delete",
                get(handlers::book_delete_get).post(handlers::book_delete_post),
            )
            .route(
                "/book/{id}/update",
                get(handlers::book_update_get).post(handlers::book_update_post),
            )
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(utils::openapi_paths(
            "Books",
            &[
                ("get", "/books", "List books with author and genres"),
                ("get", "/book/create", "Book create form"),
                ("post", "/book/create", "Create a book"),
                ("get", "/book/{id}", "Book detail with its copies"),
                ("get", "/book/{id}/delete", "Book delete confirmation"),
                ("post", "/book/{id}/delete", "Delete a book that has no copies"),
                ("get", "/book/{id}/update", "Book update form (not implemented)"),
                ("post", "/book/{id}/update", "Update a book (not implemented)"),
            ],
        ))
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BooksModule::new(state))
}
