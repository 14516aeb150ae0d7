pub mod handlers;
pub mod models;

use async_trait::async_trait;
use axum::{routing::get, Router};
use library_db::{Document, Filter};
use library_kernel::{InitCtx, Module};

use crate::{state::AppState, utils};

/// Book copies module: circulation status and due dates of physical copies
pub struct BookInstancesModule {
    state: AppState,
}

impl BookInstancesModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for BookInstancesModule {
    fn name(&self) -> &'static str {
        "bookinstances"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let records = ctx
            .store
            .count(models::BookInstance::COLLECTION, &Filter::all())
            .await?;
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            records,
            "bookinstances module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/bookinstances", get(handlers::book_instance_list))
            .route(
                "/bookinstance/create",
                get(handlers::book_instance_create_get).post(handlers::book_instance_create_post),
            )
            .route("/bookinstance/{id}", get(handlers::book_instance_detail))
            .route(
                "/bookinstance/{id}/delete",
                get(handlers::book_instance_delete_get).post(handlers::book_instance_delete_post),
            )
            .route(
                "/bookinstance/{id}/update",
                get(handlers::book_instance_update_get).post(handlers::book_instance_update_post),
            )
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(utils::openapi_paths(
            "BookInstances",
            &[
                ("get", "/bookinstances", "List book copies with their titles"),
                ("get", "/bookinstance/create", "Book copy create form"),
                ("post", "/bookinstance/create", "Create a book copy"),
                ("get", "/bookinstance/{id}", "Book copy detail"),
                ("get", "/bookinstance/{id}/delete", "Book copy delete confirmation"),
                ("post", "/bookinstance/{id}/delete", "Delete a book copy"),
                ("get", "/bookinstance/{id}/update", "Book copy update form (not implemented)"),
                ("post", "/bookinstance/{id}/update", "Update a book copy (not implemented)"),
            ],
        ))
    }
}

/// Create a new instance of the book copies module
pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BookInstancesModule::new(state))
}
