use async_trait::async_trait;
use axum::{extract::State, response::Response, routing::get, Router};
use library_db::{Filter, StoreError};
use library_http::{error::AppError, view::View};
use library_kernel::{InitCtx, Module};
use serde::Serialize;

use crate::{state::AppState, utils};

use super::bookinstances::models::BookStatus;

/// Record totals shown on the home page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogCounts {
    pub book_count: u64,
    pub book_instance_count: u64,
    pub book_instance_available_count: u64,
    pub author_count: u64,
    pub genre_count: u64,
}

async fn counts(state: &AppState) -> Result<CatalogCounts, StoreError> {
    let (books, instances, authors, genres) = (
        state.books(),
        state.book_instances(),
        state.authors(),
        state.genres(),
    );
    let everything = Filter::all();
    let available = Filter::eq("status", BookStatus::Available.as_str());
    let (
        book_count,
        book_instance_count,
        book_instance_available_count,
        author_count,
        genre_count,
    ) = tokio::try_join!(
        books.count(&everything),
        instances.count(&everything),
        instances.count(&available),
        authors.count(&everything),
        genres.count(&everything)
    )?;

    Ok(CatalogCounts {
        book_count,
        book_instance_count,
        book_instance_available_count,
        author_count,
        genre_count,
    })
}

/// GET /
///
/// A failed count still renders the page, carrying the error text instead of data.
async fn index(State(state): State<AppState>) -> Result<Response, AppError> {
    let view = View::new("index", "Local Library Home");
    let view = match counts(&state).await {
        Ok(data) => view.with("data", data),
        Err(error) => {
            tracing::error!(error = %error, "failed to count catalog records");
            view.with("error", error.to_string())
        }
    };
    state.render(view)
}

/// Catalog home page with record totals
pub struct CatalogModule {
    state: AppState,
}

impl CatalogModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for CatalogModule {
    fn name(&self) -> &'static str {
        "catalog"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "catalog module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(index))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(utils::openapi_paths(
            "Catalog",
            &[("get", "/", "Home page with record totals")],
        ))
    }
}

/// Create a new instance of the catalog module
pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(CatalogModule::new(state))
}
