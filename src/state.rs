use std::sync::Arc;

use axum::response::{IntoResponse, Redirect, Response};
use library_db::{Collection, DocumentStore};
use library_http::{
    error::AppError,
    view::{View, ViewRenderer},
};

use crate::modules::{
    authors::models::Author, bookinstances::models::BookInstance, books::models::Book,
    genres::models::Genre,
};

/// Collaborators every handler needs, passed through axum state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub renderer: Arc<dyn ViewRenderer>,
    base_path: Arc<str>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, renderer: Arc<dyn ViewRenderer>) -> Self {
        Self {
            store,
            renderer,
            base_path: Arc::from(""),
        }
    }

    /// Prefix applied to redirect locations when routes are mounted below the root.
    pub fn with_base_path(mut self, base_path: &str) -> Self {
        self.base_path = Arc::from(base_path.trim_end_matches('/'));
        self
    }

    pub fn authors(&self) -> Collection<Author> {
        Collection::new(Arc::clone(&self.store))
    }

    pub fn books(&self) -> Collection<Book> {
        Collection::new(Arc::clone(&self.store))
    }

    pub fn genres(&self) -> Collection<Genre> {
        Collection::new(Arc::clone(&self.store))
    }

    pub fn book_instances(&self) -> Collection<BookInstance> {
        Collection::new(Arc::clone(&self.store))
    }

    pub fn render(&self, view: View) -> Result<Response, AppError> {
        Ok(self.renderer.render(view)?)
    }

    pub fn redirect(&self, location: &str) -> Response {
        Redirect::to(&format!("{}{}", self.base_path, location)).into_response()
    }
}
