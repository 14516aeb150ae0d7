use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Form,
};
use library_db::{Filter, RecordId, Sort, StoreError};
use library_http::{error::AppError, view::View};

use super::models::{Author, AuthorView};
use crate::{
    modules::{books::models::BookSummary, linked, Routable},
    state::AppState,
    utils,
    validation::{FieldRules, FormData, Rules},
};

fn author_rules() -> Rules {
    Rules::new()
        .field(
            FieldRules::new("first_name")
                .trim()
                .non_empty("First name must be specified.")
                .alphanumeric("First name has non-alphanumeric characters.")
                .escape(),
        )
        .field(
            FieldRules::new("family_name")
                .trim()
                .non_empty("Family name must be specified.")
                .alphanumeric("Family name has non-alphanumeric characters.")
                .escape(),
        )
        .field(
            FieldRules::new("date_of_birth")
                .optional()
                .trim()
                .iso8601("Invalid date of birth"),
        )
        .field(
            FieldRules::new("date_of_death")
                .optional()
                .trim()
                .iso8601("Invalid date of death"),
        )
}

/// The author together with the books they wrote
async fn load_with_books(
    state: &AppState,
    id: &RecordId,
) -> Result<(Option<Author>, Vec<BookSummary>), StoreError> {
    let authors = state.authors();
    let books = state.books();
    let written_by = Filter::eq("author", id);
    tokio::try_join!(
        authors.find_by_id(id),
        books.find_projected::<BookSummary>(&written_by, None, &["title", "summary"])
    )
}

fn delete_view(author: Author, author_books: Vec<BookSummary>) -> View {
    View::new("author_delete", "Delete Author")
        .with("author", AuthorView::from(author))
        .with("author_books", linked(author_books))
}

/// GET /authors
pub async fn author_list(State(state): State<AppState>) -> Result<Response, AppError> {
    let authors = state
        .authors()
        .find_all(&Filter::all(), Some(&Sort::ascending("family_name")))
        .await?;
    let author_list: Vec<AuthorView> = authors.into_iter().map(AuthorView::from).collect();

    state.render(View::new("author_list", "Author List").with("author_list", author_list))
}

/// GET /author/{id}
pub async fn author_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let (author, author_books) = load_with_books(&state, &RecordId::from(id)).await?;
    let author = author.ok_or_else(|| AppError::not_found("Author not found"))?;

    state.render(
        View::new("author_detail", "Author Detail")
            .with("author", AuthorView::from(author))
            .with("author_books", linked(author_books)),
    )
}

/// GET /author/create
pub async fn author_create_get(State(state): State<AppState>) -> Result<Response, AppError> {
    state.render(View::new("author_form", "Create Author"))
}

/// POST /author/create
pub async fn author_create_post(
    State(state): State<AppState>,
    Form(form): Form<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let validated = author_rules().validate(&FormData::from(form));
    if !validated.is_valid() {
        return state.render(
            View::new("author_form", "Create Author")
                .with("author", validated.echo())
                .with("errors", validated.errors())
                .with_status(StatusCode::UNPROCESSABLE_ENTITY),
        );
    }

    let author = Author::new(
        validated.value("first_name"),
        validated.value("family_name"),
        validated.date("date_of_birth"),
        validated.date("date_of_death"),
    );
    state.authors().save(&author).await?;
    tracing::info!(author = %author.id, "author created");

    Ok(state.redirect(&author.url()))
}

/// GET /author/{id}/delete
pub async fn author_delete_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let (author, author_books) = load_with_books(&state, &RecordId::from(id)).await?;
    match author {
        Some(author) => state.render(delete_view(author, author_books)),
        None => Ok(state.redirect("/authors")),
    }
}

/// POST /author/{id}/delete
///
/// Refuses to delete while any book still refers to the author.
pub async fn author_delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let (author, author_books) = load_with_books(&state, &RecordId::from(id)).await?;
    let Some(author) = author else {
        return Ok(state.redirect("/authors"));
    };

    if !author_books.is_empty() {
        tracing::info!(
            author = %author.id,
            books = author_books.len(),
            "author still has books; not deleted"
        );
        return state.render(delete_view(author, author_books));
    }

    state.authors().remove_by_id(&author.id).await?;
    tracing::info!(author = %author.id, "author deleted");

    Ok(state.redirect("/authors"))
}

/// GET /author/{id}/update
pub async fn author_update_get() -> Response {
    utils::not_implemented("Author update GET")
}

/// POST /author/{id}/update
pub async fn author_update_post() -> Response {
    utils::not_implemented("Author update POST")
}
