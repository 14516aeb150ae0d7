use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Form,
};
use library_db::{Collection, Filter, RecordId, Sort, StoreError};
use library_http::{error::AppError, view::View};

use super::models::Genre;
use crate::{
    modules::{books::models::BookSummary, linked, Linked, Routable},
    state::AppState,
    utils,
    validation::{self, FieldRules, FormData, Rules},
};

fn genre_rules() -> Rules {
    Rules::new().field(
        FieldRules::new("name")
            .trim()
            .non_empty("Genre name required")
            .escape(),
    )
}

/// The genre together with the books filed under it
async fn load_with_books(
    state: &AppState,
    id: &RecordId,
) -> Result<(Option<Genre>, Vec<BookSummary>), StoreError> {
    let genres = state.genres();
    let books = state.books();
    let filed_under = Filter::eq("genre", id);
    tokio::try_join!(
        genres.find_by_id(id),
        books.find_projected::<BookSummary>(&filed_under, None, &["title", "summary"])
    )
}

fn delete_view(genre: Genre, genre_books: Vec<BookSummary>) -> View {
    View::new("genre_delete", "Delete Genre")
        .with("genre", Linked::new(genre))
        .with("genre_books", linked(genre_books))
}

/// GET /genres
pub async fn genre_list(State(state): State<AppState>) -> Result<Response, AppError> {
    let genres = state
        .genres()
        .find_all(&Filter::all(), Some(&Sort::ascending("name")))
        .await?;

    state.render(View::new("genre_list", "Genre List").with("genre_list", linked(genres)))
}

/// GET /genre/{id}
pub async fn genre_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let (genre, genre_books) = load_with_books(&state, &RecordId::from(id)).await?;
    let genre = genre.ok_or_else(|| AppError::not_found("Genre not found"))?;

    state.render(
        View::new("genre_detail", "Genre Detail")
            .with("genre", Linked::new(genre))
            .with("genre_books", linked(genre_books)),
    )
}

/// GET /genre/create
pub async fn genre_create_get(State(state): State<AppState>) -> Result<Response, AppError> {
    state.render(View::new("genre_form", "Create Genre"))
}

/// Existing genre stored under either the sanitized or the trimmed raw name.
///
/// Records loaded from seed files keep their names unescaped.
async fn find_by_name(
    genres: &Collection<Genre>,
    sanitized: &str,
    submitted: &str,
) -> Result<Option<Genre>, StoreError> {
    if let Some(existing) = genres.find_one(&Filter::eq("name", sanitized)).await? {
        return Ok(Some(existing));
    }
    if submitted == sanitized {
        return Ok(None);
    }
    genres.find_one(&Filter::eq("name", submitted)).await
}

/// POST /genre/create
///
/// Reuses an existing genre with the same name instead of inserting a duplicate.
pub async fn genre_create_post(
    State(state): State<AppState>,
    Form(form): Form<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let form = FormData::from(form);
    let validated = genre_rules().validate(&form);
    if !validated.is_valid() {
        return state.render(
            View::new("genre_form", "Create Genre")
                .with("genre", validated.echo())
                .with("errors", validated.errors())
                .with_status(StatusCode::UNPROCESSABLE_ENTITY),
        );
    }

    let genres = state.genres();
    let name = validated.value("name");
    let submitted = validation::trim(form.values("name").next().unwrap_or_default());
    if let Some(existing) = find_by_name(&genres, name, &submitted).await? {
        tracing::debug!(genre = %existing.id, "genre name already taken; reusing record");
        return Ok(state.redirect(&existing.url()));
    }

    let genre = Genre::new(name);
    genres.save(&genre).await?;
    tracing::info!(genre = %genre.id, "genre created");

    Ok(state.redirect(&genre.url()))
}

/// GET /genre/{id}/delete
pub async fn genre_delete_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let (genre, genre_books) = load_with_books(&state, &RecordId::from(id)).await?;
    match genre {
        Some(genre) => state.render(delete_view(genre, genre_books)),
        None => Ok(state.redirect("/genres")),
    }
}

/// POST /genre/{id}/delete
pub async fn genre_delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let (genre, genre_books) = load_with_books(&state, &RecordId::from(id)).await?;
    let Some(genre) = genre else {
        return Ok(state.redirect("/genres"));
    };

    if !genre_books.is_empty() {
        tracing::info!(genre = %genre.id, books = genre_books.len(), "genre still in use; not deleted");
        return state.render(delete_view(genre, genre_books));
    }

    state.genres().remove_by_id(&genre.id).await?;
    tracing::info!(genre = %genre.id, "genre deleted");

    Ok(state.redirect("/genres"))
}

/// GET /genre/{id}/update
pub async fn genre_update_get() -> Response {
    utils::not_implemented("Genre update GET")
}

/// POST /genre/{id}/update
pub async fn genre_update_post() -> Response {
    utils::not_implemented("Genre update POST")
}
