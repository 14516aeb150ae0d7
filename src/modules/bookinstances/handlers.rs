use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Form,
};
use library_db::{Filter, RecordId, Sort, StoreError};
use library_http::{error::AppError, view::View};

use super::models::{BookInstance, BookInstanceView, BookStatus};
use crate::{
    modules::{books::models::BookSummary, linked, Routable},
    state::AppState,
    utils,
    validation::{FieldRules, FormData, Rules},
};

fn is_status(value: &str) -> bool {
    value.is_empty() || value.parse::<BookStatus>().is_ok()
}

fn book_instance_rules() -> Rules {
    Rules::new()
        .field(
            FieldRules::new("book")
                .trim()
                .non_empty("Book must be specified")
                .escape(),
        )
        .field(
            FieldRules::new("imprint")
                .trim()
                .non_empty("Imprint must be specified")
                .escape(),
        )
        .field(
            FieldRules::new("due_back")
                .optional()
                .trim()
                .iso8601("Invalid date"),
        )
        .field(
            FieldRules::new("status")
                .trim()
                .check(is_status, "Invalid status")
                .escape(),
        )
}

/// Book titles offered by the copy form, sorted for the select list
async fn book_choices(state: &AppState) -> Result<Vec<BookSummary>, StoreError> {
    state
        .books()
        .find_projected::<BookSummary>(&Filter::all(), Some(&Sort::ascending("title")), &["title"])
        .await
}

async fn expand_one(
    state: &AppState,
    instance: BookInstance,
) -> Result<BookInstanceView, StoreError> {
    let book = state
        .books()
        .find_projected::<BookSummary>(&Filter::eq("id", &instance.book), None, &["title"])
        .await?
        .into_iter()
        .next();
    Ok(BookInstanceView::new(instance, book))
}

fn status_choices() -> Vec<&'static str> {
    BookStatus::ALL.iter().map(BookStatus::as_str).collect()
}

/// GET /bookinstances
pub async fn book_instance_list(State(state): State<AppState>) -> Result<Response, AppError> {
    let (instances, books) = (state.book_instances(), state.books());
    let everything = Filter::all();
    let (instances, books) = tokio::try_join!(
        instances.find_all(&everything, None),
        books.find_projected::<BookSummary>(&everything, None, &["title"])
    )?;

    let titles: HashMap<RecordId, BookSummary> = books
        .into_iter()
        .map(|book| (book.id.clone(), book))
        .collect();
    let book_instance_list: Vec<BookInstanceView> = instances
        .into_iter()
        .map(|instance| {
            let book = titles.get(&instance.book).cloned();
            BookInstanceView::new(instance, book)
        })
        .collect();

    state.render(
        View::new("bookinstance_list", "Book Instance List")
            .with("bookinstance_list", book_instance_list),
    )
}

/// GET /bookinstance/{id}
pub async fn book_instance_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let instance = state
        .book_instances()
        .find_by_id(&RecordId::from(id))
        .await?
        .ok_or_else(|| AppError::not_found("Book copy not found"))?;
    let view = expand_one(&state, instance).await?;

    let title = match &view.book {
        Some(book) => format!("Copy: {}", book.record.title),
        None => "Copy".to_string(),
    };
    state.render(View::new("bookinstance_detail", title).with("bookinstance", view))
}

/// GET /bookinstance/create
pub async fn book_instance_create_get(
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let book_list = book_choices(&state).await?;

    state.render(
        View::new("bookinstance_form", "Create BookInstance")
            .with("book_list", linked(book_list))
            .with("statuses", status_choices()),
    )
}

/// POST /bookinstance/create
pub async fn book_instance_create_post(
    State(state): State<AppState>,
    Form(form): Form<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let validated = book_instance_rules().validate(&FormData::from(form));
    if !validated.is_valid() {
        let book_list = book_choices(&state).await?;
        return state.render(
            View::new("bookinstance_form", "Create BookInstance")
                .with("book_list", linked(book_list))
                .with("statuses", status_choices())
                .with("selected_book", validated.value("book"))
                .with("bookinstance", validated.echo())
                .with("errors", validated.errors())
                .with_status(StatusCode::UNPROCESSABLE_ENTITY),
        );
    }

    let status = validated.value("status").parse().unwrap_or_default();
    let instance = BookInstance::new(
        RecordId::from(validated.value("book")),
        validated.value("imprint"),
        status,
        validated.date("due_back"),
    );
    state.book_instances().save(&instance).await?;
    tracing::info!(
        book_instance = %instance.id,
        book = %instance.book,
        status = %instance.status,
        "book copy created"
    );

    Ok(state.redirect(&instance.url()))
}

/// GET /bookinstance/{id}/delete
pub async fn book_instance_delete_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let instance = state
        .book_instances()
        .find_by_id(&RecordId::from(id))
        .await?;
    let Some(instance) = instance else {
        return Ok(state.redirect("/bookinstances"));
    };

    let view = expand_one(&state, instance).await?;
    state.render(View::new("bookinstance_delete", "Delete BookInstance").with("bookinstance", view))
}

/// POST /bookinstance/{id}/delete
pub async fn book_instance_delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = RecordId::from(id);
    if state.book_instances().remove_by_id(&id).await? {
        tracing::info!(book_instance = %id, "book copy deleted");
    }

    Ok(state.redirect("/bookinstances"))
}

/// GET /bookinstance/{id}/update
pub async fn book_instance_update_get() -> Response {
    utils::not_implemented("BookInstance update GET")
}

/// POST /bookinstance/{id}/update
pub async fn book_instance_update_post() -> Response {
    utils::not_implemented("BookInstance update POST")
}
