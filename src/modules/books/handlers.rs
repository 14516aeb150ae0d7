use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Form,
};
use library_db::{Filter, RecordId, Sort, StoreError};
use library_http::{error::AppError, view::View};

use super::models::{by_id, Book, BookView, GenreChoice};
use crate::{
    modules::{
        authors::models::AuthorView,
        bookinstances::models::{BookInstance, BookInstanceView},
        Linked, Routable,
    },
    state::AppState,
    utils,
    validation::{FieldRules, FormData, Rules},
};

fn required(name: &'static str, message: &'static str) -> FieldRules {
    FieldRules::new(name).trim().non_empty(message).escape()
}

fn book_rules() -> Rules {
    Rules::new()
        .field(required("title", "Title must not be empty."))
        .field(required("author", "Author must not be empty."))
        .field(required("summary", "Summary must not be empty."))
        .field(required("isbn", "ISBN must not be empty"))
        .field(FieldRules::new("genre").multiple().trim().escape())
}

/// The book together with its copies
async fn load_with_instances(
    state: &AppState,
    id: &RecordId,
) -> Result<(Option<Book>, Vec<BookInstance>), StoreError> {
    let books = state.books();
    let instances = state.book_instances();
    let copies_of = Filter::eq("book", id);
    tokio::try_join!(books.find_by_id(id), instances.find_all(&copies_of, None))
}

/// Resolve the author and genre references of one book
async fn expand(state: &AppState, book: Book) -> Result<BookView, StoreError> {
    let authors = state.authors();
    let genres = state.genres();
    let everything = Filter::all();
    let (author, genres) = tokio::try_join!(
        authors.find_by_id(&book.author),
        genres.find_all(&everything, None)
    )?;
    Ok(BookView::expand(book, &by_id(author.as_slice()), &by_id(&genres)))
}

/// Authors and genres offered by the book form
async fn form_choices(
    state: &AppState,
    checked: &[String],
) -> Result<(Vec<AuthorView>, Vec<GenreChoice>), StoreError> {
    let authors = state.authors();
    let genres = state.genres();
    let everything = Filter::all();
    let by_family_name = Sort::ascending("family_name");
    let by_name = Sort::ascending("name");
    let (authors, genres) = tokio::try_join!(
        authors.find_all(&everything, Some(&by_family_name)),
        genres.find_all(&everything, Some(&by_name))
    )?;

    let authors = authors.into_iter().map(AuthorView::from).collect();
    let genres = genres
        .into_iter()
        .map(|genre| GenreChoice {
            checked: checked.iter().any(|id| id == genre.id.as_str()),
            genre: Linked::new(genre),
        })
        .collect();
    Ok((authors, genres))
}

fn instance_views(instances: Vec<BookInstance>) -> Vec<BookInstanceView> {
    instances
        .into_iter()
        .map(|instance| BookInstanceView::new(instance, None))
        .collect()
}

async fn delete_view(
    state: &AppState,
    book: Book,
    book_instances: Vec<BookInstance>,
) -> Result<View, StoreError> {
    Ok(View::new("book_delete", "Delete Book")
        .with("book", expand(state, book).await?)
        .with("book_instances", instance_views(book_instances)))
}

/// GET /books
pub async fn book_list(State(state): State<AppState>) -> Result<Response, AppError> {
    let (books, authors, genres) = (state.books(), state.authors(), state.genres());
    let everything = Filter::all();
    let (books, authors, genres) = tokio::try_join!(
        books.find_all(&everything, None),
        authors.find_all(&everything, None),
        genres.find_all(&everything, None)
    )?;

    let authors = by_id(&authors);
    let genres = by_id(&genres);
    let book_list: Vec<BookView> = books
        .into_iter()
        .map(|book| BookView::expand(book, &authors, &genres))
        .collect();

    state.render(View::new("book_list", "Book List").with("book_list", book_list))
}

/// GET /book/{id}
pub async fn book_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let (book, book_instances) = load_with_instances(&state, &RecordId::from(id)).await?;
    let book = book.ok_or_else(|| AppError::not_found("Book not found"))?;
    let title = book.title.clone();
    let book = expand(&state, book).await?;

    state.render(
        View::new("book_detail", title)
            .with("book", book)
            .with("book_instances", instance_views(book_instances)),
    )
}

/// GET /book/create
pub async fn book_create_get(State(state): State<AppState>) -> Result<Response, AppError> {
    let (authors, genres) = form_choices(&state, &[]).await?;

    state.render(
        View::new("book_form", "Create Book")
            .with("authors", authors)
            .with("genres", genres),
    )
}

/// POST /book/create
pub async fn book_create_post(
    State(state): State<AppState>,
    Form(form): Form<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let validated = book_rules().validate(&FormData::from(form));
    if !validated.is_valid() {
        let (authors, genres) = form_choices(&state, validated.values("genre")).await?;
        return state.render(
            View::new("book_form", "Create Book")
                .with("authors", authors)
                .with("genres", genres)
                .with("book", validated.echo())
                .with("errors", validated.errors())
                .with_status(StatusCode::UNPROCESSABLE_ENTITY),
        );
    }

    let book = Book::new(
        validated.value("title"),
        RecordId::from(validated.value("author")),
        validated.value("summary"),
        validated.value("isbn"),
        validated
            .values("genre")
            .iter()
            .map(|id| RecordId::from(id.as_str()))
            .collect(),
    );
    state.books().save(&book).await?;
    tracing::info!(book = %book.id, author = %book.author, "book created");

    Ok(state.redirect(&book.url()))
}

/// GET /book/{id}/delete
pub async fn book_delete_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let (book, book_instances) = load_with_instances(&state, &RecordId::from(id)).await?;
    match book {
        Some(book) => state.render(delete_view(&state, book, book_instances).await?),
        None => Ok(state.redirect("/books")),
    }
}

/// POST /book/{id}/delete
///
/// Refuses to delete while copies of the book exist.
pub async fn book_delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let (book, book_instances) = load_with_instances(&state, &RecordId::from(id)).await?;
    let Some(book) = book else {
        return Ok(state.redirect("/books"));
    };

    if !book_instances.is_empty() {
        tracing::info!(
            book = %book.id,
            copies = book_instances.len(),
            "book still has copies; not deleted"
        );
        return state.render(delete_view(&state, book, book_instances).await?);
    }

    state.books().remove_by_id(&book.id).await?;
    tracing::info!(book = %book.id, "book deleted");

    Ok(state.redirect("/books"))
}

/// GET /book/{id}/update
pub async fn book_update_get() -> Response {
    utils::not_implemented("Book update GET")
}

/// POST /book/{id}/update
pub async fn book_update_post() -> Response {
    utils::not_implemented("Book update POST")
}
