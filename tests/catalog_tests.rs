use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use library_app::{
    modules::{
        authors::models::Author, bookinstances::models::BookInstance, books::models::Book,
        genres::models::Genre, register_all,
    },
    AppState,
};
use library_db::{DocumentStore, Filter, MemoryStore, RecordId, Sort, StoreError};
use library_http::view::JsonRenderer;
use library_kernel::{settings::Settings, ModuleRegistry};
use serde_json::Value;
use tower::ServiceExt;

fn app_with(store: Arc<dyn DocumentStore>, base_path: &str) -> (Router, AppState) {
    let mut settings = Settings::default();
    settings.server.base_path = base_path.to_string();

    let state = AppState::new(store, Arc::new(JsonRenderer)).with_base_path(base_path);
    let mut registry = ModuleRegistry::new();
    register_all(&mut registry, &state).unwrap();

    (library_http::build_router(&registry, &settings), state)
}

fn app() -> (Router, AppState) {
    app_with(Arc::new(MemoryStore::new()), "")
}

struct Reply {
    status: StatusCode,
    location: Option<String>,
    body: String,
}

impl Reply {
    fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

async fn send(app: &Router, request: Request<Body>) -> Reply {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .map(|value| value.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    Reply {
        status,
        location,
        body: String::from_utf8(bytes.to_vec()).unwrap(),
    }
}

async fn get(app: &Router, uri: &str) -> Reply {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

fn encode(value: &str) -> String {
    value
        .bytes()
        .map(|byte| match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' => {
                (byte as char).to_string()
            }
            other => format!("%{other:02X}"),
        })
        .collect()
}

async fn post_form(app: &Router, uri: &str, fields: &[(&str, &str)]) -> Reply {
    let body = fields
        .iter()
        .map(|(key, value)| format!("{}={}", encode(key), encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

/// Store whose every operation fails.
struct UnavailableStore;

#[async_trait]
impl DocumentStore for UnavailableStore {
    async fn find_all(
        &self,
        collection: &str,
        _filter: &Filter,
        _sort: Option<&Sort>,
        _projection: Option<&[&str]>,
    ) -> Result<Vec<Value>, StoreError> {
        Err(StoreError::backend(collection, "connection refused"))
    }

    async fn find_by_id(&self, collection: &str, _id: &RecordId) -> Result<Option<Value>, StoreError> {
        Err(StoreError::backend(collection, "connection refused"))
    }

    async fn find_one(&self, collection: &str, _filter: &Filter) -> Result<Option<Value>, StoreError> {
        Err(StoreError::backend(collection, "connection refused"))
    }

    async fn count(&self, collection: &str, _filter: &Filter) -> Result<u64, StoreError> {
        Err(StoreError::backend(collection, "connection refused"))
    }

    async fn save(&self, collection: &str, _id: &RecordId, _document: Value) -> Result<(), StoreError> {
        Err(StoreError::backend(collection, "connection refused"))
    }

    async fn remove_by_id(&self, collection: &str, _id: &RecordId) -> Result<bool, StoreError> {
        Err(StoreError::backend(collection, "connection refused"))
    }
}

/// Store that serves single-record lookups but fails every listing.
struct ListingsUnavailable(MemoryStore);

#[async_trait]
impl DocumentStore for ListingsUnavailable {
    async fn find_all(
        &self,
        collection: &str,
        _filter: &Filter,
        _sort: Option<&Sort>,
        _projection: Option<&[&str]>,
    ) -> Result<Vec<Value>, StoreError> {
        Err(StoreError::backend(collection, "query timed out"))
    }

    async fn find_by_id(&self, collection: &str, id: &RecordId) -> Result<Option<Value>, StoreError> {
        self.0.find_by_id(collection, id).await
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Value>, StoreError> {
        self.0.find_one(collection, filter).await
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        self.0.count(collection, filter).await
    }

    async fn save(&self, collection: &str, id: &RecordId, document: Value) -> Result<(), StoreError> {
        self.0.save(collection, id, document).await
    }

    async fn remove_by_id(&self, collection: &str, id: &RecordId) -> Result<bool, StoreError> {
        self.0.remove_by_id(collection, id).await
    }
}

#[tokio::test]
async fn health_check_answers_ok() {
    let (app, _) = app();
    let reply = get(&app, "/healthz").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, "ok");
}

#[tokio::test]
async fn genre_create_reuses_existing_name() {
    let (app, state) = app();

    let first = post_form(&app, "/genre/create", &[("name", "Fantasy")]).await;
    assert_eq!(first.status, StatusCode::SEE_OTHER);
    let location = first.location.unwrap();
    assert!(location.starts_with("/genre/"));

    let second = post_form(&app, "/genre/create", &[("name", "  Fantasy ")]).await;
    assert_eq!(second.status, StatusCode::SEE_OTHER);
    assert_eq!(second.location.unwrap(), location);

    assert_eq!(state.genres().count(&Filter::all()).await.unwrap(), 1);

    let detail = get(&app, &location).await.json();
    assert_eq!(detail["view"], "genre_detail");
    assert_eq!(detail["genre"]["name"], "Fantasy");
    assert_eq!(detail["genre"]["url"], location);
}

#[tokio::test]
async fn empty_genre_name_rerenders_form_with_errors() {
    let (app, state) = app();

    let reply = post_form(&app, "/genre/create", &[("name", "   ")]).await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    let body = reply.json();
    assert_eq!(body["view"], "genre_form");
    assert_eq!(body["errors"][0]["param"], "name");
    assert_eq!(body["errors"][0]["msg"], "Genre name required");

    assert_eq!(state.genres().count(&Filter::all()).await.unwrap(), 0);
}

#[tokio::test]
async fn authors_are_listed_by_family_name() {
    let (app, _) = app();
    for (first, family) in [("John", "Smith"), ("Douglas", "Adams")] {
        let reply = post_form(
            &app,
            "/author/create",
            &[("first_name", first), ("family_name", family)],
        )
        .await;
        assert_eq!(reply.status, StatusCode::SEE_OTHER);
    }

    let body = get(&app, "/authors").await.json();
    let names: Vec<&str> = body["author_list"]
        .as_array()
        .unwrap()
        .iter()
        .map(|author| author["family_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Adams", "Smith"]);
    assert_eq!(body["author_list"][0]["name"], "Adams, Douglas");
}

#[tokio::test]
async fn author_create_rejects_bad_input() {
    let (app, state) = app();

    let reply = post_form(
        &app,
        "/author/create",
        &[
            ("first_name", "J.R.R."),
            ("family_name", ""),
            ("date_of_birth", "not-a-date"),
        ],
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);

    let body = reply.json();
    let messages: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|error| error["msg"].as_str().unwrap())
        .collect();
    assert_eq!(
        messages,
        [
            "First name has non-alphanumeric characters.",
            "Family name must be specified.",
            "Family name has non-alphanumeric characters.",
            "Invalid date of birth",
        ]
    );
    assert_eq!(body["author"]["first_name"], "J.R.R.");
    assert_eq!(state.authors().count(&Filter::all()).await.unwrap(), 0);
}

#[tokio::test]
async fn author_with_books_cannot_be_deleted() {
    let (app, state) = app();
    let author = Author::new("Patrick", "Rothfuss", None, None);
    state.authors().save(&author).await.unwrap();
    let book = Book::new("The Name of the Wind", author.id.clone(), "summary", "isbn", vec![]);
    state.books().save(&book).await.unwrap();

    let delete_path = format!("/author/{}/delete", author.id);
    let reply = post_form(&app, &delete_path, &[]).await;
    assert_eq!(reply.status, StatusCode::OK);
    let body = reply.json();
    assert_eq!(body["view"], "author_delete");
    assert_eq!(body["author_books"][0]["title"], "The Name of the Wind");
    assert!(state.authors().find_by_id(&author.id).await.unwrap().is_some());

    state.books().remove_by_id(&book.id).await.unwrap();
    let reply = post_form(&app, &delete_path, &[]).await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location.as_deref(), Some("/authors"));

    let detail = get(&app, &format!("/author/{}", author.id)).await;
    assert_eq!(detail.status, StatusCode::NOT_FOUND);
    assert_eq!(detail.json()["error"]["message"], "Author not found");
}

#[tokio::test]
async fn deleting_missing_records_redirects_to_list() {
    let (app, _) = app();

    for (path, list) in [
        ("/author/missing/delete", "/authors"),
        ("/book/missing/delete", "/books"),
        ("/genre/missing/delete", "/genres"),
        ("/bookinstance/missing/delete", "/bookinstances"),
    ] {
        let reply = get(&app, path).await;
        assert_eq!(reply.status, StatusCode::SEE_OTHER, "{path}");
        assert_eq!(reply.location.as_deref(), Some(list));

        let reply = post_form(&app, path, &[]).await;
        assert_eq!(reply.status, StatusCode::SEE_OTHER, "{path}");
        assert_eq!(reply.location.as_deref(), Some(list));
    }
}

#[tokio::test]
async fn book_create_then_detail_expands_references() {
    let (app, state) = app();
    let author = Author::new("Ursula", "Le Guin", None, None);
    state.authors().save(&author).await.unwrap();
    let fantasy = post_form(&app, "/genre/create", &[("name", "Fantasy")]).await;
    let fantasy_id = fantasy.location.unwrap().trim_start_matches("/genre/").to_string();

    let reply = post_form(
        &app,
        "/book/create",
        &[
            ("title", " A Wizard of Earthsea "),
            ("author", author.id.as_str()),
            ("summary", "A young mage <learns> his true name."),
            ("isbn", "9780547773742"),
            ("genre", fantasy_id.as_str()),
        ],
    )
    .await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    let location = reply.location.unwrap();

    let body = get(&app, &location).await.json();
    assert_eq!(body["view"], "book_detail");
    assert_eq!(body["title"], "A Wizard of Earthsea");
    assert_eq!(body["book"]["author"]["name"], "Le Guin, Ursula");
    assert_eq!(body["book"]["genre"][0]["name"], "Fantasy");
    assert_eq!(
        body["book"]["summary"],
        "A young mage &lt;learns&gt; his true name."
    );
    assert_eq!(body["book_instances"], Value::Array(vec![]));

    let list = get(&app, "/books").await.json();
    assert_eq!(list["book_list"][0]["author"]["name"], "Le Guin, Ursula");
}

#[tokio::test]
async fn book_form_marks_submitted_genres_on_rerender() {
    let (app, state) = app();
    let created = post_form(&app, "/genre/create", &[("name", "Poetry")]).await;
    let genre_id = created.location.unwrap().trim_start_matches("/genre/").to_string();

    let reply = post_form(
        &app,
        "/book/create",
        &[("title", ""), ("genre", genre_id.as_str())],
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    let body = reply.json();
    assert_eq!(body["genres"][0]["checked"], true);
    assert_eq!(body["errors"][0]["msg"], "Title must not be empty.");
    assert_eq!(state.books().count(&Filter::all()).await.unwrap(), 0);
}

#[tokio::test]
async fn book_with_copies_cannot_be_deleted() {
    let (app, state) = app();
    let book = Book::new("Dune", RecordId::from("a1"), "summary", "isbn", vec![]);
    state.books().save(&book).await.unwrap();
    let copy = BookInstance::new(book.id.clone(), "Ace, 1990", Default::default(), None);
    state.book_instances().save(&copy).await.unwrap();

    let reply = post_form(&app, &format!("/book/{}/delete", book.id), &[]).await;
    assert_eq!(reply.status, StatusCode::OK);
    let body = reply.json();
    assert_eq!(body["view"], "book_delete");
    assert_eq!(body["book_instances"][0]["imprint"], "Ace, 1990");
    assert_eq!(state.books().count(&Filter::all()).await.unwrap(), 1);
}

#[tokio::test]
async fn book_copy_status_defaults_and_validates() {
    let (app, state) = app();
    let book = Book::new("Dune", RecordId::from("a1"), "summary", "isbn", vec![]);
    state.books().save(&book).await.unwrap();

    let rejected = post_form(
        &app,
        "/bookinstance/create",
        &[
            ("book", book.id.as_str()),
            ("imprint", "Ace"),
            ("status", "Lost"),
            ("due_back", "soon"),
        ],
    )
    .await;
    assert_eq!(rejected.status, StatusCode::UNPROCESSABLE_ENTITY);
    let body = rejected.json();
    assert_eq!(body["selected_book"], book.id.as_str());
    assert_eq!(body["book_list"][0]["title"], "Dune");
    let messages: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|error| error["msg"].as_str().unwrap())
        .collect();
    assert_eq!(messages, ["Invalid date", "Invalid status"]);

    let created = post_form(
        &app,
        "/bookinstance/create",
        &[
            ("book", book.id.as_str()),
            ("imprint", "Ace"),
            ("status", ""),
            ("due_back", "2026-12-01"),
        ],
    )
    .await;
    assert_eq!(created.status, StatusCode::SEE_OTHER);

    let body = get(&app, &created.location.unwrap()).await.json();
    assert_eq!(body["bookinstance"]["status"], "Maintenance");
    assert_eq!(body["bookinstance"]["due_back_formatted"], "Dec 1, 2026");
    assert_eq!(body["bookinstance"]["book"]["title"], "Dune");
}

#[tokio::test]
async fn missing_records_are_not_found() {
    let (app, _) = app();
    for (path, message) in [
        ("/author/nope", "Author not found"),
        ("/book/nope", "Book not found"),
        ("/genre/nope", "Genre not found"),
        ("/bookinstance/nope", "Book copy not found"),
    ] {
        let reply = get(&app, path).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND, "{path}");
        assert_eq!(reply.json()["error"]["message"], message);
    }
}

#[tokio::test]
async fn update_operations_are_placeholders() {
    let (app, _) = app();

    let reply = get(&app, "/genre/any/update").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, "NOT IMPLEMENTED: Genre update GET");

    let reply = post_form(&app, "/bookinstance/any/update", &[]).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, "NOT IMPLEMENTED: BookInstance update POST");
}

#[tokio::test]
async fn home_page_counts_records() {
    let (app, state) = app();
    let author = Author::new("Frank", "Herbert", None, None);
    state.authors().save(&author).await.unwrap();
    let book = Book::new("Dune", author.id.clone(), "summary", "isbn", vec![]);
    state.books().save(&book).await.unwrap();
    for status in ["Available", "Loaned"] {
        post_form(
            &app,
            "/bookinstance/create",
            &[("book", book.id.as_str()), ("imprint", "Ace"), ("status", status)],
        )
        .await;
    }

    let body = get(&app, "/").await.json();
    assert_eq!(body["view"], "index");
    assert_eq!(body["title"], "Local Library Home");
    assert_eq!(body["data"]["book_count"], 1);
    assert_eq!(body["data"]["book_instance_count"], 2);
    assert_eq!(body["data"]["book_instance_available_count"], 1);
    assert_eq!(body["data"]["author_count"], 1);
    assert_eq!(body["data"]["genre_count"], 0);
}

#[tokio::test]
async fn store_failures_surface_as_errors() {
    let (app, _) = app_with(Arc::new(UnavailableStore), "");

    let home = get(&app, "/").await;
    assert_eq!(home.status, StatusCode::OK);
    let body = home.json();
    assert!(body["error"].as_str().unwrap().contains("connection refused"));
    assert!(body.get("data").is_none());

    let list = get(&app, "/authors").await;
    assert_eq!(list.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(list.json()["error"]["code"], "internal_error");
}

#[tokio::test]
async fn routes_mount_under_base_path() {
    let (app, _) = app_with(Arc::new(MemoryStore::new()), "/catalog");

    let reply = post_form(&app, "/catalog/genre/create", &[("name", "Horror")]).await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert!(reply.location.unwrap().starts_with("/catalog/genre/"));

    let body = get(&app, "/catalog/genres").await.json();
    assert_eq!(body["genre_list"][0]["name"], "Horror");

    assert_eq!(get(&app, "/genres").await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn openapi_document_lists_module_routes() {
    let (app, _) = app();

    let reply = get(&app, "/docs/openapi.json").await;
    assert_eq!(reply.status, StatusCode::OK);
    let document = reply.json();
    assert!(document["paths"]["/healthz"].is_object());
    assert!(document["paths"]["/authors"]["get"].is_object());
    assert!(document["paths"]["/bookinstance/{id}/delete"]["post"].is_object());
    assert!(document["paths"]["/"]["get"].is_object());
}

#[tokio::test]
async fn seeded_genre_names_are_reused_by_create() {
    let seed = std::env::temp_dir().join(format!("library-genre-seed-{}.json", std::process::id()));
    std::fs::write(
        &seed,
        r#"{"genres": [
            {"id": "g-children", "name": "Children's"},
            {"id": "g-scifi", "name": "Sci/Fi & Fantasy"}
        ]}"#,
    )
    .unwrap();
    let store = MemoryStore::new();
    let loaded = store.load_seed(&seed).await;
    std::fs::remove_file(&seed).ok();
    assert_eq!(loaded.unwrap(), 2);
    let (app, state) = app_with(Arc::new(store), "");

    let reply = post_form(&app, "/genre/create", &[("name", "Children's")]).await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location.as_deref(), Some("/genre/g-children"));

    let reply = post_form(&app, "/genre/create", &[("name", " Sci/Fi & Fantasy ")]).await;
    assert_eq!(reply.location.as_deref(), Some("/genre/g-scifi"));

    assert_eq!(state.genres().count(&Filter::all()).await.unwrap(), 2);
}

#[tokio::test]
async fn genres_are_listed_by_name() {
    let (app, _) = app();
    for name in ["Poetry", "Fantasy", "Horror"] {
        post_form(&app, "/genre/create", &[("name", name)]).await;
    }

    let body = get(&app, "/genres").await.json();
    let names: Vec<&str> = body["genre_list"]
        .as_array()
        .unwrap()
        .iter()
        .map(|genre| genre["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Fantasy", "Horror", "Poetry"]);
}

#[tokio::test]
async fn genre_in_use_cannot_be_deleted() {
    let (app, state) = app();
    let poetry = Genre::new("Poetry");
    state.genres().save(&poetry).await.unwrap();
    let book = Book::new(
        "Leaves of Grass",
        RecordId::from("a1"),
        "summary",
        "isbn",
        vec![poetry.id.clone()],
    );
    state.books().save(&book).await.unwrap();

    let delete_path = format!("/genre/{}/delete", poetry.id);
    let confirmation = get(&app, &delete_path).await.json();
    assert_eq!(confirmation["view"], "genre_delete");
    assert_eq!(confirmation["genre_books"][0]["title"], "Leaves of Grass");

    let reply = post_form(&app, &delete_path, &[]).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["view"], "genre_delete");
    assert!(state.genres().find_by_id(&poetry.id).await.unwrap().is_some());

    state.books().remove_by_id(&book.id).await.unwrap();
    let reply = post_form(&app, &delete_path, &[]).await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location.as_deref(), Some("/genres"));
    assert_eq!(
        get(&app, &format!("/genre/{}", poetry.id)).await.status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn book_copy_delete_removes_it() {
    let (app, state) = app();
    let book = Book::new("Dune", RecordId::from("a1"), "summary", "isbn", vec![]);
    state.books().save(&book).await.unwrap();
    let copy = BookInstance::new(book.id.clone(), "Ace, 1990", Default::default(), None);
    state.book_instances().save(&copy).await.unwrap();

    let delete_path = format!("/bookinstance/{}/delete", copy.id);
    let confirmation = get(&app, &delete_path).await.json();
    assert_eq!(confirmation["view"], "bookinstance_delete");
    assert_eq!(confirmation["bookinstance"]["book"]["title"], "Dune");

    let reply = post_form(&app, &delete_path, &[]).await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location.as_deref(), Some("/bookinstances"));
    assert_eq!(state.book_instances().count(&Filter::all()).await.unwrap(), 0);
    assert_eq!(
        get(&app, &format!("/bookinstance/{}", copy.id)).await.status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn detail_fails_when_referencing_records_cannot_be_listed() {
    let (app, state) = app_with(Arc::new(ListingsUnavailable(MemoryStore::new())), "");
    let author = Author::new("Frank", "Herbert", None, None);
    state.authors().save(&author).await.unwrap();
    let genre = Genre::new("Science Fiction");
    state.genres().save(&genre).await.unwrap();
    assert!(state.authors().find_by_id(&author.id).await.unwrap().is_some());

    for path in [format!("/author/{}", author.id), format!("/genre/{}", genre.id)] {
        let reply = get(&app, &path).await;
        assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR, "{path}");
        assert_eq!(reply.json()["error"]["code"], "internal_error");
    }

    let reply = post_form(&app, &format!("/author/{}/delete", author.id), &[]).await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(state.authors().find_by_id(&author.id).await.unwrap().is_some());
}
