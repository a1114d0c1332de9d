//! Spine ToC Sort - reorders a book's table of contents to follow its spine.

mod actions;
mod book_store;
mod config;
mod error;
mod reconcile;
mod report;
mod schema;

use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use actions::{SortOutcome, ToolAction};
use book_store::BookStore;
use config::AppConfig;
use error::StoreError;
use reconcile::Reconciliation;
use report::SortSummary;
use schema::{Book, BookSummary, SpineItem, TocTree};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    books: BookStore,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "spine_toc_sort=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let books = BookStore::load_from_dir(&config.library_dir)?;
    info!("Loaded {} books from {:?}", books.list().len(), config.library_dir);

    let state = AppState { books };

    let app = Router::new()
        .route("/health", get(health))
        .route("/actions", get(list_actions))
        .route("/books", get(list_books))
        .route("/books/:id", get(get_book))
        .route("/books/:id/toc", get(get_toc))
        .route("/books/:id/actions/:action", post(run_action))
        .route("/reconcile", post(reconcile_stateless))
        .layer(DefaultBodyLimit::max(config.body_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Server listening on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> &'static str {
    "ok"
}

/// Tool actions the host can bind to its menu, toolbar and shortcuts.
async fn list_actions() -> Json<Vec<ToolAction>> {
    Json(actions::all().to_vec())
}

async fn list_books(State(state): State<AppState>) -> Json<Vec<BookSummary>> {
    Json(state.books.list())
}

async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Book>, StatusCode> {
    state.books.get(&id).map(Json).ok_or(StatusCode::NOT_FOUND)
}

#[derive(Serialize)]
struct TocView {
    revision: String,
    toc: TocTree,
}

async fn get_toc(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TocView>, StatusCode> {
    let book = state.books.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(TocView {
        revision: book.toc.revision(),
        toc: book.toc,
    }))
}

#[derive(Deserialize)]
struct ActionQuery {
    expected_revision: Option<String>,
}

/// Run a tool action against a stored book and persist its result.
async fn run_action(
    State(state): State<AppState>,
    Path((id, action)): Path<(String, String)>,
    Query(query): Query<ActionQuery>,
) -> Result<Json<SortOutcome>, (StatusCode, String)> {
    let result = match actions::find(&action).map(|a| a.name) {
        Some(actions::SORT_TOC) => {
            info!("Running '{}' on book '{}'", action, id);
            state.books.with_book_mut(&id, |book| {
                actions::sort_toc(book, query.expected_revision.as_deref())
            })
        }
        _ => Err(StoreError::UnknownAction(action.clone())),
    };

    result.map(Json).map_err(|e| {
        error!("Action '{}' on book '{}' failed: {}", action, id, e);
        e.into()
    })
}

#[derive(Deserialize)]
struct ReconcileRequest {
    toc: TocTree,
    spine: Vec<SpineItem>,
}

#[derive(Serialize)]
struct ReconcileResponse {
    summary: SortSummary,
    #[serde(flatten)]
    result: Reconciliation,
}

/// Reconcile a ToC posted by the caller. Nothing is persisted.
async fn reconcile_stateless(Json(request): Json<ReconcileRequest>) -> Json<ReconcileResponse> {
    let result = reconcile::reconcile(&request.toc, &request.spine);
    Json(ReconcileResponse {
        summary: report::summarize(&result),
        result,
    })
}
