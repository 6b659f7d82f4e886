use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, put},
    Router,
};
use rusqlite::Connection;
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::db::{self, DbError, NewRecord, Record, Resource};

/// Shared application state: just the store location. Every request opens
/// and closes its own connection; nothing is pooled or cached between
/// requests.
#[derive(Clone)]
pub struct AppState {
    db_path: Arc<PathBuf>,
}

impl AppState {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: Arc::new(db_path.into()),
        }
    }

    fn connect(&self) -> Result<Connection, DbError> {
        db::open_database(self.db_path.as_ref())
    }
}

/// Errors a handler can surface to the client.
#[derive(Debug)]
pub enum ApiError {
    /// Connection or statement failure in the store; always a 500.
    Db(DbError),
    /// The request body did not decode into the expected record shape.
    InvalidBody(String),
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        ApiError::Db(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

/// JSON error envelope
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// JSON confirmation envelope ("Income created", "Expense deleted", ...)
#[derive(Serialize)]
struct StatusBody {
    status: String,
}

impl StatusBody {
    fn new(resource: Resource, verb: &str) -> Self {
        Self {
            status: format!("{} {}", resource.label(), verb),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::Db(err) => {
                tracing::error!("store error: {err}");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::InvalidBody(message) => (StatusCode::BAD_REQUEST, message),
        };

        (status, Json(ErrorBody { error })).into_response()
    }
}

// ============================================================================
// Generic controller — one implementation, instantiated per resource
// ============================================================================

async fn list(state: &AppState, resource: Resource) -> Result<Json<Vec<Record>>, ApiError> {
    let conn = state.connect()?;
    let records = db::list_records(&conn, resource)?;

    Ok(Json(records))
}

async fn create(
    state: &AppState,
    resource: Resource,
    payload: Result<Json<NewRecord>, JsonRejection>,
) -> Result<(StatusCode, Json<StatusBody>), ApiError> {
    let Json(record) = payload?;

    let conn = state.connect()?;
    db::insert_record(&conn, resource, &record)?;

    Ok((StatusCode::CREATED, Json(StatusBody::new(resource, "created"))))
}

async fn update(
    state: &AppState,
    resource: Resource,
    id: i64,
    payload: Result<Json<NewRecord>, JsonRejection>,
) -> Result<Json<StatusBody>, ApiError> {
    let Json(record) = payload?;

    let conn = state.connect()?;
    // Zero rows affected (unknown id) is still a confirmed update.
    db::update_record(&conn, resource, id, &record)?;

    Ok(Json(StatusBody::new(resource, "updated")))
}

async fn delete(
    state: &AppState,
    resource: Resource,
    id: i64,
) -> Result<Json<StatusBody>, ApiError> {
    let conn = state.connect()?;
    db::delete_record(&conn, resource, id)?;

    Ok(Json(StatusBody::new(resource, "deleted")))
}

// ============================================================================
// Route handlers — thin per-resource instantiations of the controller
// ============================================================================

async fn list_incomes(State(state): State<AppState>) -> Result<Json<Vec<Record>>, ApiError> {
    list(&state, Resource::Income).await
}

async fn create_income(
    State(state): State<AppState>,
    payload: Result<Json<NewRecord>, JsonRejection>,
) -> Result<(StatusCode, Json<StatusBody>), ApiError> {
    create(&state, Resource::Income, payload).await
}

async fn update_income(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<NewRecord>, JsonRejection>,
) -> Result<Json<StatusBody>, ApiError> {
    update(&state, Resource::Income, id, payload).await
}

async fn delete_income(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<StatusBody>, ApiError> {
    delete(&state, Resource::Income, id).await
}

async fn list_expenses(State(state): State<AppState>) -> Result<Json<Vec<Record>>, ApiError> {
    list(&state, Resource::Expense).await
}

async fn create_expense(
    State(state): State<AppState>,
    payload: Result<Json<NewRecord>, JsonRejection>,
) -> Result<(StatusCode, Json<StatusBody>), ApiError> {
    create(&state, Resource::Expense, payload).await
}

async fn update_expense(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<NewRecord>, JsonRejection>,
) -> Result<Json<StatusBody>, ApiError> {
    update(&state, Resource::Expense, id, payload).await
}

async fn delete_expense(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<StatusBody>, ApiError> {
    delete(&state, Resource::Expense, id).await
}

/// Build the application router.
///
/// Non-integer `:id` segments are rejected by the typed path extractor
/// before any controller code runs.
pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/incomes", get(list_incomes).post(create_income))
        .route("/incomes/:id", put(update_income).delete(delete_income))
        .route("/expenses", get(list_expenses).post(create_expense))
        .route("/expenses/:id", put(update_expense).delete(delete_expense))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}
