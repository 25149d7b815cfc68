//! HTTP handlers and the JSON response envelope.
//!
//! Every response uses the shape `{"success": bool, "data": ..., "error":
//! {"code", "message"}}`. Full error detail is logged server-side; the
//! client only ever sees a stable code and a safe message. Missing-field
//! checks happen here, before the engine is invoked, so an empty body field
//! never turns into a database round trip.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::db::SchemaEngine;
use crate::error::SchemaError;
use crate::models::{ColumnRequest, Schema, TypeInfo};

/// Request bodies above this size are rejected outright.
const MAX_BODY_BYTES: usize = 1 << 20;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SchemaEngine>,
}

/// Build the API router.
pub fn router(engine: Arc<SchemaEngine>) -> Router {
    Router::new()
        .route("/api/schema", get(get_schema))
        .route("/api/databases", get(list_databases))
        .route("/api/types", get(get_types))
        .route("/api/database", post(switch_database))
        .route("/api/tables", post(create_table))
        .route("/api/tables/{table}/columns", post(add_column))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(AppState { engine })
}

#[derive(Serialize)]
struct ApiError {
    code: &'static str,
    message: String,
}

#[derive(Serialize)]
struct ApiResponse<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ApiError>,
}

fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data: Some(data),
        error: None,
    })
}

fn error_response(status: StatusCode, code: &'static str, message: String) -> Response {
    let body = ApiResponse::<()> {
        success: false,
        data: None,
        error: Some(ApiError { code, message }),
    };
    (status, Json(body)).into_response()
}

/// Wrapper so handlers can `?` a [`SchemaError`] straight into the envelope.
pub struct Failure(SchemaError);

impl From<SchemaError> for Failure {
    fn from(err: SchemaError) -> Self {
        Self(err)
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let err = self.0;
        // Full detail stays server-side.
        warn!(code = err.client_code(), error = %err, "request failed");
        error_response(err.status(), err.client_code(), err.client_message())
    }
}

/// Unwrap a JSON body or turn the rejection into the standard envelope.
fn decode<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            warn!(error = %rejection, "invalid request body");
            Err(error_response(
                StatusCode::BAD_REQUEST,
                "INVALID_REQUEST",
                "Invalid request body".to_string(),
            ))
        }
    }
}

async fn get_schema(State(state): State<AppState>) -> Result<Json<ApiResponse<Schema>>, Failure> {
    let schema = state.engine.get_schema(None).await?;
    Ok(ok(schema))
}

#[derive(Serialize)]
struct DatabasesData {
    databases: Vec<String>,
    current: String,
}

async fn list_databases(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DatabasesData>>, Failure> {
    let databases = state.engine.list_databases(None).await?;
    let current = state.engine.current_database().await;
    Ok(ok(DatabasesData { databases, current }))
}

#[derive(Serialize)]
struct TypesData {
    types: &'static [TypeInfo],
}

async fn get_types(State(state): State<AppState>) -> Json<ApiResponse<TypesData>> {
    ok(TypesData {
        types: state.engine.types(),
    })
}

#[derive(Deserialize)]
struct SwitchDatabaseRequest {
    #[serde(default)]
    name: String,
}

#[derive(Serialize)]
struct SwitchDatabaseData {
    database: String,
}

async fn switch_database(
    State(state): State<AppState>,
    body: Result<Json<SwitchDatabaseRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<SwitchDatabaseData>>, Response> {
    let req = decode(body)?;
    if req.name.is_empty() {
        return Err(Failure(SchemaError::missing_field("database name")).into_response());
    }
    state
        .engine
        .switch_database(&req.name, None)
        .await
        .map_err(|e| Failure(e).into_response())?;
    Ok(ok(SwitchDatabaseData { database: req.name }))
}

#[derive(Deserialize)]
struct CreateTableRequest {
    #[serde(default)]
    name: String,
}

#[derive(Serialize)]
struct CreateTableData {
    table: String,
}

async fn create_table(
    State(state): State<AppState>,
    body: Result<Json<CreateTableRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<CreateTableData>>, Response> {
    let req = decode(body)?;
    if req.name.is_empty() {
        return Err(Failure(SchemaError::missing_field("table name")).into_response());
    }
    state
        .engine
        .create_table(&req.name, None)
        .await
        .map_err(|e| Failure(e).into_response())?;
    Ok(ok(CreateTableData { table: req.name }))
}

#[derive(Serialize)]
struct AddColumnData {
    column: String,
}

async fn add_column(
    State(state): State<AppState>,
    Path(table): Path<String>,
    body: Result<Json<ColumnRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<AddColumnData>>, Response> {
    let req = decode(body)?;
    if req.name.is_empty() {
        return Err(Failure(SchemaError::missing_field("column name")).into_response());
    }
    if req.data_type.is_empty() {
        return Err(Failure(SchemaError::missing_field("column type")).into_response());
    }
    let column = req.name.clone();
    state
        .engine
        .add_column(&table, req, None)
        .await
        .map_err(|e| Failure(e).into_response())?;
    Ok(ok(AddColumnData { column }))
}
