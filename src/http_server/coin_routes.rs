//! Coin Routes
//!
//! CRUD and listing for coins:
//! - `GET    /v1/coins`       list with title search, genre filter, paging
//! - `POST   /v1/coins`       create
//! - `GET    /v1/coins/{id}`  fetch
//! - `PATCH  /v1/coins/{id}`  partial update, version-checked
//! - `DELETE /v1/coins/{id}`  delete

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::{json, Value};
use tracing::info;

use super::errors::{ApiError, ApiResult};
use super::params::{read_csv, read_int, read_string, QueryParams};
use super::state::AppState;
use crate::auth::{Principal, COINS_READ, COINS_WRITE};
use crate::coin::{validate_coin, validate_draft, CoinPatch, NewCoin, Validator};
use crate::store::validate_filters;

/// Optional precondition on PATCH: the version the client last saw.
pub const EXPECTED_VERSION_HEADER: &str = "x-expected-version";

/// Create coin routes
pub fn coin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/coins",
            get(list_coins_handler)
                .post(create_coin_handler)
                .fallback(method_not_allowed),
        )
        .route(
            "/v1/coins/{id}",
            get(show_coin_handler)
                .patch(update_coin_handler)
                .delete(delete_coin_handler)
                .fallback(method_not_allowed),
        )
}

pub async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::MethodNotAllowed(method)
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Ids that do not parse, or are below 1, name no coin.
fn read_id(raw: &str) -> ApiResult<i64> {
    match raw.parse::<i64>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(ApiError::NotFound),
    }
}

fn bad_json(rejection: JsonRejection) -> ApiError {
    ApiError::BadRequest(rejection.body_text())
}

async fn list_coins_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    query: Result<Query<QueryParams>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    principal.require_permission(COINS_READ)?;
    let Query(params) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let mut v = Validator::new();
    let title = read_string(&params, "title", "").to_string();
    let genres = read_csv(&params, "genres", &[]);
    let page = read_int(&params, "page", 1, &mut v);
    let page_size = read_int(&params, "page_size", 20, &mut v);
    let sort = read_string(&params, "sort", "id").to_string();

    let filters = match validate_filters(&mut v, page, page_size, &sort) {
        Some(filters) if v.valid() => filters,
        _ => return Err(ApiError::FailedValidation(v.into_errors())),
    };

    let (coins, metadata) = state.store.list(&title, &genres, &filters).await?;
    Ok(Json(json!({ "coins": coins, "metadata": metadata })))
}

async fn create_coin_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    body: Result<Json<NewCoin>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    principal.require_permission(COINS_WRITE)?;
    let Json(input) = body.map_err(bad_json)?;

    let (draft, genres_provided) = input.into_draft();
    let mut v = Validator::new();
    v.check(genres_provided, "genres", "must be provided");
    validate_draft(&mut v, &draft);
    if !v.valid() {
        return Err(ApiError::FailedValidation(v.into_errors()));
    }

    let coin = state.store.insert(&draft).await?;
    info!(id = coin.id, user = principal.name().unwrap_or_default(), "coin created");

    let location = format!("/v1/coins/{}", coin.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(json!({ "coin": coin })),
    ))
}

async fn show_coin_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    principal.require_permission(COINS_READ)?;
    let id = read_id(&id)?;

    let coin = state.store.get(id).await?;
    Ok(Json(json!({ "coin": coin })))
}

async fn update_coin_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Result<Json<CoinPatch>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    principal.require_permission(COINS_WRITE)?;
    let id = read_id(&id)?;

    let mut coin = state.store.get(id).await?;

    if let Some(expected) = headers.get(EXPECTED_VERSION_HEADER) {
        let expected = expected
            .to_str()
            .ok()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .ok_or_else(|| {
                ApiError::BadRequest("X-Expected-Version must be an integer".to_string())
            })?;
        if expected != coin.version {
            return Err(ApiError::EditConflict);
        }
    }

    let Json(patch) = body.map_err(bad_json)?;
    patch.apply(&mut coin);

    let mut v = Validator::new();
    validate_coin(&mut v, &coin);
    if !v.valid() {
        return Err(ApiError::FailedValidation(v.into_errors()));
    }

    coin.version = state.store.update(&coin).await?;
    info!(id = coin.id, version = coin.version, "coin updated");

    Ok(Json(json!({ "coin": coin })))
}

async fn delete_coin_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    principal.require_permission(COINS_WRITE)?;
    let id = read_id(&id)?;

    state.store.delete(id).await?;
    info!(id, "coin deleted");

    Ok(Json(json!({ "message": "coin successfully deleted" })))
}
