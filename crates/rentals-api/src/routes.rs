use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use rentals_core::models::{Listing, ListingId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::store::{ListingStore, Page};
use crate::validation::{parse_draft, parse_patch};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<ListingStore>,
}

impl AppState {
    pub fn from_config(config: Arc<AppConfig>) -> Self {
        Self {
            config,
            store: Arc::new(ListingStore::new()),
        }
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/listings", get(list_listings).post(create_listing))
        .route("/listings/ping", get(ping))
        .route("/listings/reset", post(reset_listings))
        .route(
            "/listings/{id}",
            get(get_listing).put(update_listing).delete(delete_listing),
        )
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct PingResponse {
    status: &'static str,
    timestamp: i64,
}

async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        status: "ok",
        timestamp: Utc::now().timestamp(),
    })
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    page: Option<String>,
    limit: Option<String>,
}

async fn list_listings(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<Listing>>, AppError> {
    let Query(query) = query.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let page = resolve_page(&query, state.config.default_page_size)?;
    Ok(Json(state.store.list(page).await))
}

/// No paging parameters means the whole set; one given defaults the other.
fn resolve_page(query: &ListQuery, default_limit: usize) -> Result<Option<Page>, AppError> {
    if query.page.is_none() && query.limit.is_none() {
        return Ok(None);
    }
    let page = parse_positive(query.page.as_deref(), "page")?.unwrap_or(1);
    let limit = parse_positive(query.limit.as_deref(), "limit")?.unwrap_or(default_limit);
    Ok(Some(Page { page, limit }))
}

fn parse_positive(value: Option<&str>, name: &str) -> Result<Option<usize>, AppError> {
    value
        .map(|raw| match raw.trim().parse::<usize>() {
            Ok(number) if number > 0 => Ok(number),
            _ => Err(AppError::bad_request(format!(
                "{name} must be a positive integer."
            ))),
        })
        .transpose()
}

async fn get_listing(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Listing>, AppError> {
    let id = parse_id(&id)?;
    state.store.get(&id).await.map(Json).ok_or(AppError::NotFound)
}

async fn create_listing(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Listing>), AppError> {
    let Json(body) = body.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let draft = parse_draft(body)?;
    let listing = state.store.create(draft).await?;
    tracing::info!(listing = %listing.id, "Created listing");
    Ok((StatusCode::CREATED, Json(listing)))
}

async fn update_listing(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Listing>, AppError> {
    let id = parse_id(&id)?;
    if state.store.get(&id).await.is_none() {
        return Err(AppError::NotFound);
    }

    let Json(body) = body.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let patch = parse_patch(body)?;
    let listing = state
        .store
        .update(&id, patch)
        .await
        .ok_or(AppError::NotFound)?;
    tracing::info!(listing = %listing.id, "Updated listing");
    Ok(Json(listing))
}

async fn delete_listing(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    if !state.store.delete(&id).await {
        return Err(AppError::NotFound);
    }
    tracing::info!(listing = %id, "Deleted listing");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
struct ResetResponse {
    message: &'static str,
}

async fn reset_listings(State(state): State<AppState>) -> Json<ResetResponse> {
    state.store.reset().await;
    tracing::info!("Listings reset");
    Json(ResetResponse {
        message: "Reset complete",
    })
}

fn parse_id(raw: &str) -> Result<ListingId, AppError> {
    raw.parse().map_err(|_| AppError::NotFound)
}
