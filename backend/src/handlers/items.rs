//! HTTP handlers for the item catalog

use axum::{extract::State, Json};
use serde::Deserialize;
use shared::Item;
use uuid::Uuid;

use crate::error::AppResult;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::services::catalog::{CatalogService, CreateItemInput, UpdateItemInput};
use crate::store::Store;
use crate::AppState;

/// `?search=` filter shared by list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

/// List catalog items ordered by code
pub async fn list_items<S: Store>(
    State(state): State<AppState<S>>,
    AppQuery(query): AppQuery<SearchQuery>,
) -> AppResult<Json<Vec<Item>>> {
    let service = CatalogService::new(state.store);
    let items = service.list_items(query.search.as_deref()).await?;
    Ok(Json(items))
}

/// Register an item
pub async fn create_item<S: Store>(
    State(state): State<AppState<S>>,
    AppJson(input): AppJson<CreateItemInput>,
) -> AppResult<Json<Item>> {
    let service = CatalogService::new(state.store);
    let item = service.create_item(input).await?;
    Ok(Json(item))
}

/// Get an item by ID
pub async fn get_item<S: Store>(
    State(state): State<AppState<S>>,
    AppPath(item_id): AppPath<Uuid>,
) -> AppResult<Json<Item>> {
    let service = CatalogService::new(state.store);
    let item = service.get_item(item_id).await?;
    Ok(Json(item))
}

/// Update item metadata
pub async fn update_item<S: Store>(
    State(state): State<AppState<S>>,
    AppPath(item_id): AppPath<Uuid>,
    AppJson(input): AppJson<UpdateItemInput>,
) -> AppResult<Json<Item>> {
    let service = CatalogService::new(state.store);
    let item = service.update_item(item_id, input).await?;
    Ok(Json(item))
}

/// Delete an item
pub async fn delete_item<S: Store>(
    State(state): State<AppState<S>>,
    AppPath(item_id): AppPath<Uuid>,
) -> AppResult<Json<()>> {
    let service = CatalogService::new(state.store);
    service.delete_item(item_id).await?;
    Ok(Json(()))
}
