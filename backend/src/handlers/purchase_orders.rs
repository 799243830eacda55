//! HTTP handlers for purchase orders, receiving and completion

use axum::{extract::State, Json};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::{Item, LineStatus, OrderItem, PurchaseOrder};
use uuid::Uuid;

use super::SearchQuery;
use crate::error::AppResult;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::services::{
    order_builder::{CreateOrderInput, UpdateOrderInput},
    receiving::{DateInput, ReceivedQuantityInput},
    CompletionService, OrderBuilderService, ReceivingService,
};
use crate::store::Store;
use crate::AppState;

/// Order line with its derived receiving status
#[derive(Debug, Serialize)]
pub struct OrderItemView {
    #[serde(flatten)]
    pub line: OrderItem,
    pub status: LineStatus,
    pub status_label: &'static str,
}

/// Purchase order as returned to clients
#[derive(Debug, Serialize)]
pub struct PurchaseOrderView {
    pub id: Uuid,
    pub order_number: String,
    pub supplier: String,
    pub order_date: NaiveDate,
    pub estimated_arrival_date: Option<NaiveDate>,
    pub items: Vec<OrderItemView>,
    pub completed: bool,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PurchaseOrder> for PurchaseOrderView {
    fn from(order: PurchaseOrder) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number,
            supplier: order.supplier,
            order_date: order.order_date,
            estimated_arrival_date: order.estimated_arrival_date,
            items: order
                .items
                .into_iter()
                .map(|line| {
                    let status = line.status();
                    OrderItemView {
                        line,
                        status,
                        status_label: status.label_id(),
                    }
                })
                .collect(),
            completed: order.completed,
            version: order.version,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

/// `?version=` guard for destructive order writes
#[derive(Debug, Default, Deserialize)]
pub struct VersionQuery {
    pub version: Option<i64>,
}

/// Response for a completed line: the order and the item's new stock level
#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    pub order: PurchaseOrderView,
    pub item: Item,
}

/// List purchase orders, newest order date first
pub async fn list_orders<S: Store>(
    State(state): State<AppState<S>>,
    AppQuery(query): AppQuery<SearchQuery>,
) -> AppResult<Json<Vec<PurchaseOrderView>>> {
    let service = OrderBuilderService::new(state.store);
    let orders = service.list_orders(query.search.as_deref()).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// Commit a new purchase order
pub async fn create_order<S: Store>(
    State(state): State<AppState<S>>,
    AppJson(input): AppJson<CreateOrderInput>,
) -> AppResult<Json<PurchaseOrderView>> {
    let service = OrderBuilderService::new(state.store);
    let order = service.create_order(input).await?;
    Ok(Json(order.into()))
}

/// Get a purchase order by ID
pub async fn get_order<S: Store>(
    State(state): State<AppState<S>>,
    AppPath(order_id): AppPath<Uuid>,
) -> AppResult<Json<PurchaseOrderView>> {
    let service = OrderBuilderService::new(state.store);
    let order = service.get_order(order_id).await?;
    Ok(Json(order.into()))
}

/// Commit an edit of an existing purchase order
pub async fn update_order<S: Store>(
    State(state): State<AppState<S>>,
    AppPath(order_id): AppPath<Uuid>,
    AppJson(input): AppJson<UpdateOrderInput>,
) -> AppResult<Json<PurchaseOrderView>> {
    let service = OrderBuilderService::new(state.store);
    let order = service.update_order(order_id, input).await?;
    Ok(Json(order.into()))
}

/// Delete a purchase order that is not completed
pub async fn delete_order<S: Store>(
    State(state): State<AppState<S>>,
    AppPath(order_id): AppPath<Uuid>,
    AppQuery(query): AppQuery<VersionQuery>,
) -> AppResult<Json<()>> {
    let service = OrderBuilderService::new(state.store);
    service.delete_order(order_id, query.version).await?;
    Ok(Json(()))
}

/// Set the order's estimated arrival date
pub async fn set_estimated_arrival_date<S: Store>(
    State(state): State<AppState<S>>,
    AppPath(order_id): AppPath<Uuid>,
    AppJson(input): AppJson<DateInput>,
) -> AppResult<Json<PurchaseOrderView>> {
    let service = ReceivingService::new(state.store);
    let order = service
        .set_estimated_arrival_date(order_id, input.date)
        .await?;
    Ok(Json(order.into()))
}

/// Record the received quantity of a line
pub async fn set_received_quantity<S: Store>(
    State(state): State<AppState<S>>,
    AppPath((order_id, item_id)): AppPath<(Uuid, Uuid)>,
    AppJson(input): AppJson<ReceivedQuantityInput>,
) -> AppResult<Json<PurchaseOrderView>> {
    let service = ReceivingService::new(state.store);
    let order = service
        .set_received_quantity(order_id, item_id, input.received_quantity)
        .await?;
    Ok(Json(order.into()))
}

/// Record the actual arrival date of a line
pub async fn set_actual_arrival_date<S: Store>(
    State(state): State<AppState<S>>,
    AppPath((order_id, item_id)): AppPath<(Uuid, Uuid)>,
    AppJson(input): AppJson<DateInput>,
) -> AppResult<Json<PurchaseOrderView>> {
    let service = ReceivingService::new(state.store);
    let order = service
        .set_actual_arrival_date(order_id, item_id, input.date)
        .await?;
    Ok(Json(order.into()))
}

/// Complete a fully received line and add it to stock
pub async fn complete_order_item<S: Store>(
    State(state): State<AppState<S>>,
    AppPath((order_id, item_id)): AppPath<(Uuid, Uuid)>,
) -> AppResult<Json<CompletionResponse>> {
    let service = CompletionService::new(state.store);
    let completion = service.complete(order_id, item_id).await?;
    Ok(Json(CompletionResponse {
        order: completion.order.into(),
        item: completion.item,
    }))
}
