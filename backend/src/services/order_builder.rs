//! Purchase order creation, editing and deletion

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use shared::{search_orders, DomainError, OrderDraft, PurchaseOrder};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::{NewPurchaseOrder, OrderEvent, Store};

/// Builds drafts from catalog items and commits them as purchase orders
#[derive(Clone)]
pub struct OrderBuilderService<S> {
    store: S,
}

/// One requested line
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLineInput {
    pub item_id: Uuid,
    pub quantity: u32,
}

/// Input for committing a new order
#[derive(Debug, Deserialize)]
pub struct CreateOrderInput {
    pub supplier: String,
    /// Defaults to today
    pub order_date: Option<NaiveDate>,
    pub items: Vec<OrderLineInput>,
    /// Client-generated key identifying this submission
    pub idempotency_key: Option<Uuid>,
}

/// Input for committing an edit of an existing order
#[derive(Debug, Deserialize)]
pub struct UpdateOrderInput {
    pub supplier: String,
    pub order_date: NaiveDate,
    pub items: Vec<OrderLineInput>,
    /// Version the client edited; rejected if the order moved on since
    pub version: Option<i64>,
}

impl<S: Store> OrderBuilderService<S> {
    /// Create a new OrderBuilderService instance
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Orders, newest order date first, optionally filtered
    pub async fn list_orders(&self, search: Option<&str>) -> AppResult<Vec<PurchaseOrder>> {
        let orders = self.store.list_orders().await?;
        Ok(search_orders(orders, search))
    }

    pub async fn get_order(&self, order_id: Uuid) -> AppResult<PurchaseOrder> {
        self.store.get_order(order_id).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.store.subscribe()
    }

    /// Resolve a requested line against the catalog and append it to the draft
    pub async fn add_line(&self, draft: &mut OrderDraft, line: &OrderLineInput) -> AppResult<()> {
        let item = self.store.get_item(line.item_id).await?;
        draft.add_line(Some(&item), line.quantity)?;
        Ok(())
    }

    /// Commit a new purchase order
    pub async fn create_order(&self, input: CreateOrderInput) -> AppResult<PurchaseOrder> {
        let order_date = input.order_date.unwrap_or_else(|| Utc::now().date_naive());
        let mut draft = OrderDraft::new(input.supplier, order_date);
        for line in &input.items {
            self.add_line(&mut draft, line).await?;
        }
        draft.validate_for_commit()?;

        let order = self
            .store
            .create_order(NewPurchaseOrder {
                supplier: draft.supplier.trim().to_string(),
                order_date: draft.order_date,
                items: draft.lines,
                idempotency_key: input.idempotency_key,
            })
            .await?;

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            lines = order.items.len(),
            "Purchase order created"
        );
        Ok(order)
    }

    /// Commit an edit. Existing lines keep their receiving progress; lines
    /// missing from the input are removed and new ones are appended.
    pub async fn update_order(
        &self,
        order_id: Uuid,
        input: UpdateOrderInput,
    ) -> AppResult<PurchaseOrder> {
        let mut order = self.store.get_order(order_id).await?;
        if let Some(version) = input.version {
            if version != order.version {
                return Err(AppError::Conflict {
                    resource: "purchase_order".to_string(),
                    message: format!(
                        "Order {} was changed by another user, reload and try again",
                        order.order_number
                    ),
                    message_id: "Order telah diubah pengguna lain, muat ulang dan coba lagi"
                        .to_string(),
                });
            }
        }

        let mut seen = HashSet::new();
        for line in &input.items {
            if !seen.insert(line.item_id) {
                return Err(DomainError::validation(
                    "item_id",
                    "Item is listed more than once",
                    "Barang sudah ada dalam order",
                )
                .into());
            }
        }

        let mut draft = OrderDraft::from_order(&order)?;
        draft.supplier = input.supplier;
        draft.order_date = input.order_date;

        let dropped: Vec<Uuid> = draft
            .lines
            .iter()
            .map(|l| l.item_id)
            .filter(|id| !seen.contains(id))
            .collect();
        for item_id in dropped {
            draft.remove_line(item_id)?;
        }

        for line in &input.items {
            if draft.contains(line.item_id) {
                draft.set_line_quantity(line.item_id, line.quantity)?;
            } else {
                self.add_line(&mut draft, line).await?;
            }
        }

        draft.apply_to(&mut order)?;
        let order = self.store.update_order(&order).await?;

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            lines = order.items.len(),
            "Purchase order updated"
        );
        Ok(order)
    }

    /// Delete an order that has not been completed.
    ///
    /// `expected_version` is the version the caller last saw; without it the
    /// version read here is used, so a completion racing the delete still wins.
    pub async fn delete_order(
        &self,
        order_id: Uuid,
        expected_version: Option<i64>,
    ) -> AppResult<()> {
        let order = self.store.get_order(order_id).await?;
        if let Err(err) = order.ensure_not_completed() {
            tracing::warn!(order_id = %order_id, "Refusing to delete completed order");
            return Err(err.into());
        }

        let version = expected_version.unwrap_or(order.version);
        self.store
            .delete_order(order_id, version)
            .await
            .map_err(|e| {
                tracing::warn!(order_id = %order_id, version, "Order delete refused: {}", e);
                e
            })?;
        tracing::info!(order_id = %order_id, order_number = %order.order_number, "Purchase order deleted");
        Ok(())
    }
}
