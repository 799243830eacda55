//! Per-line receiving progress

use chrono::NaiveDate;
use serde::Deserialize;
use shared::{DomainResult, PurchaseOrder};
use uuid::Uuid;

use crate::error::AppResult;
use crate::store::OrderStore;

/// Records what has arrived for each line of an order
#[derive(Clone)]
pub struct ReceivingService<S> {
    store: S,
}

/// Input for recording the received quantity
#[derive(Debug, Deserialize)]
pub struct ReceivedQuantityInput {
    pub received_quantity: u32,
}

/// Input for recording a date; `null` clears it
#[derive(Debug, Deserialize)]
pub struct DateInput {
    pub date: Option<NaiveDate>,
}

impl<S: OrderStore> ReceivingService<S> {
    /// Create a new ReceivingService instance
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Load, mutate and persist. A failed mutation writes nothing.
    async fn mutate<F>(&self, order_id: Uuid, apply: F) -> AppResult<PurchaseOrder>
    where
        F: FnOnce(&mut PurchaseOrder) -> DomainResult<()> + Send,
    {
        let mut order = self.store.get_order(order_id).await?;
        apply(&mut order)?;
        self.store.update_order(&order).await
    }

    /// Record units received so far. Not clamped to the ordered quantity.
    pub async fn set_received_quantity(
        &self,
        order_id: Uuid,
        item_id: Uuid,
        quantity: u32,
    ) -> AppResult<PurchaseOrder> {
        let order = self
            .mutate(order_id, |order| order.set_received_quantity(item_id, quantity))
            .await
            .map_err(|e| {
                tracing::warn!(order_id = %order_id, item_id = %item_id, "Received quantity rejected: {}", e);
                e
            })?;

        tracing::info!(order_id = %order_id, item_id = %item_id, quantity, "Received quantity recorded");
        Ok(order)
    }

    pub async fn set_actual_arrival_date(
        &self,
        order_id: Uuid,
        item_id: Uuid,
        date: Option<NaiveDate>,
    ) -> AppResult<PurchaseOrder> {
        let order = self
            .mutate(order_id, |order| order.set_actual_arrival_date(item_id, date))
            .await
            .map_err(|e| {
                tracing::warn!(order_id = %order_id, item_id = %item_id, "Arrival date rejected: {}", e);
                e
            })?;

        tracing::info!(order_id = %order_id, item_id = %item_id, ?date, "Arrival date recorded");
        Ok(order)
    }

    /// Order-level estimate; refused once the order is completed
    pub async fn set_estimated_arrival_date(
        &self,
        order_id: Uuid,
        date: Option<NaiveDate>,
    ) -> AppResult<PurchaseOrder> {
        let order = self
            .mutate(order_id, |order| order.set_estimated_arrival_date(date))
            .await?;

        tracing::info!(order_id = %order_id, ?date, "Estimated arrival date recorded");
        Ok(order)
    }
}
