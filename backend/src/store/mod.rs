//! Storage capabilities injected into the purchasing services
//!
//! `PgStore` is the production implementation, `MemoryStore` keeps the same
//! guarantees in process.

use std::future::Future;

use chrono::NaiveDate;
use shared::{Item, ItemMetadata, NewItem, OrderItem, PurchaseOrder};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Capacity of the live order change channel
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A purchase order about to be persisted for the first time
#[derive(Debug, Clone)]
pub struct NewPurchaseOrder {
    pub supplier: String,
    pub order_date: NaiveDate,
    pub items: Vec<OrderItem>,
    /// Replays with the same key return the order created by the first request
    pub idempotency_key: Option<Uuid>,
}

/// Result of an atomic line completion
#[derive(Debug, Clone)]
pub struct Completion {
    pub order: PurchaseOrder,
    pub item: Item,
}

/// Change notification emitted after every successful order write
#[derive(Debug, Clone)]
pub enum OrderEvent {
    Created(PurchaseOrder),
    Updated(PurchaseOrder),
    Deleted(Uuid),
}

/// Raised when a write was based on an outdated copy of the order
pub(crate) fn order_conflict(order_number: &str) -> AppError {
    AppError::Conflict {
        resource: "purchase_order".to_string(),
        message: format!(
            "Order {} was changed by another user, reload and try again",
            order_number
        ),
        message_id: "Order telah diubah pengguna lain, muat ulang dan coba lagi".to_string(),
    }
}

/// Read-only view of the item catalog
pub trait ItemCatalog: Clone + Send + Sync + 'static {
    /// All items ordered by code
    fn list_items(&self) -> impl Future<Output = AppResult<Vec<Item>>> + Send;

    fn get_item(&self, item_id: Uuid) -> impl Future<Output = AppResult<Item>> + Send;
}

/// The stock ledger
pub trait StockStore: ItemCatalog {
    fn create_item(&self, item: NewItem) -> impl Future<Output = AppResult<Item>> + Send;

    fn update_item_metadata(
        &self,
        item_id: Uuid,
        metadata: ItemMetadata,
    ) -> impl Future<Output = AppResult<Item>> + Send;

    /// Single read-increment-write on the store side
    fn increment_quantity(
        &self,
        item_id: Uuid,
        by: u32,
    ) -> impl Future<Output = AppResult<Item>> + Send;

    fn delete_item(&self, item_id: Uuid) -> impl Future<Output = AppResult<()>> + Send;
}

/// Purchase order persistence
pub trait OrderStore: Clone + Send + Sync + 'static {
    /// Insert with a store-generated id and order number
    fn create_order(
        &self,
        order: NewPurchaseOrder,
    ) -> impl Future<Output = AppResult<PurchaseOrder>> + Send;

    fn get_order(&self, order_id: Uuid) -> impl Future<Output = AppResult<PurchaseOrder>> + Send;

    /// All orders, newest order date first
    fn list_orders(&self) -> impl Future<Output = AppResult<Vec<PurchaseOrder>>> + Send;

    /// Overwrite the mutable fields. Fails with `Conflict` when `order.version`
    /// no longer matches the stored version.
    fn update_order(
        &self,
        order: &PurchaseOrder,
    ) -> impl Future<Output = AppResult<PurchaseOrder>> + Send;

    /// Delete an open order. Fails with `InvalidStateTransition` once the
    /// order is completed and with `Conflict` when `expected_version` is stale.
    fn delete_order(
        &self,
        order_id: Uuid,
        expected_version: i64,
    ) -> impl Future<Output = AppResult<()>> + Send;

    /// Complete one line as a single all-or-nothing unit: the line flag, the
    /// recomputed order flag and the stock increment are applied together or
    /// not at all. Completion rules are re-checked against the stored order.
    fn complete_line(
        &self,
        order_id: Uuid,
        item_id: Uuid,
    ) -> impl Future<Output = AppResult<Completion>> + Send;

    /// Live order changes
    fn subscribe(&self) -> broadcast::Receiver<OrderEvent>;

    /// Store reachability for health checks
    fn ping(&self) -> impl Future<Output = bool> + Send;
}

/// Everything the purchasing services need
pub trait Store: StockStore + OrderStore {}

impl<T: StockStore + OrderStore> Store for T {}
