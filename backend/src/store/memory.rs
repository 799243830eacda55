//! In-process store used by tests and the `memory` storage backend

use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use shared::{
    format_order_number, sort_orders_by_date_desc, validate_stock_quantity, Item, ItemMetadata,
    NewItem, PurchaseOrder,
};
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

use super::{
    order_conflict, Completion, ItemCatalog, NewPurchaseOrder, OrderEvent, OrderStore,
    StockStore, EVENT_CHANNEL_CAPACITY,
};
use crate::error::{AppError, AppResult};

#[derive(Default)]
struct State {
    items: HashMap<Uuid, Item>,
    orders: HashMap<Uuid, PurchaseOrder>,
    idempotency_keys: HashMap<Uuid, Uuid>,
    order_sequence: i64,
}

/// Items and orders behind one lock, so multi-document writes are atomic
#[derive(Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    events: broadcast::Sender<OrderEvent>,
    order_number_prefix: Arc<str>,
}

impl MemoryStore {
    pub fn new(order_number_prefix: &str) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(State::default())),
            events,
            order_number_prefix: Arc::from(order_number_prefix),
        }
    }

    fn publish(&self, event: OrderEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new("PO")
    }
}

fn order_not_found(order_id: Uuid) -> AppError {
    AppError::NotFound(format!("Purchase order {}", order_id))
}

fn item_not_found(item_id: Uuid) -> AppError {
    AppError::NotFound(format!("Item {}", item_id))
}

impl ItemCatalog for MemoryStore {
    async fn list_items(&self) -> AppResult<Vec<Item>> {
        let state = self.state.lock().await;
        let mut items: Vec<Item> = state.items.values().cloned().collect();
        items.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(items)
    }

    async fn get_item(&self, item_id: Uuid) -> AppResult<Item> {
        let state = self.state.lock().await;
        state
            .items
            .get(&item_id)
            .cloned()
            .ok_or_else(|| item_not_found(item_id))
    }
}

impl StockStore for MemoryStore {
    async fn create_item(&self, input: NewItem) -> AppResult<Item> {
        validate_stock_quantity(input.quantity)
            .map_err(|msg| AppError::ValidationError(msg.to_string()))?;

        let mut state = self.state.lock().await;
        if state.items.values().any(|i| i.code == input.code) {
            return Err(AppError::DuplicateEntry("code".to_string()));
        }

        let item = Item {
            id: Uuid::new_v4(),
            code: input.code,
            name: input.name,
            category: input.category,
            quantity: input.quantity,
            location: input.location.filter(|l| !l.is_empty()),
            created_at: Utc::now(),
        };
        state.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn update_item_metadata(&self, item_id: Uuid, metadata: ItemMetadata) -> AppResult<Item> {
        let mut state = self.state.lock().await;
        if let Some(code) = &metadata.code {
            if state
                .items
                .values()
                .any(|i| i.id != item_id && &i.code == code)
            {
                return Err(AppError::DuplicateEntry("code".to_string()));
            }
        }

        let item = state
            .items
            .get_mut(&item_id)
            .ok_or_else(|| item_not_found(item_id))?;
        item.apply_metadata(&metadata);
        Ok(item.clone())
    }

    async fn increment_quantity(&self, item_id: Uuid, by: u32) -> AppResult<Item> {
        let mut state = self.state.lock().await;
        let item = state
            .items
            .get_mut(&item_id)
            .ok_or_else(|| item_not_found(item_id))?;
        item.quantity += i64::from(by);
        Ok(item.clone())
    }

    async fn delete_item(&self, item_id: Uuid) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state
            .items
            .remove(&item_id)
            .map(|_| ())
            .ok_or_else(|| item_not_found(item_id))
    }
}

impl OrderStore for MemoryStore {
    async fn create_order(&self, input: NewPurchaseOrder) -> AppResult<PurchaseOrder> {
        let mut state = self.state.lock().await;

        if let Some(key) = input.idempotency_key {
            if let Some(existing) = state
                .idempotency_keys
                .get(&key)
                .and_then(|id| state.orders.get(id))
            {
                return Ok(existing.clone());
            }
        }

        state.order_sequence += 1;
        let now = Utc::now();
        let mut order = PurchaseOrder {
            id: Uuid::new_v4(),
            order_number: format_order_number(
                &self.order_number_prefix,
                now.date_naive(),
                state.order_sequence,
            ),
            supplier: input.supplier,
            order_date: input.order_date,
            estimated_arrival_date: None,
            items: input.items,
            completed: false,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        order.recompute_completed();

        if let Some(key) = input.idempotency_key {
            state.idempotency_keys.insert(key, order.id);
        }
        state.orders.insert(order.id, order.clone());
        drop(state);

        self.publish(OrderEvent::Created(order.clone()));
        Ok(order)
    }

    async fn get_order(&self, order_id: Uuid) -> AppResult<PurchaseOrder> {
        let state = self.state.lock().await;
        state
            .orders
            .get(&order_id)
            .cloned()
            .ok_or_else(|| order_not_found(order_id))
    }

    async fn list_orders(&self) -> AppResult<Vec<PurchaseOrder>> {
        let state = self.state.lock().await;
        let mut orders: Vec<PurchaseOrder> = state.orders.values().cloned().collect();
        sort_orders_by_date_desc(&mut orders);
        Ok(orders)
    }

    async fn update_order(&self, order: &PurchaseOrder) -> AppResult<PurchaseOrder> {
        let mut state = self.state.lock().await;
        let stored = state
            .orders
            .get_mut(&order.id)
            .ok_or_else(|| order_not_found(order.id))?;

        if stored.version != order.version {
            return Err(order_conflict(&stored.order_number));
        }

        stored.supplier = order.supplier.clone();
        stored.order_date = order.order_date;
        stored.estimated_arrival_date = order.estimated_arrival_date;
        stored.items = order.items.clone();
        stored.completed = order.completed;
        stored.version += 1;
        stored.updated_at = Utc::now();
        let updated = stored.clone();
        drop(state);

        self.publish(OrderEvent::Updated(updated.clone()));
        Ok(updated)
    }

    async fn delete_order(&self, order_id: Uuid, expected_version: i64) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let stored = state
            .orders
            .get(&order_id)
            .ok_or_else(|| order_not_found(order_id))?;
        stored.ensure_not_completed()?;
        if stored.version != expected_version {
            return Err(order_conflict(&stored.order_number));
        }

        state.orders.remove(&order_id);
        state.idempotency_keys.retain(|_, id| *id != order_id);
        drop(state);

        self.publish(OrderEvent::Deleted(order_id));
        Ok(())
    }

    async fn complete_line(&self, order_id: Uuid, item_id: Uuid) -> AppResult<Completion> {
        let mut state = self.state.lock().await;

        // Work on copies; nothing is written back until every step succeeded
        let mut order = state
            .orders
            .get(&order_id)
            .cloned()
            .ok_or_else(|| order_not_found(order_id))?;
        let received = order.complete_line(item_id)?;

        let mut item = state
            .items
            .get(&item_id)
            .cloned()
            .ok_or_else(|| item_not_found(item_id))?;
        item.quantity += i64::from(received);

        order.version += 1;
        order.updated_at = Utc::now();

        state.items.insert(item.id, item.clone());
        state.orders.insert(order.id, order.clone());
        drop(state);

        self.publish(OrderEvent::Updated(order.clone()));
        Ok(Completion { order, item })
    }

    fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.events.subscribe()
    }

    async fn ping(&self) -> bool {
        true
    }
}
