//! PostgreSQL store
//!
//! Orders keep their lines in a JSONB column so the aggregate is read and
//! written as one row, like the document it models.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use shared::{format_order_number, Item, ItemMetadata, NewItem, OrderItem, PurchaseOrder};
use sqlx::{types::Json, FromRow, PgExecutor, PgPool};
use tokio::sync::broadcast;
use uuid::Uuid;

use super::{
    order_conflict, Completion, ItemCatalog, NewPurchaseOrder, OrderEvent, OrderStore,
    StockStore, EVENT_CHANNEL_CAPACITY,
};
use crate::error::{AppError, AppResult};

const ITEM_COLUMNS: &str = "id, code, name, category, quantity, location, created_at";

const ORDER_COLUMNS: &str = "id, order_number, supplier, order_date, estimated_arrival_date, \
                             items, completed, version, created_at, updated_at";

/// Postgres-backed store
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
    events: broadcast::Sender<OrderEvent>,
    order_number_prefix: Arc<str>,
}

/// Row for item queries
#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    code: String,
    name: String,
    category: String,
    quantity: i64,
    location: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Item {
            id: row.id,
            code: row.code,
            name: row.name,
            category: row.category,
            quantity: row.quantity,
            location: row.location,
            created_at: row.created_at,
        }
    }
}

/// Row for purchase order queries
#[derive(Debug, FromRow)]
struct OrderRow {
    id: Uuid,
    order_number: String,
    supplier: String,
    order_date: NaiveDate,
    estimated_arrival_date: Option<NaiveDate>,
    items: Json<Vec<OrderItem>>,
    completed: bool,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for PurchaseOrder {
    fn from(row: OrderRow) -> Self {
        PurchaseOrder {
            id: row.id,
            order_number: row.order_number,
            supplier: row.supplier,
            order_date: row.order_date,
            estimated_arrival_date: row.estimated_arrival_date,
            items: row.items.0,
            completed: row.completed,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn order_not_found(order_id: Uuid) -> AppError {
    AppError::NotFound(format!("Purchase order {}", order_id))
}

fn item_not_found(item_id: Uuid) -> AppError {
    AppError::NotFound(format!("Item {}", item_id))
}

impl PgStore {
    pub fn new(db: PgPool, order_number_prefix: &str) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            db,
            events,
            order_number_prefix: Arc::from(order_number_prefix),
        }
    }

    /// Apply pending migrations
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .map_err(|e| AppError::StorageError(e.to_string()))
    }

    fn publish(&self, event: OrderEvent) {
        let _ = self.events.send(event);
    }

    async fn find_by_idempotency_key(&self, key: Uuid) -> AppResult<Option<PurchaseOrder>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM purchase_orders WHERE idempotency_key = $1",
            ORDER_COLUMNS
        ))
        .bind(key)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Into::into))
    }
}

impl ItemCatalog for PgStore {
    async fn list_items(&self) -> AppResult<Vec<Item>> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {} FROM items ORDER BY code",
            ITEM_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_item(&self, item_id: Uuid) -> AppResult<Item> {
        sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {} FROM items WHERE id = $1",
            ITEM_COLUMNS
        ))
        .bind(item_id)
        .fetch_optional(&self.db)
        .await?
        .map(Into::into)
        .ok_or_else(|| item_not_found(item_id))
    }
}

impl StockStore for PgStore {
    async fn create_item(&self, input: NewItem) -> AppResult<Item> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            INSERT INTO items (code, name, category, quantity, location)
            VALUES ($1, $2, $3, $4, NULLIF($5, ''))
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(&input.code)
        .bind(&input.name)
        .bind(&input.category)
        .bind(input.quantity)
        .bind(&input.location)
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::from_unique(e, "code"))?;

        Ok(row.into())
    }

    async fn update_item_metadata(&self, item_id: Uuid, metadata: ItemMetadata) -> AppResult<Item> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            UPDATE items
            SET code = COALESCE($1, code),
                name = COALESCE($2, name),
                location = CASE WHEN $3::TEXT IS NULL THEN location ELSE NULLIF($3, '') END
            WHERE id = $4
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(&metadata.code)
        .bind(&metadata.name)
        .bind(&metadata.location)
        .bind(item_id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| AppError::from_unique(e, "code"))?
        .ok_or_else(|| item_not_found(item_id))?;

        Ok(row.into())
    }

    async fn increment_quantity(&self, item_id: Uuid, by: u32) -> AppResult<Item> {
        add_stock(&self.db, item_id, by).await
    }

    async fn delete_item(&self, item_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(item_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(item_not_found(item_id));
        }

        Ok(())
    }
}

/// Read-increment-write done by the database, on the pool or inside a transaction
async fn add_stock<'e, E>(executor: E, item_id: Uuid, by: u32) -> AppResult<Item>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, ItemRow>(&format!(
        "UPDATE items SET quantity = quantity + $1 WHERE id = $2 RETURNING {}",
        ITEM_COLUMNS
    ))
    .bind(i64::from(by))
    .bind(item_id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| item_not_found(item_id))?;

    Ok(row.into())
}

impl OrderStore for PgStore {
    async fn create_order(&self, input: NewPurchaseOrder) -> AppResult<PurchaseOrder> {
        if let Some(key) = input.idempotency_key {
            if let Some(existing) = self.find_by_idempotency_key(key).await? {
                return Ok(existing);
            }
        }

        let sequence =
            sqlx::query_scalar::<_, i64>("SELECT nextval('purchase_order_number_seq')")
                .fetch_one(&self.db)
                .await?;
        let order_number =
            format_order_number(&self.order_number_prefix, Utc::now().date_naive(), sequence);
        let completed = !input.items.is_empty() && input.items.iter().all(|l| l.completed);

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            INSERT INTO purchase_orders (order_number, supplier, order_date, items, completed, idempotency_key)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (idempotency_key) DO NOTHING
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(&order_number)
        .bind(&input.supplier)
        .bind(input.order_date)
        .bind(Json(&input.items))
        .bind(completed)
        .bind(input.idempotency_key)
        .fetch_optional(&self.db)
        .await?;

        let order: PurchaseOrder = match (row, input.idempotency_key) {
            (Some(row), _) => row.into(),
            // Lost the race to a concurrent replay of the same request
            (None, Some(key)) => self
                .find_by_idempotency_key(key)
                .await?
                .ok_or_else(|| AppError::Internal("idempotent order vanished".to_string()))?,
            (None, None) => {
                return Err(AppError::Internal(
                    "order insert returned no row".to_string(),
                ))
            }
        };

        self.publish(OrderEvent::Created(order.clone()));
        Ok(order)
    }

    async fn get_order(&self, order_id: Uuid) -> AppResult<PurchaseOrder> {
        sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM purchase_orders WHERE id = $1",
            ORDER_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?
        .map(Into::into)
        .ok_or_else(|| order_not_found(order_id))
    }

    async fn list_orders(&self) -> AppResult<Vec<PurchaseOrder>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM purchase_orders ORDER BY order_date DESC, created_at DESC",
            ORDER_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_order(&self, order: &PurchaseOrder) -> AppResult<PurchaseOrder> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            UPDATE purchase_orders
            SET supplier = $1, order_date = $2, estimated_arrival_date = $3, items = $4,
                completed = $5, version = version + 1, updated_at = NOW()
            WHERE id = $6 AND version = $7
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(&order.supplier)
        .bind(order.order_date)
        .bind(order.estimated_arrival_date)
        .bind(Json(&order.items))
        .bind(order.completed)
        .bind(order.id)
        .bind(order.version)
        .fetch_optional(&self.db)
        .await?;

        let Some(row) = row else {
            // Either gone, or someone else wrote first
            self.get_order(order.id).await?;
            return Err(order_conflict(&order.order_number));
        };

        let updated: PurchaseOrder = row.into();
        self.publish(OrderEvent::Updated(updated.clone()));
        Ok(updated)
    }

    async fn delete_order(&self, order_id: Uuid, expected_version: i64) -> AppResult<()> {
        let result = sqlx::query(
            "DELETE FROM purchase_orders WHERE id = $1 AND version = $2 AND completed = FALSE",
        )
        .bind(order_id)
        .bind(expected_version)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            // Gone, completed meanwhile, or changed since it was read
            let current = self.get_order(order_id).await?;
            current.ensure_not_completed()?;
            return Err(order_conflict(&current.order_number));
        }

        self.publish(OrderEvent::Deleted(order_id));
        Ok(())
    }

    async fn complete_line(&self, order_id: Uuid, item_id: Uuid) -> AppResult<Completion> {
        // Start transaction; dropping it on any early return rolls everything back
        let mut tx = self.db.begin().await?;

        let mut order: PurchaseOrder = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM purchase_orders WHERE id = $1 FOR UPDATE",
            ORDER_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| order_not_found(order_id))?
        .into();

        let received = order.complete_line(item_id)?;

        let item = add_stock(&mut *tx, item_id, received).await?;

        let order: PurchaseOrder = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            UPDATE purchase_orders
            SET items = $1, completed = $2, version = version + 1, updated_at = NOW()
            WHERE id = $3
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(Json(&order.items))
        .bind(order.completed)
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?
        .into();

        tx.commit().await?;

        self.publish(OrderEvent::Updated(order.clone()));
        Ok(Completion { order, item })
    }

    fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.events.subscribe()
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.db).await.is_ok()
    }
}
