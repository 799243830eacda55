//! Item catalog and stock ledger service

use serde::Deserialize;
use shared::{search_catalog, validate_item_code, Item, ItemMetadata, NewItem};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::store::StockStore;

/// Catalog service for item lookup and metadata maintenance
#[derive(Clone)]
pub struct CatalogService<S> {
    store: S,
}

/// Input for registering an item
#[derive(Debug, Deserialize, Validate)]
pub struct CreateItemInput {
    #[validate(length(min = 1, max = 50))]
    pub code: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 100))]
    #[serde(default)]
    pub category: String,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub quantity: i64,
    #[validate(length(max = 200))]
    pub location: Option<String>,
}

/// Input for editing item metadata
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateItemInput {
    #[validate(length(min = 1, max = 50))]
    pub code: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(max = 200))]
    pub location: Option<String>,
}

impl<S: StockStore> CatalogService<S> {
    /// Create a new CatalogService instance
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Items ordered by code, optionally filtered by code or name
    pub async fn list_items(&self, search: Option<&str>) -> AppResult<Vec<Item>> {
        let items = self.store.list_items().await?;
        Ok(search_catalog(items, search))
    }

    pub async fn get_item(&self, item_id: Uuid) -> AppResult<Item> {
        self.store.get_item(item_id).await
    }

    /// Register an item in the stock ledger
    pub async fn create_item(&self, input: CreateItemInput) -> AppResult<Item> {
        input.validate()?;
        validate_item_code(&input.code).map_err(|msg| AppError::Validation {
            field: "code".to_string(),
            message: msg.to_string(),
            message_id: "Kode barang tidak valid".to_string(),
        })?;

        let item = self
            .store
            .create_item(NewItem {
                code: input.code,
                name: input.name.trim().to_string(),
                category: input.category,
                quantity: input.quantity,
                location: input.location,
            })
            .await?;

        tracing::info!(item_id = %item.id, code = %item.code, "Item registered");
        Ok(item)
    }

    /// Update code, name or location. Quantity is never edited here.
    pub async fn update_item(&self, item_id: Uuid, input: UpdateItemInput) -> AppResult<Item> {
        input.validate()?;
        if let Some(code) = &input.code {
            validate_item_code(code).map_err(|msg| AppError::Validation {
                field: "code".to_string(),
                message: msg.to_string(),
                message_id: "Kode barang tidak valid".to_string(),
            })?;
        }

        let item = self
            .store
            .update_item_metadata(
                item_id,
                ItemMetadata {
                    code: input.code,
                    name: input.name,
                    location: input.location,
                },
            )
            .await?;

        tracing::info!(item_id = %item.id, code = %item.code, "Item metadata updated");
        Ok(item)
    }

    pub async fn delete_item(&self, item_id: Uuid) -> AppResult<()> {
        self.store.delete_item(item_id).await?;
        tracing::info!(item_id = %item_id, "Item deleted");
        Ok(())
    }
}
