//! Order draft assembled before a purchase order is committed

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Item, OrderItem, PurchaseOrder};
use crate::error::{DomainError, DomainResult};
use crate::validation::{validate_order_quantity, validate_supplier};

/// Unsaved order contents. When editing, `order_id` names the order being overwritten.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderDraft {
    pub order_id: Option<Uuid>,
    pub supplier: String,
    pub order_date: NaiveDate,
    pub lines: Vec<OrderItem>,
}

impl OrderDraft {
    pub fn new(supplier: impl Into<String>, order_date: NaiveDate) -> Self {
        Self {
            order_id: None,
            supplier: supplier.into(),
            order_date,
            lines: Vec::new(),
        }
    }

    /// Start editing a stored order, keeping each line's receiving progress
    pub fn from_order(order: &PurchaseOrder) -> DomainResult<Self> {
        order.ensure_not_completed()?;
        Ok(Self {
            order_id: Some(order.id),
            supplier: order.supplier.clone(),
            order_date: order.order_date,
            lines: order.items.clone(),
        })
    }

    pub fn contains(&self, item_id: Uuid) -> bool {
        self.lines.iter().any(|line| line.item_id == item_id)
    }

    /// Append a line for `item`. One line per distinct item.
    pub fn add_line(&mut self, item: Option<&Item>, quantity: u32) -> DomainResult<()> {
        let item = item.ok_or_else(|| {
            DomainError::validation(
                "item_id",
                "Select an item first",
                "Pilih barang terlebih dahulu",
            )
        })?;

        if self.contains(item.id) {
            return Err(DomainError::validation(
                "item_id",
                &format!("Item {} is already in the order", item.code),
                "Barang sudah ada dalam order",
            ));
        }

        validate_order_quantity(quantity).map_err(|msg| {
            DomainError::validation("quantity", msg, "Jumlah order minimal 1")
        })?;

        self.lines.push(OrderItem::from_item(item, quantity));
        Ok(())
    }

    /// Drop the line for `item_id`; absent lines are ignored.
    /// Completed lines stay, since their stock has already been applied.
    pub fn remove_line(&mut self, item_id: Uuid) -> DomainResult<()> {
        if let Some(line) = self.lines.iter().find(|l| l.item_id == item_id) {
            if line.completed {
                return Err(DomainError::State(format!(
                    "line {} is completed and cannot be removed",
                    line.item_code
                )));
            }
        }
        self.lines.retain(|line| line.item_id != item_id);
        Ok(())
    }

    /// Change the ordered quantity of an open line
    pub fn set_line_quantity(&mut self, item_id: Uuid, quantity: u32) -> DomainResult<()> {
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.item_id == item_id)
            .ok_or_else(|| DomainError::NotFound(format!("Order item {}", item_id)))?;

        if line.quantity == quantity {
            return Ok(());
        }
        if line.completed {
            return Err(DomainError::State(format!(
                "line {} is completed and its quantity cannot change",
                line.item_code
            )));
        }
        validate_order_quantity(quantity).map_err(|msg| {
            DomainError::validation("quantity", msg, "Jumlah order minimal 1")
        })?;

        line.quantity = quantity;
        Ok(())
    }

    pub fn validate_for_commit(&self) -> DomainResult<()> {
        if self.lines.is_empty() {
            return Err(DomainError::validation(
                "items",
                "Add at least one item to the order",
                "Tambahkan barang terlebih dahulu",
            ));
        }

        validate_supplier(&self.supplier).map_err(|msg| {
            DomainError::validation("supplier", msg, "Masukkan nama supplier")
        })?;

        Ok(())
    }

    /// Overwrite supplier, date and lines of the order being edited.
    /// Identity and order number are preserved.
    pub fn apply_to(self, order: &mut PurchaseOrder) -> DomainResult<()> {
        self.validate_for_commit()?;
        order.ensure_not_completed()?;
        order.supplier = self.supplier.trim().to_string();
        order.order_date = self.order_date;
        order.items = self.lines;
        order.recompute_completed();
        Ok(())
    }
}
