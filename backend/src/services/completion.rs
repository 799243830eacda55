//! Line completion and stock reconciliation
//!
//! Completing a line adds its received quantity to the item's stock, marks
//! the line completed and folds the result into the order flag. The store
//! applies all three in one transaction.

use uuid::Uuid;

use crate::error::AppResult;
use crate::store::{Completion, Store};

/// Applies fully received lines to the stock ledger
#[derive(Clone)]
pub struct CompletionService<S> {
    store: S,
}

impl<S: Store> CompletionService<S> {
    /// Create a new CompletionService instance
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Complete one line of an order.
    ///
    /// Fails with `NotFound` for an unknown order or line, `Validation` when
    /// the received quantity or arrival date is missing or the quantity is
    /// short, and `InvalidStateTransition` when the line is already completed.
    pub async fn complete(&self, order_id: Uuid, item_id: Uuid) -> AppResult<Completion> {
        // Fail fast before opening a transaction; the store re-checks under lock
        let order = self.store.get_order(order_id).await?;
        if let Err(err) = order.line(item_id).and_then(|line| line.check_completable()) {
            tracing::warn!(
                order_id = %order_id,
                item_id = %item_id,
                "Line cannot be completed: {}",
                err
            );
            return Err(err.into());
        }

        let completion = self.store.complete_line(order_id, item_id).await?;
        let line = completion.order.line(item_id)?;

        tracing::info!(
            order_id = %order_id,
            item_id = %item_id,
            received = line.received_quantity,
            stock = completion.item.quantity,
            "Line completed and stock updated"
        );
        if completion.order.completed {
            tracing::info!(
                order_id = %order_id,
                order_number = %completion.order.order_number,
                "Purchase order completed"
            );
        }

        Ok(completion)
    }
}
