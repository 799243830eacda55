//! Route definitions for the Inventory Purchasing Platform

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{handlers, store::Store, AppState};

/// Create API routes
pub fn api_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/health", get(handlers::health_check::<S>))
        // Item catalog and stock ledger
        .nest("/items", item_routes::<S>())
        // Purchase orders, receiving and completion
        .nest("/purchase-orders", purchase_order_routes::<S>())
}

/// Item catalog routes
fn item_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route(
            "/",
            get(handlers::list_items::<S>).post(handlers::create_item::<S>),
        )
        .route(
            "/:item_id",
            get(handlers::get_item::<S>)
                .put(handlers::update_item::<S>)
                .delete(handlers::delete_item::<S>),
        )
}

/// Purchase order routes
fn purchase_order_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route(
            "/",
            get(handlers::list_orders::<S>).post(handlers::create_order::<S>),
        )
        .route(
            "/:order_id",
            get(handlers::get_order::<S>)
                .put(handlers::update_order::<S>)
                .delete(handlers::delete_order::<S>),
        )
        .route(
            "/:order_id/estimated-arrival-date",
            put(handlers::set_estimated_arrival_date::<S>),
        )
        .route(
            "/:order_id/items/:item_id/received-quantity",
            put(handlers::set_received_quantity::<S>),
        )
        .route(
            "/:order_id/items/:item_id/arrival-date",
            put(handlers::set_actual_arrival_date::<S>),
        )
        .route(
            "/:order_id/items/:item_id/complete",
            post(handlers::complete_order_item::<S>),
        )
}
