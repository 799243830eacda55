//! HTTP handlers for the Inventory Purchasing Platform

mod health;
mod items;
mod purchase_orders;

pub use health::*;
pub use items::*;
pub use purchase_orders::*;
