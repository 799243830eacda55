//! Shared types and models for the Inventory Purchasing Platform
//!
//! This crate contains the purchase order domain: catalog items, orders and
//! their line items, the draft builder used before an order is persisted, and
//! the receiving and completion rules. It performs no I/O.

pub mod error;
pub mod models;
pub mod validation;

pub use error::*;
pub use models::*;
pub use validation::*;
