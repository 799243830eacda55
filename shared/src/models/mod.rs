//! Domain models for the Inventory Purchasing Platform

mod draft;
mod item;
mod purchase_order;

pub use draft::*;
pub use item::*;
pub use purchase_order::*;
