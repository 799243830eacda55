//! Business logic services for the Inventory Purchasing Platform

pub mod catalog;
pub mod completion;
pub mod order_builder;
pub mod receiving;

pub use catalog::CatalogService;
pub use completion::CompletionService;
pub use order_builder::OrderBuilderService;
pub use receiving::ReceivingService;
