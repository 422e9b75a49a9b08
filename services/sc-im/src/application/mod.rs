//! 应用层

pub mod commands;
pub mod handlers;
pub mod ledger_writer;
pub mod metrics;
pub mod queries;
pub mod service;

pub use handlers::*;
pub use service::InventoryService;
