//! 仓储接口

mod demand_line_repository;
mod ledger_repository;
mod lot_repository;
mod material_repository;

pub use demand_line_repository::*;
pub use ledger_repository::*;
pub use lot_repository::*;
pub use material_repository::*;
