//! 领域服务

mod allocator;
mod demand_tracker;
mod ledger_chain;
mod lot_selector;

pub use allocator::*;
pub use demand_tracker::*;
pub use ledger_chain::*;
pub use lot_selector::*;
