//! 领域实体

mod demand_line;
mod ledger_entry;
mod lot;

pub use demand_line::*;
pub use ledger_entry::*;
pub use lot::*;
