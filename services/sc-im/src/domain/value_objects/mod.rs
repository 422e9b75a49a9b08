//! 值对象

mod ids;
mod ledger_reference;
mod location_scope;
mod lot_balance;

pub use ids::*;
pub use ledger_reference::*;
pub use location_scope::*;
pub use lot_balance::*;
