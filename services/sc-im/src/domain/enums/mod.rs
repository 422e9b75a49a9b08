//! 领域枚举

mod demand_source;
mod demand_state;
mod ledger_action;
mod ledger_reason;

pub use demand_source::*;
pub use demand_state::*;
pub use ledger_action::*;
pub use ledger_reason::*;
