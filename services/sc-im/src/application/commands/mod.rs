//! 命令定义

mod allocate_stock_command;
mod place_demand_command;
mod receive_stock_command;

pub use allocate_stock_command::*;
pub use place_demand_command::*;
pub use receive_stock_command::*;
