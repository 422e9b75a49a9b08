//! 查询定义

mod demand_queries;
mod lot_queries;

pub use demand_queries::*;
pub use lot_queries::*;
