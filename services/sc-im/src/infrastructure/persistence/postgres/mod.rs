//! PostgreSQL 持久化

mod converters;
mod rows;
mod tx_repositories;
mod unit_of_work;

pub use tx_repositories::*;
pub use unit_of_work::*;
