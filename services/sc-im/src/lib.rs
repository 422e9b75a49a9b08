//! sc-im - 库存预留与分配核心
//!
//! 按先进先出从入库批次中预留库存，每次批次变动都追加一条不可变的台账分录，
//! 同一请求内的全部变动在一个工作单元中原子提交。

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::InventoryService;
