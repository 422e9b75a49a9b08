//! 持久化实现

pub mod memory;
pub mod postgres;
pub mod schema;

pub use memory::{InMemoryStore, InMemoryUnitOfWork, InMemoryUnitOfWorkFactory, RowLock};
pub use postgres::{PostgresUnitOfWork, PostgresUnitOfWorkFactory};
