//! cuba-cqrs-core - CQRS 核心库
//!
//! Command/Query trait、Handler、Middleware

mod handler;
mod middleware;

pub use handler::*;
pub use middleware::*;
