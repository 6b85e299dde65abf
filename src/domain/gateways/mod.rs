//! Gateway Traits (Ports)
//!
//! Abstract interfaces defining contracts for external dependencies.
//! These are implemented by driven adapters in the infrastructure layer.

pub mod query_gateway;

#[cfg(test)]
pub use query_gateway::MockQueryGateway;
pub use query_gateway::{PoolStatus, QueryGateway};
