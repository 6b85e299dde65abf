//! Driven Adapters
//!
//! Implementations of gateway traits for external systems:
//! - PostgreSQL query gateway
//! - Connection pool construction and fault reporting
//! - Configuration

pub mod config;
pub mod database;
pub mod query_gateway;

pub use config::GatewayConfig;
pub use database::{PoolFault, PoolFaults};
pub use query_gateway::PgQueryGateway;
