//! Domain Layer
//!
//! Contains the row/value model, the airline record types and the gateway
//! trait (port). This layer has no dependencies on infrastructure.

pub mod gateways;
pub mod models;

pub use gateways::query_gateway::{PoolStatus, QueryGateway};
pub use models::{FromRow, QueryRequest, Row, Value};
