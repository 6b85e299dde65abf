//! Query Gateway Adapters
//!
//! Database-backed implementations of the `QueryGateway` port.

mod decode;
pub mod postgres;

pub use postgres::PgQueryGateway;
