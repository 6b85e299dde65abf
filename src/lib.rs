//! Airline Query Gateway
//!
//! A pooled query-execution gateway over PostgreSQL, exercised by a catalog
//! of SQL demos against an airline schema. Follows Clean/Hexagonal
//! Architecture: demos depend on the `QueryGateway` port, the sqlx-backed
//! adapter lives in infrastructure.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;
