//! Application Layer
//!
//! Contains the demo use cases that drive queries through the gateway.
//! Use cases depend on the `QueryGateway` port, not on the Postgres adapter.

pub mod use_cases;
