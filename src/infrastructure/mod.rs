//! Infrastructure Layer
//!
//! Contains all external concerns: the driving adapter (console output)
//! and driven adapters (Postgres gateway, pool, configuration).

pub mod driven_adapters;
pub mod driving_adapters;
