//! Domain Models
//!
//! Core domain entities and value objects.

pub mod airline;
pub mod query;
pub mod row;
pub mod value;

pub use query::QueryRequest;
pub use row::{decode_rows, FromRow, Row};
pub use value::{FromValue, Value};
