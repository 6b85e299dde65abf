//! Result Rows
//!
//! An engine-native row: ordered column names paired with dynamic values.
//! No schema is assumed; typed records are produced by the caller through
//! [`FromRow`].

use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::value::{FromValue, Value};
use crate::shared::errors::GatewayError;

/// A single result row
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    /// Create a row. Column names are shared between all rows of a result.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if `values` and `columns` differ in length.
    #[must_use]
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Column names in result order
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Values in result order
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Look up a value by column name. With duplicate names the first wins.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| &self.values[idx])
    }

    /// Look up a value by position
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Iterate `(column, value)` pairs in result order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// Decode a column into a concrete type
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Mapping` if the column is missing or holds a
    /// value of an incompatible type.
    pub fn try_get<T: FromValue>(&self, column: &str) -> Result<T, GatewayError> {
        let value = self
            .get(column)
            .ok_or_else(|| GatewayError::Mapping(format!("column '{column}' not found")))?;

        T::from_value(value).ok_or_else(|| {
            GatewayError::Mapping(format!(
                "column '{column}' holds {} value {value}, which cannot be decoded as {}",
                value.sql_type(),
                std::any::type_name::<T>()
            ))
        })
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Caller-supplied conversion from a dynamic row into a typed record
pub trait FromRow: Sized {
    /// Decode one row
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Mapping` when the row does not have the
    /// expected shape.
    fn from_row(row: &Row) -> Result<Self, GatewayError>;
}

impl FromRow for Row {
    fn from_row(row: &Row) -> Result<Self, GatewayError> {
        Ok(row.clone())
    }
}

/// Decode every row of a result set
///
/// # Errors
///
/// Returns the first mapping failure.
pub fn decode_rows<T: FromRow>(rows: &[Row]) -> Result<Vec<T>, GatewayError> {
    rows.iter().map(T::from_row).collect()
}
