//! Query Request Model

use super::value::Value;
use crate::shared::errors::UseCaseError;

/// An immutable statement with its positional parameters.
///
/// Parameters are bound by the driver (`$1`, `$2`, ...) and never
/// interpolated into the statement text.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    statement: String,
    params: Vec<Value>,
}

impl QueryRequest {
    /// Create a request without parameters
    ///
    /// # Errors
    ///
    /// Returns `UseCaseError::InvalidInput` if the statement is blank.
    pub fn new(statement: impl Into<String>) -> Result<Self, UseCaseError> {
        Self::with_params(statement, Vec::new())
    }

    /// Create a request with positional parameters
    ///
    /// # Errors
    ///
    /// Returns `UseCaseError::InvalidInput` if the statement is blank.
    pub fn with_params(
        statement: impl Into<String>,
        params: Vec<Value>,
    ) -> Result<Self, UseCaseError> {
        let statement = statement.into();
        if statement.trim().is_empty() {
            return Err(UseCaseError::InvalidInput(
                "statement text must not be empty".to_string(),
            ));
        }
        Ok(Self { statement, params })
    }

    /// Append one positional parameter
    #[must_use]
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    #[must_use]
    pub fn statement(&self) -> &str {
        &self.statement
    }

    #[must_use]
    pub fn params(&self) -> &[Value] {
        &self.params
    }
}
