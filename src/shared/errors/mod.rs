//! Error Types
//!
//! Gateway and use-case error types. Every failure carries enough context
//! (statement text, SQLSTATE) to print a diagnostic line before it
//! propagates to the caller.

use thiserror::Error;

/// Errors raised by the query gateway
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No connection could be leased: the acquire timeout elapsed or a new
    /// connection could not be opened. Nothing was leased.
    #[error("No database connection available: {0}")]
    ConnectionUnavailable(String),

    /// The connection broke mid-operation. It has been discarded.
    #[error("Connection fault while executing query: {detail}")]
    ConnectionFault { statement: String, detail: String },

    /// The engine rejected the statement (syntax, constraint, type).
    #[error("Query failed{}: {detail}", sqlstate_suffix(.code))]
    QueryFailed {
        statement: String,
        code: Option<String>,
        detail: String,
    },

    /// A lease was requested after `shutdown()`.
    #[error("Gateway is shut down; no further connections are leased")]
    ShutdownInProgress,

    /// A row could not be converted into the caller's record type.
    #[error("Data mapping error: {0}")]
    Mapping(String),
}

fn sqlstate_suffix(code: &Option<String>) -> String {
    code.as_deref().map(|c| format!(" [{c}]")).unwrap_or_default()
}

impl GatewayError {
    /// Stable machine-readable code for this error
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ConnectionUnavailable(_) => "CONNECTION_UNAVAILABLE",
            Self::ConnectionFault { .. } => "CONNECTION_FAULT",
            Self::QueryFailed { .. } => "QUERY_FAILED",
            Self::ShutdownInProgress => "SHUTDOWN_IN_PROGRESS",
            Self::Mapping(_) => "MAPPING_ERROR",
        }
    }

    /// Whether the failed connection was discarded rather than returned
    #[must_use]
    pub fn is_connection_fault(&self) -> bool {
        matches!(self, Self::ConnectionFault { .. })
    }

    /// SQLSTATE reported by the engine, if any
    #[must_use]
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::QueryFailed { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Statement text the error was raised for, if any
    #[must_use]
    pub fn statement(&self) -> Option<&str> {
        match self {
            Self::ConnectionFault { statement, .. } | Self::QueryFailed { statement, .. } => {
                Some(statement)
            }
            _ => None,
        }
    }
}

/// Use case-level errors for demo workflow failures
#[derive(Debug, Error)]
pub enum UseCaseError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0} returned no rows")]
    EmptyResult(&'static str),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl UseCaseError {
    /// Get the error code for this error
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::EmptyResult(_) => "EMPTY_RESULT",
            Self::Gateway(err) => err.error_code(),
        }
    }
}
