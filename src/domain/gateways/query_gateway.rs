//! Query Gateway
//!
//! Abstract trait defining the contract for executing statements against
//! a pooled database.

use async_trait::async_trait;

use crate::domain::models::{QueryRequest, Row};
use crate::shared::errors::GatewayError;

/// Snapshot of pool accounting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    /// Open connections, idle or leased
    pub size: u32,
    /// Open connections waiting in the pool
    pub idle: u32,
    /// Connections currently leased to callers
    pub leased: u32,
    /// Configured upper bound on open connections
    pub max_size: u32,
    /// Whether `shutdown()` has been called
    pub closed: bool,
}

/// Single safe entry point for running statements
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueryGateway: Send + Sync {
    /// Lease a connection, run one statement, release the connection and
    /// return the rows.
    async fn execute(&self, request: &QueryRequest) -> Result<Vec<Row>, GatewayError>;

    /// Run several statements in one transaction on a single lease.
    /// Any failure rolls back every statement of the batch.
    async fn execute_in_transaction(
        &self,
        requests: &[QueryRequest],
    ) -> Result<Vec<Vec<Row>>, GatewayError>;

    /// Current pool accounting
    fn status(&self) -> PoolStatus;

    /// Stop leasing, wait for in-flight leases and close every connection.
    /// Calling it again is a no-op.
    async fn shutdown(&self);
}
