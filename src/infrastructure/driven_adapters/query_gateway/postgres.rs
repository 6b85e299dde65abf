//! PostgreSQL Query Gateway Implementation
//!
//! Implements the `QueryGateway` trait on top of a bounded SQLx pool.
//!
//! Every lease is a `PoolConnection` guard. On completion the connection is
//! handed back to the pool before the result is delivered, so `status()`
//! observed right after a call counts it as idle. A future abandoned by its
//! caller still releases the lease when the guard drops. Connections that
//! faulted are closed instead so the pool opens a fresh one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnection, PgRow};
use sqlx::{Connection, PgPool, Postgres};
use tokio::sync::mpsc;

use super::decode::{bind_params, decode_rows};
use crate::domain::gateways::{PoolStatus, QueryGateway};
use crate::domain::models::{QueryRequest, Row};
use crate::infrastructure::driven_adapters::config::GatewayConfig;
use crate::infrastructure::driven_adapters::database::{create_pool, PoolFaults, FAULT_CAPACITY};
use crate::shared::errors::GatewayError;

/// PostgreSQL implementation of `QueryGateway`
#[derive(Clone)]
pub struct PgQueryGateway {
    pool: PgPool,
    max_size: u32,
    shut_down: Arc<AtomicBool>,
}

impl PgQueryGateway {
    /// Create a gateway over a lazily connected pool.
    ///
    /// The returned receiver yields asynchronous pool faults; the owner of
    /// the process is expected to watch it and terminate on a fault.
    #[must_use]
    pub fn new(config: &GatewayConfig) -> (Self, PoolFaults) {
        let (fault_tx, fault_rx) = mpsc::channel(FAULT_CAPACITY);
        let pool = create_pool(config, fault_tx);
        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.name,
            max_connections = config.max_connections,
            idle_timeout_ms = config.idle_timeout_ms,
            acquire_timeout_ms = config.acquire_timeout_ms,
            "Database connection pool created"
        );
        (Self::from_pool(pool, config.max_connections), fault_rx)
    }

    /// Create a gateway and verify that one connection can be leased.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::ConnectionUnavailable` if the database cannot
    /// be reached within the acquire timeout.
    pub async fn connect(config: &GatewayConfig) -> Result<(Self, PoolFaults), GatewayError> {
        let (gateway, faults) = Self::new(config);
        let mut conn = gateway.lease("<connect>").await?;
        conn.return_to_pool().await;
        tracing::info!("Database connection verified");
        Ok((gateway, faults))
    }

    /// Wrap an existing pool
    #[must_use]
    pub fn from_pool(pool: PgPool, max_size: u32) -> Self {
        Self {
            pool,
            max_size,
            shut_down: Arc::new(AtomicBool::new(false)),
        }
    }

    fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire) || self.pool.is_closed()
    }

    async fn lease(&self, statement: &str) -> Result<PoolConnection<Postgres>, GatewayError> {
        if self.is_shut_down() {
            tracing::warn!(statement, "Lease rejected: gateway is shut down");
            return Err(GatewayError::ShutdownInProgress);
        }

        self.pool.acquire().await.map_err(|e| {
            let error = match e {
                sqlx::Error::PoolClosed => GatewayError::ShutdownInProgress,
                other => GatewayError::ConnectionUnavailable(other.to_string()),
            };
            tracing::error!(statement, error = %error, "Failed to lease a connection");
            error
        })
    }

    /// Release a lease after a failed statement: faulted connections are
    /// closed, everything else goes back to the pool.
    async fn release_failed(&self, mut conn: PoolConnection<Postgres>, error: &GatewayError) {
        if error.is_connection_fault() {
            if let Err(e) = conn.close().await {
                tracing::debug!(error = %e, "Error while closing faulted connection");
            }
            tracing::warn!("Discarded faulted connection");
        } else {
            conn.return_to_pool().await;
        }
    }
}

#[async_trait]
impl QueryGateway for PgQueryGateway {
    async fn execute(&self, request: &QueryRequest) -> Result<Vec<Row>, GatewayError> {
        let statement = request.statement();
        if self.is_shut_down() {
            tracing::warn!(statement, "Query rejected: gateway is shut down");
            return Err(GatewayError::ShutdownInProgress);
        }

        let query = bind_params(statement, request.params()).inspect_err(|e| {
            tracing::error!(statement, error = %e, "Error executing query");
        })?;

        let mut conn = self.lease(statement).await?;
        let started = Instant::now();
        let outcome = query.fetch_all(&mut *conn).await;
        let elapsed = started.elapsed();

        match outcome {
            Ok(pg_rows) => {
                conn.return_to_pool().await;
                let rows = decode_rows(&pg_rows);
                log_success(statement, elapsed, &rows);
                Ok(rows)
            }
            Err(e) => {
                let error = classify(statement, e);
                self.release_failed(conn, &error).await;
                log_failure(statement, elapsed, &error);
                Err(error)
            }
        }
    }

    async fn execute_in_transaction(
        &self,
        requests: &[QueryRequest],
    ) -> Result<Vec<Vec<Row>>, GatewayError> {
        let Some(first) = requests.first() else {
            return Ok(Vec::new());
        };
        if self.is_shut_down() {
            tracing::warn!(statement = first.statement(), "Transaction rejected: gateway is shut down");
            return Err(GatewayError::ShutdownInProgress);
        }

        let mut conn = self.lease(first.statement()).await?;
        let started = Instant::now();
        let outcome = run_transaction(&mut conn, requests).await;
        let elapsed = started.elapsed();

        match outcome {
            Ok(batches) => {
                conn.return_to_pool().await;
                let results: Vec<Vec<Row>> = batches.iter().map(|b| decode_rows(b)).collect();
                for (request, rows) in requests.iter().zip(&results) {
                    log_success(request.statement(), elapsed, rows);
                }
                tracing::info!(
                    statements = requests.len(),
                    elapsed_ms = millis(elapsed),
                    "Transaction committed"
                );
                Ok(results)
            }
            Err(error) => {
                self.release_failed(conn, &error).await;
                log_failure(error.statement().unwrap_or_default(), elapsed, &error);
                tracing::warn!(statements = requests.len(), "Transaction rolled back");
                Err(error)
            }
        }
    }

    fn status(&self) -> PoolStatus {
        let size = self.pool.size();
        let idle = u32::try_from(self.pool.num_idle()).unwrap_or(size).min(size);
        PoolStatus {
            size,
            idle,
            leased: size - idle,
            max_size: self.max_size,
            closed: self.is_shut_down(),
        }
    }

    async fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            tracing::debug!("Gateway already shut down");
            return;
        }

        let status = self.status();
        tracing::info!(
            size = status.size,
            leased = status.leased,
            "Shutting down query gateway; waiting for leased connections"
        );
        self.pool.close().await;
        tracing::info!("Query gateway shut down");
    }
}

async fn run_transaction(
    conn: &mut PgConnection,
    requests: &[QueryRequest],
) -> Result<Vec<Vec<PgRow>>, GatewayError> {
    let mut tx = conn.begin().await.map_err(|e| classify("BEGIN", e))?;

    let mut results = Vec::with_capacity(requests.len());
    for request in requests {
        let outcome = match bind_params(request.statement(), request.params()) {
            Ok(query) => query
                .fetch_all(&mut *tx)
                .await
                .map_err(|e| classify(request.statement(), e)),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(rows) => results.push(rows),
            Err(error) => {
                if let Err(e) = tx.rollback().await {
                    tracing::debug!(error = %e, "Rollback failed");
                }
                return Err(error);
            }
        }
    }

    tx.commit().await.map_err(|e| classify("COMMIT", e))?;
    Ok(results)
}

/// Map a driver error raised while a statement was running
pub(crate) fn classify(statement: &str, err: sqlx::Error) -> GatewayError {
    match err {
        sqlx::Error::Database(db) => {
            let code = db.code().map(|c| c.into_owned());
            let detail = match db.constraint() {
                Some(constraint) => format!("{} (constraint {constraint})", db.message()),
                None => db.message().to_string(),
            };
            if code.as_deref().is_some_and(is_connection_state) {
                GatewayError::ConnectionFault {
                    statement: statement.to_string(),
                    detail,
                }
            } else {
                GatewayError::QueryFailed {
                    statement: statement.to_string(),
                    code,
                    detail,
                }
            }
        }
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::Protocol(_) | sqlx::Error::WorkerCrashed => {
            GatewayError::ConnectionFault {
                statement: statement.to_string(),
                detail: err.to_string(),
            }
        }
        sqlx::Error::PoolClosed => GatewayError::ShutdownInProgress,
        sqlx::Error::PoolTimedOut => GatewayError::ConnectionUnavailable(err.to_string()),
        other => GatewayError::QueryFailed {
            statement: statement.to_string(),
            code: None,
            detail: other.to_string(),
        },
    }
}

/// SQLSTATE class 08 (connection exception) and 57P (operator
/// intervention, e.g. the server shutting down) mean the session is gone.
fn is_connection_state(code: &str) -> bool {
    code.starts_with("08") || code.starts_with("57P")
}

fn millis(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64() * 1000.0
}

fn log_success(statement: &str, elapsed: Duration, rows: &[Row]) {
    if rows.is_empty() {
        tracing::info!(
            statement,
            elapsed_ms = millis(elapsed),
            row_count = 0,
            "Query executed: no rows"
        );
        return;
    }

    let rendered = serde_json::to_string(rows)
        .unwrap_or_else(|e| format!("<rows could not be rendered: {e}>"));
    tracing::info!(
        statement,
        elapsed_ms = millis(elapsed),
        row_count = rows.len(),
        rows = %rendered,
        "Query executed"
    );
}

fn log_failure(statement: &str, elapsed: Duration, error: &GatewayError) {
    tracing::error!(
        statement,
        elapsed_ms = millis(elapsed),
        code = error.error_code(),
        sql_state = error.sql_state().unwrap_or_default(),
        error = %error,
        "Error executing query"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Value;
    use crate::infrastructure::driven_adapters::config::Password;

    /// Config pointing at a port where nothing listens
    fn unreachable_config() -> GatewayConfig {
        GatewayConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            user: "airline".to_string(),
            password: Password::new("unused"),
            name: "airline".to_string(),
            max_connections: 2,
            idle_timeout_ms: 30_000,
            acquire_timeout_ms: 200,
        }
    }

    #[tokio::test]
    async fn should_fail_with_connection_unavailable_when_database_is_unreachable() {
        let (gateway, _faults) = PgQueryGateway::new(&unreachable_config());
        let request = QueryRequest::new("SELECT 1").unwrap();

        let result = tokio::time::timeout(Duration::from_secs(10), gateway.execute(&request))
            .await
            .expect("execute must not block past the acquire timeout");

        assert!(matches!(result, Err(GatewayError::ConnectionUnavailable(_))));
        assert_eq!(gateway.status().leased, 0);
    }

    #[tokio::test]
    async fn should_reject_queries_after_shutdown_without_io() {
        let (gateway, _faults) = PgQueryGateway::new(&unreachable_config());

        gateway.shutdown().await;
        let started = Instant::now();
        let result = gateway.execute(&QueryRequest::new("SELECT 1").unwrap()).await;

        assert!(matches!(result, Err(GatewayError::ShutdownInProgress)));
        // Anything close to the acquire timeout would mean a connect attempt.
        assert!(started.elapsed() < Duration::from_millis(100));
        assert!(gateway.status().closed);
    }

    #[tokio::test]
    async fn should_treat_second_shutdown_as_noop() {
        let (gateway, _faults) = PgQueryGateway::new(&unreachable_config());

        gateway.shutdown().await;
        gateway.shutdown().await;

        assert!(gateway.status().closed);
        assert!(matches!(
            gateway
                .execute_in_transaction(&[QueryRequest::new("SELECT 1").unwrap()])
                .await,
            Err(GatewayError::ShutdownInProgress)
        ));
    }

    #[tokio::test]
    async fn should_not_lease_for_empty_transaction() {
        let (gateway, _faults) = PgQueryGateway::new(&unreachable_config());

        let results = gateway.execute_in_transaction(&[]).await.unwrap();

        assert!(results.is_empty());
        assert_eq!(gateway.status().size, 0);
    }

    #[tokio::test]
    async fn should_reject_unsupported_parameters_without_leasing() {
        let (gateway, _faults) = PgQueryGateway::new(&unreachable_config());
        let request = QueryRequest::with_params(
            "SELECT $1",
            vec![Value::Unsupported("tsvector".to_string())],
        )
        .unwrap();

        let result = gateway.execute(&request).await;

        assert!(matches!(result, Err(GatewayError::QueryFailed { code: None, .. })));
        assert_eq!(gateway.status().size, 0);
    }

    #[test]
    fn should_classify_io_errors_as_connection_faults() {
        let err = sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "connection reset by peer",
        ));

        let classified = classify("SELECT 1", err);

        assert!(classified.is_connection_fault());
        assert_eq!(classified.statement(), Some("SELECT 1"));
    }

    #[test]
    fn should_classify_protocol_errors_as_connection_faults() {
        let classified = classify("SELECT 1", sqlx::Error::Protocol("unexpected message".into()));

        assert!(classified.is_connection_fault());
    }

    #[test]
    fn should_classify_pool_errors() {
        assert!(matches!(
            classify("SELECT 1", sqlx::Error::PoolTimedOut),
            GatewayError::ConnectionUnavailable(_)
        ));
        assert!(matches!(
            classify("SELECT 1", sqlx::Error::PoolClosed),
            GatewayError::ShutdownInProgress
        ));
    }

    #[test]
    fn should_classify_decode_problems_as_query_failures() {
        let classified = classify("SELECT 1", sqlx::Error::ColumnNotFound("x".to_string()));

        assert!(matches!(classified, GatewayError::QueryFailed { code: None, .. }));
    }

    #[test]
    fn should_recognize_connection_sqlstates() {
        assert!(is_connection_state("08006"));
        assert!(is_connection_state("57P01"));
        assert!(!is_connection_state("23502"));
        assert!(!is_connection_state("42601"));
    }
}
