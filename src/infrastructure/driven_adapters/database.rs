//! Database Connection Management
//!
//! Builds the bounded PostgreSQL pool and reports asynchronous pool faults.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Connection, PgPool};
use tokio::sync::mpsc::{self, error::TrySendError};

use super::config::GatewayConfig;

/// An unrecoverable pool-level fault, such as an idle connection that was
/// dropped by the server while sitting in the pool
#[derive(Debug, Clone)]
pub struct PoolFault {
    pub detail: String,
    pub occurred_at: DateTime<Utc>,
}

impl std::fmt::Display for PoolFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unexpected error on idle connection at {}: {}", self.occurred_at.to_rfc3339(), self.detail)
    }
}

/// Faults buffered for a receiver that is not reading; later ones are
/// logged and dropped
pub const FAULT_CAPACITY: usize = 16;

/// Receiving side of the pool fault channel
pub type PoolFaults = mpsc::Receiver<PoolFault>;

/// Create a PostgreSQL connection pool from configuration.
///
/// No connection is opened until the first lease. Idle connections are
/// pinged before being handed out; a failed ping discards the connection
/// and publishes a [`PoolFault`] on `faults`.
///
/// Detection happens at lease time only: a connection that dies while idle
/// is reported when it is next picked for a lease, not when it dies. The
/// lease that found it proceeds on a fresh connection.
#[must_use]
pub fn create_pool(config: &GatewayConfig, faults: mpsc::Sender<PoolFault>) -> PgPool {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(0)
        .idle_timeout(config.idle_timeout())
        .acquire_timeout(config.acquire_timeout())
        .test_before_acquire(false)
        .before_acquire(move |conn, meta| {
            let faults = faults.clone();
            Box::pin(async move {
                match conn.ping().await {
                    Ok(()) => Ok(true),
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            idle_ms = meta.idle_for.as_millis(),
                            "Unexpected error on idle connection"
                        );
                        publish(
                            &faults,
                            PoolFault {
                                detail: e.to_string(),
                                occurred_at: Utc::now(),
                            },
                        );
                        Ok(false)
                    }
                }
            })
        })
        .connect_lazy_with(config.connect_options())
}

/// Hand a fault to the supervisor without blocking the lease. Returns
/// whether it was queued.
fn publish(faults: &mpsc::Sender<PoolFault>, fault: PoolFault) -> bool {
    match faults.try_send(fault) {
        Ok(()) => true,
        // Nobody supervises the pool
        Err(TrySendError::Closed(_)) => false,
        Err(TrySendError::Full(dropped)) => {
            tracing::warn!(%dropped, "Pool fault channel full, fault dropped");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::driven_adapters::config::Password;

    fn config() -> GatewayConfig {
        GatewayConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            user: "airline".to_string(),
            password: Password::new("unused"),
            name: "airline".to_string(),
            max_connections: 4,
            idle_timeout_ms: 30_000,
            acquire_timeout_ms: 200,
        }
    }

    #[tokio::test]
    async fn should_create_pool_without_connecting() {
        let (tx, _rx) = mpsc::channel(FAULT_CAPACITY);

        let pool = create_pool(&config(), tx);

        assert_eq!(pool.size(), 0);
        assert_eq!(pool.options().get_max_connections(), 4);
        assert_eq!(pool.options().get_acquire_timeout().as_millis(), 200);
    }

    fn fault(detail: &str) -> PoolFault {
        PoolFault {
            detail: detail.to_string(),
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn should_drop_faults_beyond_capacity() {
        let (tx, mut rx) = mpsc::channel(FAULT_CAPACITY);

        let queued = (0..FAULT_CAPACITY + 5)
            .filter(|i| publish(&tx, fault(&format!("fault {i}"))))
            .count();

        assert_eq!(queued, FAULT_CAPACITY);
        assert_eq!(rx.try_recv().unwrap().detail, "fault 0");
    }

    #[test]
    fn should_not_queue_without_receiver() {
        let (tx, rx) = mpsc::channel(FAULT_CAPACITY);
        drop(rx);

        assert!(!publish(&tx, fault("connection reset")));
    }

    #[test]
    fn should_describe_fault_with_timestamp() {
        let fault = PoolFault {
            detail: "connection reset by peer".to_string(),
            occurred_at: DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        };

        assert_eq!(
            fault.to_string(),
            "unexpected error on idle connection at 2024-05-01T10:00:00+00:00: connection reset by peer"
        );
    }
}
