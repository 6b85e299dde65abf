//! Common test utilities for e2e tests
//!
//! Spins up a PostgreSQL container, loads the airline fixture and builds
//! gateway configurations pointing at it.

use sqlx::PgPool;
use testcontainers::{runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;

use airline_query_gateway::infrastructure::driven_adapters::config::{
    GatewayConfig, Password, DEFAULT_ACQUIRE_TIMEOUT_MS, DEFAULT_IDLE_TIMEOUT_MS,
    DEFAULT_MAX_CONNECTIONS,
};
use airline_query_gateway::infrastructure::driven_adapters::{PgQueryGateway, PoolFaults};

const AIRLINE_FIXTURE: &str = include_str!("../fixtures/airline.sql");

/// Test database context
pub struct TestDb {
    pub config: GatewayConfig,
    _container: ContainerAsync<Postgres>,
}

impl TestDb {
    /// Start a fresh PostgreSQL database seeded with the airline schema
    pub async fn new() -> Self {
        // Start PostgreSQL container
        let container = Postgres::default()
            .with_tag("16-alpine")
            .start()
            .await
            .expect("Failed to start PostgreSQL container");

        let host = container.get_host().await.expect("Failed to get host");
        let port = container
            .get_host_port_ipv4(5432)
            .await
            .expect("Failed to get port");

        let config = GatewayConfig {
            host: host.to_string(),
            port,
            user: "postgres".to_string(),
            password: Password::new("postgres"),
            name: "postgres".to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
            acquire_timeout_ms: DEFAULT_ACQUIRE_TIMEOUT_MS,
        };

        // Load the schema through a separate pool so gateway tests start
        // with an untouched pool
        let pool = PgPool::connect_with(config.connect_options())
            .await
            .expect("Failed to connect to test database");
        sqlx::raw_sql(AIRLINE_FIXTURE)
            .execute(&pool)
            .await
            .expect("Failed to load airline fixture");
        pool.close().await;

        Self {
            config,
            _container: container,
        }
    }

    /// Configuration with a different pool size and acquire timeout
    #[allow(dead_code)]
    pub fn config_with(&self, max_connections: u32, acquire_timeout_ms: u64) -> GatewayConfig {
        GatewayConfig {
            max_connections,
            acquire_timeout_ms,
            ..self.config.clone()
        }
    }

    /// Gateway with the default pool settings
    pub async fn gateway(&self) -> PgQueryGateway {
        self.gateway_with(&self.config).await
    }

    /// Gateway for an explicit configuration
    pub async fn gateway_with(&self, config: &GatewayConfig) -> PgQueryGateway {
        self.supervised_gateway(config).await.0
    }

    /// Gateway together with its pool fault receiver
    pub async fn supervised_gateway(&self, config: &GatewayConfig) -> (PgQueryGateway, PoolFaults) {
        PgQueryGateway::connect(config)
            .await
            .expect("Failed to connect gateway")
    }

    /// A pool outside the gateway, for acting on the server behind its back
    #[allow(dead_code)]
    pub async fn admin_pool(&self) -> PgPool {
        PgPool::connect_with(self.config.connect_options())
            .await
            .expect("Failed to connect admin pool")
    }
}
