//! Route Listing Use Case
//!
//! Lists the first routes of the schema; the default demo.

use std::sync::Arc;

use super::{fetch, step, DemoStep};
use crate::domain::gateways::QueryGateway;
use crate::domain::models::airline::Route;
use crate::domain::models::QueryRequest;
use crate::shared::errors::UseCaseError;

const ROUTES: &str = "SELECT * FROM routes ORDER BY route_id LIMIT $1";

/// Use case for listing routes
pub struct RouteListing {
    gateway: Arc<dyn QueryGateway>,
}

impl RouteListing {
    /// Create a new RouteListing
    #[must_use]
    pub fn new(gateway: Arc<dyn QueryGateway>) -> Self {
        Self { gateway }
    }

    /// First `limit` routes as typed records
    ///
    /// # Errors
    ///
    /// Returns `UseCaseError::Gateway` on query or mapping failure.
    pub async fn routes(&self, limit: i64) -> Result<Vec<Route>, UseCaseError> {
        fetch(self.gateway.as_ref(), QueryRequest::new(ROUTES)?.bind(limit)).await
    }

    /// Execute the use case
    ///
    /// # Errors
    ///
    /// Returns `UseCaseError::Gateway` if the query fails.
    pub async fn execute(&self) -> Result<Vec<DemoStep>, UseCaseError> {
        let listing = step(
            self.gateway.as_ref(),
            "Routes (first 10)",
            QueryRequest::new(ROUTES)?.bind(10_i64),
        )
        .await?;
        Ok(vec![listing])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::gateways::MockQueryGateway;
    use crate::domain::models::row::test_support::row;
    use crate::domain::models::Value;
    use crate::shared::errors::GatewayError;

    #[tokio::test]
    async fn should_bind_limit_as_parameter() {
        let mut gateway = MockQueryGateway::new();
        gateway
            .expect_execute()
            .withf(|req| req.statement() == ROUTES && req.params() == [Value::Int64(10)])
            .times(1)
            .returning(|_| Ok(vec![]));

        let steps = RouteListing::new(Arc::new(gateway)).execute().await.unwrap();

        assert_eq!(steps.len(), 1);
        assert!(steps[0].rows.is_empty());
    }

    #[tokio::test]
    async fn should_decode_routes() {
        let mut gateway = MockQueryGateway::new();
        gateway.expect_execute().returning(|_| {
            Ok(vec![row(vec![
                ("route_id", Value::Int32(1)),
                ("flight_num", Value::from("FL100")),
                ("origin_airport", Value::from("JFK")),
                ("destination_airport", Value::from("LAX")),
                ("aircraft_id", Value::from("A321")),
                ("distance_miles", Value::Int32(2475)),
            ])])
        });

        let routes = RouteListing::new(Arc::new(gateway)).routes(1).await.unwrap();

        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].origin_airport, "JFK");
        assert_eq!(routes[0].distance_miles, 2475);
    }

    #[tokio::test]
    async fn should_propagate_gateway_failures() {
        let mut gateway = MockQueryGateway::new();
        gateway
            .expect_execute()
            .returning(|_| Err(GatewayError::ConnectionUnavailable("pool timed out".into())));

        let result = RouteListing::new(Arc::new(gateway)).execute().await;

        assert!(matches!(
            result,
            Err(UseCaseError::Gateway(GatewayError::ConnectionUnavailable(_)))
        ));
    }
}
