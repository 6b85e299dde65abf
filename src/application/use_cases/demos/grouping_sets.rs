//! Grouping Sets Use Case
//!
//! Multi-level aggregation with GROUPING SETS, CUBE and ROLLUP over
//! passenger bookings.

use std::sync::Arc;

use super::{step, DemoStep};
use crate::domain::gateways::QueryGateway;
use crate::domain::models::QueryRequest;
use crate::shared::errors::UseCaseError;

const GROUPING_SETS: &str = r#"
    SELECT customer_id, aircraft_id, route_id, COUNT(*) AS total_records
    FROM passengers_on_flights
    GROUP BY GROUPING SETS ((customer_id), (aircraft_id), (route_id), ())"#;

const CUBE: &str = r#"
    SELECT customer_id, aircraft_id, route_id, COUNT(*) AS total_records
    FROM passengers_on_flights
    GROUP BY CUBE (customer_id, aircraft_id, route_id)"#;

const ROLLUP: &str = r#"
    SELECT customer_id, aircraft_id, route_id, COUNT(*) AS total_records
    FROM passengers_on_flights
    GROUP BY ROLLUP (customer_id, aircraft_id, route_id)"#;

/// Use case for GROUPING SETS / CUBE / ROLLUP
pub struct GroupingSetQueries {
    gateway: Arc<dyn QueryGateway>,
}

impl GroupingSetQueries {
    /// Create a new GroupingSetQueries
    #[must_use]
    pub fn new(gateway: Arc<dyn QueryGateway>) -> Self {
        Self { gateway }
    }

    /// Execute the use case
    ///
    /// # Errors
    ///
    /// Returns `UseCaseError::Gateway` if any statement fails.
    pub async fn execute(&self) -> Result<Vec<DemoStep>, UseCaseError> {
        let gw = self.gateway.as_ref();
        Ok(vec![
            step(gw, "Tickets sold by GROUPING SETS", QueryRequest::new(GROUPING_SETS)?).await?,
            step(gw, "Tickets sold by CUBE", QueryRequest::new(CUBE)?).await?,
            step(gw, "Tickets sold by ROLLUP", QueryRequest::new(ROLLUP)?).await?,
        ])
    }
}
