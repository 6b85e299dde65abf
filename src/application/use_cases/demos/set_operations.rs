//! Set Operations Use Case
//!
//! UNION, UNION ALL, INTERSECT, EXCEPT and a combined analysis.

use std::sync::Arc;

use super::{step, DemoStep};
use crate::domain::gateways::QueryGateway;
use crate::domain::models::QueryRequest;
use crate::shared::errors::UseCaseError;

const CUSTOMER_BOOKINGS_UNION: &str = r#"
    SELECT c.customer_id, c.first_name, c.last_name,
           pf.flight_num, r.origin_airport, r.destination_airport
    FROM customer c
    JOIN passengers_on_flights pf ON c.customer_id = pf.customer_id
    JOIN routes r ON pf.route_id = r.route_id
    WHERE r.origin_airport = $1
    UNION
    SELECT c.customer_id, c.first_name, c.last_name,
           pf.flight_num, r.origin_airport, r.destination_airport
    FROM customer c
    JOIN passengers_on_flights pf ON c.customer_id = pf.customer_id
    JOIN routes r ON pf.route_id = r.route_id
    WHERE r.destination_airport = $2
    ORDER BY customer_id
    LIMIT 10"#;

const HIGH_TRAFFIC_UNION_ALL: &str = r#"
    SELECT flight_num, origin_airport AS origin, destination_airport AS destination, 100 AS price
    FROM routes
    WHERE origin_airport IN ($1, $2, $3)
    UNION ALL
    SELECT flight_num, origin_airport, destination_airport, 200 AS price
    FROM routes
    WHERE destination_airport IN ($1, $2, $3)
    ORDER BY flight_num
    LIMIT 10"#;

const MULTI_CLASS_INTERSECT: &str = r#"
    SELECT DISTINCT c.customer_id, c.first_name, c.last_name
    FROM customer c
    JOIN passengers_on_flights pf ON c.customer_id = pf.customer_id
    WHERE pf.class_id = $1
    INTERSECT
    SELECT DISTINCT c.customer_id, c.first_name, c.last_name
    FROM customer c
    JOIN passengers_on_flights pf ON c.customer_id = pf.customer_id
    WHERE pf.class_id = $2
    ORDER BY customer_id
    LIMIT 10"#;

const ROUTES_WITHOUT_TICKETS_EXCEPT: &str = r#"
    SELECT DISTINCT r.route_id, r.flight_num, r.origin_airport, r.destination_airport
    FROM routes r
    EXCEPT
    SELECT DISTINCT r.route_id, r.flight_num, r.origin_airport, r.destination_airport
    FROM routes r
    JOIN passengers_on_flights pf ON r.route_id = pf.route_id
    JOIN ticket_details td ON pf.aircraft_id = td.aircraft_id
    ORDER BY flight_num
    LIMIT 10"#;

const ROUTE_ANALYSIS: &str = r#"
    SELECT r.flight_num, r.origin_airport AS origin, r.destination_airport AS destination,
           td.price_per_ticket AS price
    FROM routes r
    JOIN passengers_on_flights pf ON r.route_id = pf.route_id
    JOIN ticket_details td ON pf.aircraft_id = td.aircraft_id
    WHERE td.price_per_ticket > $4
    INTERSECT
    SELECT flight_num, origin_airport, destination_airport, 0 AS price
    FROM routes
    WHERE origin_airport IN ($1, $2, $3)
    AND destination_airport IN ($1, $2, $3)
    ORDER BY flight_num
    LIMIT 10"#;

/// Use case for the set operations tour
pub struct SetOperationQueries {
    gateway: Arc<dyn QueryGateway>,
}

const MAJOR_AIRPORTS: [&str; 3] = ["JFK", "LAX", "ORD"];

/// Bind the major airports as `$1..$3`
fn with_major_airports(request: QueryRequest) -> QueryRequest {
    MAJOR_AIRPORTS
        .into_iter()
        .fold(request, |request, airport| request.bind(airport))
}

impl SetOperationQueries {
    /// Create a new SetOperationQueries
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
            step(
                gw,
                "UNION: bookings from JFK or to LAX",
                QueryRequest::new(CUSTOMER_BOOKINGS_UNION)?.bind("JFK").bind("LAX"),
            )
            .await?,
            step(
                gw,
                "UNION ALL: high-traffic airports",
                with_major_airports(QueryRequest::new(HIGH_TRAFFIC_UNION_ALL)?),
            )
            .await?,
            step(
                gw,
                "INTERSECT: customers in economy and business",
                QueryRequest::new(MULTI_CLASS_INTERSECT)?.bind("economy").bind("business"),
            )
            .await?,
            step(
                gw,
                "EXCEPT: routes without ticket sales",
                QueryRequest::new(ROUTES_WITHOUT_TICKETS_EXCEPT)?,
            )
            .await?,
            step(
                gw,
                "Combined: premium routes between major airports",
                with_major_airports(QueryRequest::new(ROUTE_ANALYSIS)?).bind(500_i32),
            )
            .await?,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::gateway_answering_everything;
    use super::*;

    #[tokio::test]
    async fn should_run_five_set_operations() {
        let steps = SetOperationQueries::new(Arc::new(gateway_answering_everything(5)))
            .execute()
            .await
            .unwrap();

        assert_eq!(steps.len(), 5);
        assert!(steps.iter().all(|s| s.rows.len() == 1));
    }

    #[test]
    fn should_bind_airports_before_price() {
        let request = with_major_airports(QueryRequest::new(ROUTE_ANALYSIS).unwrap()).bind(500_i32);

        assert_eq!(request.params().len(), 4);
        assert_eq!(request.params()[0].as_str(), Some("JFK"));
        assert_eq!(request.params()[3].as_i64(), Some(500));
    }
}
