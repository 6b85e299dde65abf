//! Joins Use Case
//!
//! INNER, LEFT, multi-table, self, FULL OUTER, CROSS and NATURAL joins.

use std::sync::Arc;

use super::{fetch, step, DemoStep};
use crate::domain::gateways::QueryGateway;
use crate::domain::models::airline::{CustomerFlight, PassengerDetail, RouteTicket, SameDistanceRoute};
use crate::domain::models::QueryRequest;
use crate::shared::errors::UseCaseError;

const DEFAULT_LIMIT: i64 = 5;
const DEFAULT_MIN_PRICE: i32 = 100;

const PASSENGER_DETAILS: &str = r#"
    SELECT
        pf.flight_num,
        c.first_name,
        c.last_name,
        pf.seat_num,
        pf.travel_date
    FROM passengers_on_flights pf
    INNER JOIN customer c ON pf.customer_id = c.customer_id
    LIMIT $1"#;

const CUSTOMERS_WITH_FLIGHTS: &str = r#"
    SELECT
        c.customer_id,
        c.first_name,
        c.last_name,
        pf.flight_num,
        pf.travel_date
    FROM customer c
    LEFT JOIN passengers_on_flights pf ON c.customer_id = pf.customer_id
    LIMIT $1"#;

const COMPREHENSIVE_FLIGHTS: &str = r#"
    SELECT
        c.first_name,
        c.last_name,
        pf.flight_num,
        r.origin_airport,
        r.destination_airport,
        td.price_per_ticket,
        td.brand
    FROM passengers_on_flights pf
    INNER JOIN customer c ON pf.customer_id = c.customer_id
    INNER JOIN routes r ON pf.route_id = r.route_id
    INNER JOIN ticket_details td ON pf.aircraft_id = td.aircraft_id
    LIMIT $1"#;

const SAME_DISTANCE_ROUTES: &str = r#"
    SELECT
        r1.flight_num AS flight1,
        r2.flight_num AS flight2,
        r1.distance_miles
    FROM routes r1
    INNER JOIN routes r2 ON
        r1.distance_miles = r2.distance_miles AND
        r1.flight_num < r2.flight_num
    LIMIT $1"#;

const ROUTES_AND_TICKETS: &str = r#"
    SELECT
        r.flight_num,
        r.origin_airport,
        r.destination_airport,
        td.brand,
        td.price_per_ticket
    FROM routes r
    FULL OUTER JOIN ticket_details td ON r.aircraft_id = td.aircraft_id
    LIMIT $1"#;

const ROUTE_BRAND_COMBINATIONS: &str = r#"
    SELECT DISTINCT
        r.flight_num,
        td.brand,
        r.origin_airport,
        r.destination_airport
    FROM routes r
    CROSS JOIN ticket_details td
    LIMIT $1"#;

const COMMON_TICKETS: &str = r#"
    SELECT
        customer_id,
        aircraft_id,
        class_id
    FROM passengers_on_flights
    NATURAL JOIN ticket_details
    LIMIT $1"#;

const PRICED_FLIGHTS: &str = r#"
    SELECT
        c.first_name,
        c.last_name,
        pf.flight_num,
        td.brand,
        td.price_per_ticket,
        r.origin_airport,
        r.destination_airport
    FROM passengers_on_flights pf
    INNER JOIN customer c ON pf.customer_id = c.customer_id
    INNER JOIN ticket_details td
        ON pf.aircraft_id = td.aircraft_id
        AND pf.class_id = td.class_id
    INNER JOIN routes r
        ON pf.route_id = r.route_id
        AND pf.flight_num = r.flight_num
    WHERE td.price_per_ticket > $1
    LIMIT $2"#;

/// Use case for the join tour
pub struct JoinQueries {
    gateway: Arc<dyn QueryGateway>,
}

impl JoinQueries {
    /// Create a new JoinQueries
    #[must_use]
    pub fn new(gateway: Arc<dyn QueryGateway>) -> Self {
        Self { gateway }
    }

    /// INNER JOIN of passengers and customers
    ///
    /// # Errors
    ///
    /// Returns `UseCaseError::Gateway` on query or mapping failure.
    pub async fn passenger_details(&self, limit: i64) -> Result<Vec<PassengerDetail>, UseCaseError> {
        fetch(self.gateway.as_ref(), QueryRequest::new(PASSENGER_DETAILS)?.bind(limit)).await
    }

    /// LEFT JOIN keeping customers without flights
    ///
    /// # Errors
    ///
    /// Returns `UseCaseError::Gateway` on query or mapping failure.
    pub async fn customers_with_flights(&self, limit: i64) -> Result<Vec<CustomerFlight>, UseCaseError> {
        fetch(self.gateway.as_ref(), QueryRequest::new(CUSTOMERS_WITH_FLIGHTS)?.bind(limit)).await
    }

    /// SELF JOIN pairing routes of equal distance
    ///
    /// # Errors
    ///
    /// Returns `UseCaseError::Gateway` on query or mapping failure.
    pub async fn same_distance_routes(&self, limit: i64) -> Result<Vec<SameDistanceRoute>, UseCaseError> {
        fetch(self.gateway.as_ref(), QueryRequest::new(SAME_DISTANCE_ROUTES)?.bind(limit)).await
    }

    /// FULL OUTER JOIN of routes and ticket sales
    ///
    /// # Errors
    ///
    /// Returns `UseCaseError::Gateway` on query or mapping failure.
    pub async fn routes_and_tickets(&self, limit: i64) -> Result<Vec<RouteTicket>, UseCaseError> {
        fetch(self.gateway.as_ref(), QueryRequest::new(ROUTES_AND_TICKETS)?.bind(limit)).await
    }

    /// Execute the use case
    ///
    /// # Errors
    ///
    /// Returns `UseCaseError::Gateway` if any statement fails.
    pub async fn execute(&self) -> Result<Vec<DemoStep>, UseCaseError> {
        let gw = self.gateway.as_ref();
        let limited = [
            ("INNER JOIN: passenger details", PASSENGER_DETAILS),
            ("LEFT JOIN: customers with flights", CUSTOMERS_WITH_FLIGHTS),
            ("Multi-table JOIN: comprehensive flight info", COMPREHENSIVE_FLIGHTS),
            ("SELF JOIN: routes with the same distance", SAME_DISTANCE_ROUTES),
            ("FULL OUTER JOIN: routes and tickets", ROUTES_AND_TICKETS),
            ("CROSS JOIN: route and brand combinations", ROUTE_BRAND_COMBINATIONS),
            ("NATURAL JOIN: common tickets", COMMON_TICKETS),
        ];

        let mut steps = Vec::with_capacity(limited.len() + 1);
        for (title, statement) in limited {
            steps.push(step(gw, title, QueryRequest::new(statement)?.bind(DEFAULT_LIMIT)).await?);
        }
        steps.push(
            step(
                gw,
                "Complex JOIN: flights above a ticket price",
                QueryRequest::new(PRICED_FLIGHTS)?
                    .bind(DEFAULT_MIN_PRICE)
                    .bind(DEFAULT_LIMIT),
            )
            .await?,
        );
        Ok(steps)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::gateway_answering_everything;
    use super::*;
    use crate::domain::gateways::MockQueryGateway;
    use crate::domain::models::row::test_support::row;
    use crate::domain::models::Value;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn should_run_eight_join_steps() {
        let steps = JoinQueries::new(Arc::new(gateway_answering_everything(8)))
            .execute()
            .await
            .unwrap();

        assert_eq!(steps.len(), 8);
        assert!(steps[4].title.starts_with("FULL OUTER JOIN"));
    }

    #[tokio::test]
    async fn should_pass_price_threshold_before_limit() {
        let mut gateway = MockQueryGateway::new();
        gateway
            .expect_execute()
            .withf(|req| req.statement() != PRICED_FLIGHTS)
            .times(7)
            .returning(|_| Ok(vec![]));
        gateway
            .expect_execute()
            .withf(|req| {
                req.statement() == PRICED_FLIGHTS
                    && req.params() == [Value::Int32(DEFAULT_MIN_PRICE), Value::Int64(DEFAULT_LIMIT)]
            })
            .times(1)
            .returning(|_| Ok(vec![]));

        JoinQueries::new(Arc::new(gateway)).execute().await.unwrap();
    }

    #[tokio::test]
    async fn should_decode_passenger_details() {
        let mut gateway = MockQueryGateway::new();
        gateway.expect_execute().returning(|_| {
            Ok(vec![row(vec![
                ("flight_num", Value::from("FL100")),
                ("first_name", Value::from("Ada")),
                ("last_name", Value::from("King")),
                ("seat_num", Value::Null),
                ("travel_date", Value::Date(NaiveDate::from_ymd_opt(2020, 3, 1).unwrap())),
            ])])
        });

        let details = JoinQueries::new(Arc::new(gateway))
            .passenger_details(1)
            .await
            .unwrap();

        assert_eq!(details[0].flight_num, "FL100");
        assert_eq!(details[0].seat_num, None);
    }

    #[tokio::test]
    async fn should_keep_unmatched_sides_of_full_outer_join() {
        let mut gateway = MockQueryGateway::new();
        gateway.expect_execute().returning(|_| {
            Ok(vec![row(vec![
                ("flight_num", Value::Null),
                ("origin_airport", Value::Null),
                ("destination_airport", Value::Null),
                ("brand", Value::from("ExampleAir")),
                ("price_per_ticket", Value::Int32(300)),
            ])])
        });

        let tickets = JoinQueries::new(Arc::new(gateway))
            .routes_and_tickets(1)
            .await
            .unwrap();

        assert_eq!(tickets[0].flight_num, None);
        assert_eq!(tickets[0].price_per_ticket, Some(rust_decimal::Decimal::from(300)));
    }
}
