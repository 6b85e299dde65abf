//! Grouping Use Case
//!
//! GROUP BY with aggregates, HAVING filters and date truncation.

use std::sync::Arc;

use super::{fetch, step, DemoStep};
use crate::domain::gateways::QueryGateway;
use crate::domain::models::airline::RouteStats;
use crate::domain::models::QueryRequest;
use crate::shared::errors::UseCaseError;

const ROUTE_STATISTICS: &str = r#"
    SELECT
        origin_airport,
        COUNT(*) AS total_flights,
        ROUND(AVG(distance_miles)::numeric, 2) AS avg_distance,
        MIN(distance_miles) AS min_distance,
        MAX(distance_miles) AS max_distance
    FROM routes
    GROUP BY origin_airport
    ORDER BY total_flights DESC
    LIMIT 10"#;

const HIGH_VALUE_CUSTOMERS: &str = r#"
    SELECT
        c.customer_id,
        c.first_name,
        c.last_name,
        COUNT(pf.flight_num) AS total_bookings,
        SUM(td.price_per_ticket) AS total_spent,
        ROUND(AVG(td.price_per_ticket)::numeric, 2) AS avg_ticket_price
    FROM customer c
    JOIN passengers_on_flights pf ON c.customer_id = pf.customer_id
    JOIN ticket_details td ON pf.customer_id = td.customer_id
    GROUP BY c.customer_id, c.first_name, c.last_name
    HAVING COUNT(pf.flight_num) >= $1
    ORDER BY total_spent DESC
    LIMIT 10"#;

const AIRCRAFT_LOAD: &str = r#"
    SELECT
        pf.aircraft_id,
        pf.flight_num,
        COUNT(pf.customer_id) AS total_passengers,
        ROUND((COUNT(pf.customer_id)::float /
            MAX(CASE
                WHEN td.class_id = 'economy' THEN 200
                WHEN td.class_id = 'business' THEN 30
                ELSE 10 END))::numeric * 100, 2) AS occupancy_rate
    FROM passengers_on_flights pf
    JOIN ticket_details td ON pf.aircraft_id = td.aircraft_id
    GROUP BY pf.aircraft_id, pf.flight_num
    HAVING COUNT(pf.customer_id) > $1
    ORDER BY occupancy_rate DESC
    LIMIT 10"#;

const BRAND_PERFORMANCE: &str = r#"
    SELECT
        td.brand,
        SUM(td.price_per_ticket) AS total_revenue,
        COUNT(*) AS tickets_sold,
        ROUND(AVG(td.price_per_ticket)::numeric, 2) AS avg_ticket_price
    FROM ticket_details td
    JOIN passengers_on_flights pf ON td.aircraft_id = pf.aircraft_id
    GROUP BY td.brand
    HAVING SUM(td.price_per_ticket) > $1
    ORDER BY total_revenue DESC"#;

const MONTHLY_TRENDS: &str = r#"
    SELECT
        DATE_TRUNC('month', travel_date::timestamp) AS booking_month,
        COUNT(*) AS total_bookings,
        ROUND(AVG(td.price_per_ticket)::numeric, 2) AS avg_ticket_price,
        SUM(td.price_per_ticket) AS total_revenue
    FROM passengers_on_flights pf
    JOIN ticket_details td ON pf.customer_id = td.customer_id
    GROUP BY DATE_TRUNC('month', travel_date::timestamp)
    ORDER BY booking_month DESC
    LIMIT 12"#;

const CLASS_STATISTICS: &str = r#"
    SELECT
        pf.class_id,
        COUNT(DISTINCT pf.customer_id) AS total_passengers,
        ROUND(AVG(td.price_per_ticket)::numeric, 2) AS avg_ticket_price,
        SUM(td.price_per_ticket) AS total_revenue
    FROM passengers_on_flights pf
    JOIN ticket_details td ON pf.class_id = td.class_id
    GROUP BY pf.class_id
    ORDER BY total_revenue DESC"#;

/// Use case for the grouping tour
pub struct GroupingQueries {
    gateway: Arc<dyn QueryGateway>,
}

impl GroupingQueries {
    /// Create a new GroupingQueries
    #[must_use]
    pub fn new(gateway: Arc<dyn QueryGateway>) -> Self {
        Self { gateway }
    }

    /// Flight count and distance statistics per origin airport
    ///
    /// # Errors
    ///
    /// Returns `UseCaseError::Gateway` on query or mapping failure.
    pub async fn route_statistics(&self) -> Result<Vec<RouteStats>, UseCaseError> {
        fetch(self.gateway.as_ref(), QueryRequest::new(ROUTE_STATISTICS)?).await
    }

    /// Execute the use case
    ///
    /// # Errors
    ///
    /// Returns `UseCaseError::Gateway` if any statement fails.
    pub async fn execute(&self) -> Result<Vec<DemoStep>, UseCaseError> {
        let gw = self.gateway.as_ref();
        Ok(vec![
            step(gw, "Route statistics", QueryRequest::new(ROUTE_STATISTICS)?).await?,
            step(
                gw,
                "High-value customers (HAVING)",
                QueryRequest::new(HIGH_VALUE_CUSTOMERS)?.bind(3_i64),
            )
            .await?,
            step(
                gw,
                "Aircraft load analysis",
                QueryRequest::new(AIRCRAFT_LOAD)?.bind(10_i64),
            )
            .await?,
            step(
                gw,
                "Brand performance",
                QueryRequest::new(BRAND_PERFORMANCE)?.bind(5000_i32),
            )
            .await?,
            step(gw, "Monthly booking trends", QueryRequest::new(MONTHLY_TRENDS)?).await?,
            step(gw, "Flight class statistics", QueryRequest::new(CLASS_STATISTICS)?).await?,
        ])
    }
}
