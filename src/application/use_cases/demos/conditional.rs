//! Conditional Expressions Use Case
//!
//! CASE (plain and inside aggregates), COALESCE, NULLIF and CAST.

use std::sync::Arc;

use super::{step, DemoStep};
use crate::domain::gateways::QueryGateway;
use crate::domain::models::QueryRequest;
use crate::shared::errors::UseCaseError;

const ADULT_AGE: i32 = 18;
const SENIOR_AGE: i32 = 65;

const AGE_CATEGORIES: &str = r#"
    SELECT
        customer_id,
        first_name,
        last_name,
        EXTRACT(YEAR FROM AGE(date_of_birth))::int AS age,
        CASE
            WHEN EXTRACT(YEAR FROM AGE(date_of_birth)) < $1 THEN 'Minor'
            WHEN EXTRACT(YEAR FROM AGE(date_of_birth)) < $2 THEN 'Adult'
            ELSE 'Senior'
        END AS age_category
    FROM customer
    ORDER BY customer_id
    LIMIT 10"#;

const AGE_BUCKETS: &str = r#"
    SELECT
        COUNT(CASE WHEN EXTRACT(YEAR FROM AGE(date_of_birth)) < $1 THEN 1 END) AS minors,
        COUNT(CASE WHEN EXTRACT(YEAR FROM AGE(date_of_birth)) >= $1
                    AND EXTRACT(YEAR FROM AGE(date_of_birth)) < $2 THEN 1 END) AS adults,
        COUNT(CASE WHEN EXTRACT(YEAR FROM AGE(date_of_birth)) >= $2 THEN 1 END) AS seniors
    FROM customer"#;

const SEAT_OR_PLACEHOLDER: &str = r#"
    SELECT
        customer_id,
        flight_num,
        COALESCE(seat_num, $1) AS seat,
        travel_date
    FROM passengers_on_flights
    ORDER BY travel_date DESC
    LIMIT 10"#;

const PRICE_PER_SEAT: &str = r#"
    SELECT
        customer_id,
        aircraft_id,
        price_per_ticket,
        no_of_tickets,
        price_per_ticket / NULLIF(no_of_tickets, 0) AS price_per_seat
    FROM ticket_details
    LIMIT 10"#;

const PREMIUM_SHARE: &str = r#"
    SELECT
        ROUND(
            100.0 * COUNT(CASE WHEN class_id <> $1 THEN 1 END)::NUMERIC
            / NULLIF(COUNT(*), 0),
            2
        ) AS percent_premium
    FROM ticket_details"#;

/// Use case for the conditional expressions tour
pub struct ConditionalQueries {
    gateway: Arc<dyn QueryGateway>,
}

impl ConditionalQueries {
    /// Create a new ConditionalQueries
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
                "CASE: age category per customer",
                QueryRequest::new(AGE_CATEGORIES)?.bind(ADULT_AGE).bind(SENIOR_AGE),
            )
            .await?,
            step(
                gw,
                "CASE inside aggregates: customers per age bucket",
                QueryRequest::new(AGE_BUCKETS)?.bind(ADULT_AGE).bind(SENIOR_AGE),
            )
            .await?,
            step(
                gw,
                "COALESCE: unassigned seats",
                QueryRequest::new(SEAT_OR_PLACEHOLDER)?.bind("unassigned"),
            )
            .await?,
            step(
                gw,
                "NULLIF: price per seat without division by zero",
                QueryRequest::new(PRICE_PER_SEAT)?,
            )
            .await?,
            step(
                gw,
                "CAST: share of non-economy tickets",
                QueryRequest::new(PREMIUM_SHARE)?.bind("economy"),
            )
            .await?,
        ])
    }
}
