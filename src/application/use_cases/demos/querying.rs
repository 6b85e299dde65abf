//! Basic Querying Use Case
//!
//! SELECT with WHERE, ORDER BY, GROUP BY, HAVING, aggregates and
//! subqueries, followed by an INSERT / UPDATE / DELETE round on a sample
//! customer.

use std::sync::Arc;

use chrono::NaiveDate;

use super::{step, DemoStep};
use crate::domain::gateways::QueryGateway;
use crate::domain::models::QueryRequest;
use crate::shared::errors::UseCaseError;

/// Use case for the basic querying tour
pub struct BasicQueries {
    gateway: Arc<dyn QueryGateway>,
}

impl BasicQueries {
    /// Create a new BasicQueries
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
        let born_before = NaiveDate::from_ymd_opt(1990, 1, 1)
            .ok_or_else(|| UseCaseError::InvalidInput("invalid cutoff date".into()))?;

        let mut steps = Vec::with_capacity(10);

        steps.push(
            step(
                gw,
                "Basic SELECT",
                QueryRequest::new("SELECT * FROM customer LIMIT 5")?,
            )
            .await?,
        );

        steps.push(
            step(
                gw,
                "SELECT with WHERE",
                QueryRequest::new(
                    r#"
                    SELECT *
                    FROM customer
                    WHERE date_of_birth < $1
                    LIMIT 5
                    "#,
                )?
                .bind(born_before),
            )
            .await?,
        );

        steps.push(
            step(
                gw,
                "SELECT with ORDER BY",
                QueryRequest::new(
                    r#"
                    SELECT *
                    FROM customer
                    ORDER BY date_of_birth ASC
                    LIMIT 5
                    "#,
                )?,
            )
            .await?,
        );

        steps.push(
            step(
                gw,
                "SELECT with GROUP BY",
                QueryRequest::new(
                    r#"
                    SELECT brand, COUNT(*) AS tickets
                    FROM ticket_details
                    WHERE class_id = $1
                    GROUP BY brand
                    LIMIT 5
                    "#,
                )?
                .bind("Economy"),
            )
            .await?,
        );

        steps.push(
            step(
                gw,
                "SELECT with HAVING",
                QueryRequest::new(
                    r#"
                    SELECT flight_num, COUNT(*) AS total_passengers
                    FROM passengers_on_flights
                    GROUP BY flight_num
                    HAVING COUNT(*) > $1
                    LIMIT 5
                    "#,
                )?
                .bind(1_i64),
            )
            .await?,
        );

        steps.push(
            step(
                gw,
                "SELECT with aggregate functions",
                QueryRequest::new(
                    r#"
                    SELECT MIN(date_of_birth) AS oldest_birth_date,
                           MAX(date_of_birth) AS youngest_birth_date,
                           COUNT(*) AS customers
                    FROM customer
                    "#,
                )?,
            )
            .await?,
        );

        steps.push(
            step(
                gw,
                "SELECT with subquery",
                QueryRequest::new(
                    r#"
                    SELECT *
                    FROM customer
                    WHERE customer_id IN (
                        SELECT customer_id
                        FROM ticket_details
                        WHERE class_id = $1
                    )
                    LIMIT 5
                    "#,
                )?
                .bind("Economy"),
            )
            .await?,
        );

        steps.push(
            step(
                gw,
                "INSERT",
                QueryRequest::new(
                    r#"
                    INSERT INTO customer (first_name, last_name, gender, date_of_birth)
                    VALUES ($1, $2, $3, $4)
                    RETURNING *
                    "#,
                )?
                .bind("John")
                .bind("Doe")
                .bind("M")
                .bind(born_before),
            )
            .await?,
        );

        steps.push(
            step(
                gw,
                "UPDATE",
                QueryRequest::new(
                    r#"
                    UPDATE customer
                    SET first_name = $2
                    WHERE first_name = $1 AND last_name = $3
                    RETURNING *
                    "#,
                )?
                .bind("John")
                .bind("Jane")
                .bind("Doe"),
            )
            .await?,
        );

        steps.push(
            step(
                gw,
                "DELETE",
                QueryRequest::new(
                    r#"
                    DELETE FROM customer
                    WHERE first_name = $1 AND last_name = $2
                    RETURNING *
                    "#,
                )?
                .bind("Jane")
                .bind("Doe"),
            )
            .await?,
        );

        Ok(steps)
    }
}
