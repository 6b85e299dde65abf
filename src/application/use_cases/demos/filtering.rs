//! Filtering Use Case
//!
//! WHERE clause variations. Literal filter values are bound as positional
//! parameters.

use std::sync::Arc;

use chrono::NaiveDate;

use super::{step, DemoStep};
use crate::domain::gateways::QueryGateway;
use crate::domain::models::QueryRequest;
use crate::shared::errors::UseCaseError;

/// Use case for the filtering tour
pub struct FilteringQueries {
    gateway: Arc<dyn QueryGateway>,
}

fn date(y: i32, m: u32, d: u32) -> Result<NaiveDate, UseCaseError> {
    NaiveDate::from_ymd_opt(y, m, d)
        .ok_or_else(|| UseCaseError::InvalidInput(format!("invalid date {y}-{m}-{d}")))
}

impl FilteringQueries {
    /// Create a new FilteringQueries
    #[must_use]
    pub fn new(gateway: Arc<dyn QueryGateway>) -> Self {
        Self { gateway }
    }

    /// Statements of the tour, in order
    fn requests() -> Result<Vec<(&'static str, QueryRequest)>, UseCaseError> {
        Ok(vec![
            (
                "Filter by aircraft",
                QueryRequest::new("SELECT * FROM routes WHERE aircraft_id = $1 LIMIT 5")?
                    .bind("767-301ER"),
            ),
            (
                "Filter by travel date range",
                QueryRequest::new(
                    "SELECT * FROM passengers_on_flights WHERE travel_date BETWEEN $1 AND $2 LIMIT 5",
                )?
                .bind(date(2018, 1, 1)?)
                .bind(date(2020, 12, 31)?),
            ),
            (
                "Filter by customer attributes",
                QueryRequest::new(
                    r#"
                    SELECT *
                    FROM customer
                    WHERE gender = $1
                    AND date_of_birth BETWEEN $2 AND $3
                    LIMIT 5
                    "#,
                )?
                .bind("F")
                .bind(date(1990, 1, 1)?)
                .bind(date(2000, 12, 31)?),
            ),
            (
                "Filter by multiple conditions",
                QueryRequest::new(
                    "SELECT * FROM ticket_details WHERE class_id = $1 AND brand = $2 LIMIT 5",
                )?
                .bind("Economy")
                .bind("Boeing"),
            ),
            (
                "Filter by pattern",
                QueryRequest::new("SELECT * FROM routes WHERE origin_airport LIKE $1 LIMIT 5")?
                    .bind("LAX%"),
            ),
            (
                "Filter by NULL",
                QueryRequest::new(
                    "SELECT * FROM passengers_on_flights WHERE seat_num IS NULL LIMIT 5",
                )?,
            ),
            (
                "Filter by NOT NULL",
                QueryRequest::new(
                    "SELECT * FROM passengers_on_flights WHERE seat_num IS NOT NULL LIMIT 5",
                )?,
            ),
            (
                "Filter by IN",
                QueryRequest::new("SELECT * FROM routes WHERE aircraft_id IN ($1, $2) LIMIT 5")?
                    .bind("CRJ900")
                    .bind("A321"),
            ),
            (
                "Filter by NOT IN",
                QueryRequest::new(
                    "SELECT * FROM routes WHERE aircraft_id NOT IN ($1, $2) LIMIT 5",
                )?
                .bind("CRJ900")
                .bind("A321"),
            ),
            (
                "Filter by EXISTS",
                QueryRequest::new(
                    r#"
                    SELECT *
                    FROM routes r
                    WHERE EXISTS (
                        SELECT 1
                        FROM passengers_on_flights pf
                        WHERE pf.route_id = r.route_id
                    )
                    LIMIT 5
                    "#,
                )?,
            ),
            (
                "Filter by NOT EXISTS",
                QueryRequest::new(
                    r#"
                    SELECT *
                    FROM routes r
                    WHERE NOT EXISTS (
                        SELECT 1
                        FROM passengers_on_flights pf
                        WHERE pf.route_id = r.route_id
                    )
                    LIMIT 5
                    "#,
                )?,
            ),
            (
                "Filter by BETWEEN",
                QueryRequest::new(
                    "SELECT * FROM ticket_details WHERE price_per_ticket BETWEEN $1 AND $2 LIMIT 5",
                )?
                .bind(100_i32)
                .bind(500_i32),
            ),
            (
                "Filter by NOT BETWEEN",
                QueryRequest::new(
                    "SELECT * FROM ticket_details WHERE price_per_ticket NOT BETWEEN $1 AND $2 LIMIT 5",
                )?
                .bind(100_i32)
                .bind(500_i32),
            ),
            (
                "LIMIT with OFFSET",
                QueryRequest::new("SELECT * FROM routes ORDER BY route_id LIMIT $1 OFFSET $2")?
                    .bind(5_i64)
                    .bind(10_i64),
            ),
        ])
    }

    /// Execute the use case
    ///
    /// # Errors
    ///
    /// Returns `UseCaseError::Gateway` if any statement fails.
    pub async fn execute(&self) -> Result<Vec<DemoStep>, UseCaseError> {
        let requests = Self::requests()?;
        let mut steps = Vec::with_capacity(requests.len());
        for (title, request) in requests {
            steps.push(step(self.gateway.as_ref(), title, request).await?);
        }
        Ok(steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::gateways::MockQueryGateway;
    use crate::domain::models::Value;
    use crate::shared::errors::GatewayError;

    #[test]
    fn should_bind_every_literal_instead_of_interpolating() {
        for (title, request) in FilteringQueries::requests().unwrap() {
            let placeholders = (1..=request.params().len())
                .filter(|n| request.statement().contains(&format!("${n}")))
                .count();
            assert_eq!(placeholders, request.params().len(), "{title}");
            assert!(!request.statement().contains("'"), "{title} has an inline literal");
        }
    }

    #[tokio::test]
    async fn should_stop_at_first_failing_step() {
        let mut gateway = MockQueryGateway::new();
        let mut seq = mockall::Sequence::new();
        gateway
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![]));
        gateway
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|req| req.params().len() == 2 && matches!(req.params()[0], Value::Date(_)))
            .returning(|req| {
                Err(GatewayError::QueryFailed {
                    statement: req.statement().to_string(),
                    code: Some("42P01".to_string()),
                    detail: "relation \"passengers_on_flights\" does not exist".to_string(),
                })
            });

        let result = FilteringQueries::new(Arc::new(gateway)).execute().await;

        assert!(matches!(
            result,
            Err(UseCaseError::Gateway(GatewayError::QueryFailed { .. }))
        ));
    }
}
