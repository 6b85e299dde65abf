//! Constraints Use Case
//!
//! Adds a primary key, a foreign key, a check constraint and a unique
//! constraint to the airline schema. A constraint that already exists is
//! reported as such instead of failing the demo, so the tour can be re-run
//! against a schema created with its constraints in place.

use std::sync::Arc;

use super::{step, DemoStep};
use crate::domain::gateways::QueryGateway;
use crate::domain::models::{QueryRequest, Row, Value};
use crate::shared::errors::UseCaseError;

/// SQLSTATEs meaning "this constraint (or its index) is already there"
const ALREADY_PRESENT: [&str; 3] = ["42P16", "42710", "42P07"];
const CHECK_VIOLATION: &str = "23514";

const PRIMARY_KEY: &str = r#"
    ALTER TABLE customer
    ADD CONSTRAINT pk_customer_id PRIMARY KEY (customer_id)"#;

const FOREIGN_KEY: &str = r#"
    ALTER TABLE passengers_on_flights
    ADD CONSTRAINT fk_route_id FOREIGN KEY (route_id) REFERENCES routes (route_id)"#;

const CHECK_PAST_TRAVEL: &str = r#"
    ALTER TABLE passengers_on_flights
    ADD CONSTRAINT chk_travel_date_past CHECK (travel_date <= CURRENT_DATE)"#;

const UNIQUE_NAMES: &str = r#"
    ALTER TABLE customer
    ADD CONSTRAINT uk_first_name_last_name UNIQUE (first_name, last_name)"#;

const LIST_CONSTRAINTS: &str = r#"
    SELECT
        conrelid::regclass::text AS table_name,
        conname AS constraint_name,
        CASE contype
            WHEN 'p' THEN 'PRIMARY KEY'
            WHEN 'f' THEN 'FOREIGN KEY'
            WHEN 'c' THEN 'CHECK'
            WHEN 'u' THEN 'UNIQUE'
        END AS constraint_type
    FROM pg_constraint
    WHERE conname = ANY(string_to_array($1, ','))
    ORDER BY table_name, constraint_name"#;

/// Outcome of adding one constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOutcome {
    Added,
    AlreadyPresent,
    /// Existing rows violate the constraint
    Rejected,
}

impl ConstraintOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::AlreadyPresent => "already present",
            Self::Rejected => "rejected by existing rows",
        }
    }
}

/// Use case for the constraints tour
pub struct ConstraintQueries {
    gateway: Arc<dyn QueryGateway>,
}

impl ConstraintQueries {
    /// Create a new ConstraintQueries
    #[must_use]
    pub fn new(gateway: Arc<dyn QueryGateway>) -> Self {
        Self { gateway }
    }

    /// Add a constraint, tolerating one that already exists
    ///
    /// # Errors
    ///
    /// Returns `UseCaseError::Gateway` for any failure other than an
    /// existing constraint or a check violated by existing rows.
    pub async fn add(&self, statement: &str) -> Result<ConstraintOutcome, UseCaseError> {
        match self.gateway.execute(&QueryRequest::new(statement)?).await {
            Ok(_) => Ok(ConstraintOutcome::Added),
            Err(err) => match err.sql_state().map(str::to_owned).as_deref() {
                Some(code) if ALREADY_PRESENT.contains(&code) => {
                    tracing::info!(sqlstate = code, "Constraint already present");
                    Ok(ConstraintOutcome::AlreadyPresent)
                }
                Some(CHECK_VIOLATION) => {
                    tracing::warn!(error = %err, "Existing rows violate the check constraint");
                    Ok(ConstraintOutcome::Rejected)
                }
                _ => Err(err.into()),
            },
        }
    }

    /// Execute the use case
    ///
    /// # Errors
    ///
    /// Returns `UseCaseError::Gateway` if a statement fails unexpectedly.
    pub async fn execute(&self) -> Result<Vec<DemoStep>, UseCaseError> {
        let constraints = [
            ("Primary key: unique customer id", "pk_customer_id", PRIMARY_KEY),
            ("Foreign key: passengers reference a valid route", "fk_route_id", FOREIGN_KEY),
            ("Check: travel dates are in the past", "chk_travel_date_past", CHECK_PAST_TRAVEL),
            ("Unique: first and last name pair", "uk_first_name_last_name", UNIQUE_NAMES),
        ];

        let columns: Arc<[String]> = Arc::from(["constraint".to_string(), "outcome".to_string()]);
        let mut steps = Vec::with_capacity(constraints.len() + 1);
        for (title, name, statement) in constraints {
            let outcome = self.add(statement).await?;
            let row = Row::new(
                Arc::clone(&columns),
                vec![Value::from(name), Value::from(outcome.as_str())],
            );
            steps.push(DemoStep::new(title, vec![row]));
        }

        let names = constraints.map(|(_, name, _)| name).join(",");
        steps.push(
            step(
                self.gateway.as_ref(),
                "Constraints now defined",
                QueryRequest::new(LIST_CONSTRAINTS)?.bind(names),
            )
            .await?,
        );
        Ok(steps)
    }
}
