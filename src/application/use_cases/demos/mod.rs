//! Demo Use Cases
//!
//! Each demo is a single-purpose use case that runs a themed series of
//! statements against the airline schema through the `QueryGateway`, and
//! returns every step's rows for the driving adapter to display.

mod conditional;
mod constraints;
mod data_modification;
mod filtering;
mod grouping;
mod grouping_sets;
mod joins;
mod querying;
mod routes;
mod set_operations;
mod transactions;

use std::sync::Arc;

use crate::domain::gateways::QueryGateway;
use crate::domain::models::{decode_rows, FromRow, QueryRequest, Row};
use crate::shared::errors::UseCaseError;

pub use conditional::ConditionalQueries;
pub use constraints::ConstraintQueries;
pub use data_modification::DataModificationQueries;
pub use filtering::FilteringQueries;
pub use grouping::GroupingQueries;
pub use grouping_sets::GroupingSetQueries;
pub use joins::JoinQueries;
pub use querying::BasicQueries;
pub use routes::RouteListing;
pub use set_operations::SetOperationQueries;
pub use transactions::TransactionQueries;

/// Result of one demonstrated statement
#[derive(Debug, Clone, PartialEq)]
pub struct DemoStep {
    pub title: &'static str,
    pub rows: Vec<Row>,
}

impl DemoStep {
    #[must_use]
    pub fn new(title: &'static str, rows: Vec<Row>) -> Self {
        Self { title, rows }
    }
}

/// Every demo the runner knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Demo {
    Routes,
    Querying,
    Filtering,
    Joins,
    Grouping,
    GroupingSets,
    SetOperations,
    Conditional,
    Constraints,
    DataModification,
    Transactions,
}

impl Demo {
    pub const ALL: [Demo; 11] = [
        Demo::Routes,
        Demo::Querying,
        Demo::Filtering,
        Demo::Joins,
        Demo::Grouping,
        Demo::GroupingSets,
        Demo::SetOperations,
        Demo::Conditional,
        Demo::Constraints,
        Demo::DataModification,
        Demo::Transactions,
    ];

    /// Name used on the command line
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Routes => "routes",
            Self::Querying => "querying",
            Self::Filtering => "filtering",
            Self::Joins => "joins",
            Self::Grouping => "grouping",
            Self::GroupingSets => "grouping-sets",
            Self::SetOperations => "set-operations",
            Self::Conditional => "conditional",
            Self::Constraints => "constraints",
            Self::DataModification => "data-modification",
            Self::Transactions => "transactions",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Routes => "first ten routes",
            Self::Querying => "SELECT with WHERE, ORDER BY, GROUP BY, HAVING, subqueries; INSERT/UPDATE/DELETE",
            Self::Filtering => "equality, ranges, LIKE, NULL checks, IN, EXISTS, BETWEEN, LIMIT/OFFSET",
            Self::Joins => "INNER, LEFT, self, FULL OUTER, CROSS and NATURAL joins",
            Self::Grouping => "GROUP BY with aggregates and HAVING",
            Self::GroupingSets => "GROUPING SETS, CUBE and ROLLUP",
            Self::SetOperations => "UNION, UNION ALL, INTERSECT, EXCEPT",
            Self::Conditional => "CASE, COALESCE, NULLIF and CAST",
            Self::Constraints => "primary key, foreign key, check and unique constraints",
            Self::DataModification => "inserts, updates, deletes and upserts with RETURNING",
            Self::Transactions => "atomic booking and rollback on failure",
        }
    }

    /// Run this demo against the gateway
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a step.
    pub async fn run(self, gateway: Arc<dyn QueryGateway>) -> Result<Vec<DemoStep>, UseCaseError> {
        match self {
            Self::Routes => RouteListing::new(gateway).execute().await,
            Self::Querying => BasicQueries::new(gateway).execute().await,
            Self::Filtering => FilteringQueries::new(gateway).execute().await,
            Self::Joins => JoinQueries::new(gateway).execute().await,
            Self::Grouping => GroupingQueries::new(gateway).execute().await,
            Self::GroupingSets => GroupingSetQueries::new(gateway).execute().await,
            Self::SetOperations => SetOperationQueries::new(gateway).execute().await,
            Self::Conditional => ConditionalQueries::new(gateway).execute().await,
            Self::Constraints => ConstraintQueries::new(gateway).execute().await,
            Self::DataModification => DataModificationQueries::new(gateway).execute().await,
            Self::Transactions => TransactionQueries::new(gateway).execute().await,
        }
    }
}

impl std::fmt::Display for Demo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Demo {
    type Err = UseCaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|demo| demo.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UseCaseError::InvalidInput(format!("unknown demo '{s}'")))
    }
}

/// Run a statement and record it as a titled step
async fn step(
    gateway: &dyn QueryGateway,
    title: &'static str,
    request: QueryRequest,
) -> Result<DemoStep, UseCaseError> {
    tracing::debug!(title, "Running demo step");
    let rows = gateway.execute(&request).await?;
    Ok(DemoStep::new(title, rows))
}

/// Run a statement and decode its rows into records
async fn fetch<T: FromRow>(
    gateway: &dyn QueryGateway,
    request: QueryRequest,
) -> Result<Vec<T>, UseCaseError> {
    let rows = gateway.execute(&request).await?;
    Ok(decode_rows(&rows)?)
}
