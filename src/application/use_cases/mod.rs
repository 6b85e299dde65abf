//! Use Cases
//!
//! Each demo is a single-purpose struct with an execute() method returning
//! the titled result sets it produced.

pub mod demos;

pub use demos::{
    BasicQueries, ConditionalQueries, ConstraintQueries, DataModificationQueries, Demo, DemoStep,
    FilteringQueries, GroupingQueries, GroupingSetQueries, JoinQueries, RouteListing,
    SetOperationQueries, TransactionQueries,
};
