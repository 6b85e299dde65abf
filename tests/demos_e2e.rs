//! End-to-end tests for the demo catalog
//!
//! Runs every demo against the seeded airline schema through a real
//! gateway.

mod common;

use std::sync::Arc;

use airline_query_gateway::application::use_cases::{
    ConstraintQueries, DataModificationQueries, Demo, RouteListing, TransactionQueries,
};
use airline_query_gateway::domain::gateways::QueryGateway;
use airline_query_gateway::domain::models::{QueryRequest, Value};

use common::TestDb;

async fn count(gateway: &dyn QueryGateway, statement: &str) -> i64 {
    let rows = gateway
        .execute(&QueryRequest::new(statement).unwrap())
        .await
        .unwrap();
    rows[0].get_index(0).and_then(Value::as_i64).unwrap()
}

#[tokio::test]
async fn test_every_demo_runs_in_catalog_order() {
    let db = TestDb::new().await;
    let gateway: Arc<dyn QueryGateway> = Arc::new(db.gateway().await);

    for demo in Demo::ALL {
        let steps = demo
            .run(Arc::clone(&gateway))
            .await
            .unwrap_or_else(|e| panic!("{demo} failed: {e}"));
        assert!(!steps.is_empty(), "{demo} produced no steps");
    }

    assert_eq!(gateway.status().leased, 0);
    gateway.shutdown().await;
}

#[tokio::test]
async fn test_route_listing_decodes_seeded_routes() {
    let db = TestDb::new().await;
    let gateway: Arc<dyn QueryGateway> = Arc::new(db.gateway().await);

    let routes = RouteListing::new(gateway).routes(10).await.unwrap();

    assert_eq!(routes.len(), 5);
    assert_eq!(routes[0].flight_num, "FL1111");
    assert_eq!(routes[0].distance_miles, 2475);
}

#[tokio::test]
async fn test_constraints_are_reported_once_added() {
    let db = TestDb::new().await;
    let gateway: Arc<dyn QueryGateway> = Arc::new(db.gateway().await);
    let constraints = ConstraintQueries::new(Arc::clone(&gateway));

    let first = constraints.execute().await.unwrap();
    let second = constraints.execute().await.unwrap();

    let outcome = |steps: &[airline_query_gateway::application::use_cases::DemoStep], idx: usize| {
        steps[idx].rows[0]
            .get("outcome")
            .and_then(Value::as_str)
            .unwrap()
            .to_string()
    };
    assert_eq!(outcome(&first, 0), "added");
    assert_eq!(outcome(&second, 0), "already present");
    assert_eq!(first[4].rows.len(), 4);
}

#[tokio::test]
async fn test_sequence_reset_points_past_seeded_ids() {
    let db = TestDb::new().await;
    let gateway: Arc<dyn QueryGateway> = Arc::new(db.gateway().await);

    let next = DataModificationQueries::new(gateway)
        .reset_sequence("customer", "customer_id")
        .await
        .unwrap();

    assert_eq!(next, 6);
}

#[tokio::test]
async fn test_transactions_demo_leaves_no_rolled_back_rows() {
    let db = TestDb::new().await;
    let gateway: Arc<dyn QueryGateway> = Arc::new(db.gateway().await);
    let passengers = count(gateway.as_ref(), "SELECT COUNT(*) FROM passengers_on_flights").await;

    let steps = TransactionQueries::new(Arc::clone(&gateway))
        .execute()
        .await
        .unwrap();

    assert_eq!(steps[0].rows.len(), 1);
    assert_eq!(steps[1].rows[0].get("bookings"), Some(&Value::Int64(0)));
    assert_eq!(
        count(gateway.as_ref(), "SELECT COUNT(*) FROM passengers_on_flights").await,
        passengers + 1
    );
}
