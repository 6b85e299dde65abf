//! Data Modification Use Case
//!
//! Inserts, updates, deletes and upserts with `RETURNING`, run against a
//! freshly inserted sample customer.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::{fetch, step, DemoStep};
use crate::domain::gateways::QueryGateway;
use crate::domain::models::airline::{
    Customer, NewCustomer, NewRoute, NewTicket, PassengerFlight, Route, TicketDetail,
};
use crate::domain::models::{FromRow, QueryRequest, Row, Value};
use crate::shared::errors::UseCaseError;

const TICKET_COLUMNS: usize = 8;

const INSERT_CUSTOMER: &str = r#"
    INSERT INTO customer (first_name, last_name, date_of_birth, gender)
    VALUES ($1, $2, $3, $4)
    RETURNING *"#;

const UPDATE_TICKET_PRICE: &str = r#"
    UPDATE ticket_details
    SET price_per_ticket = $2
    WHERE customer_id = $1
    RETURNING *"#;

const RAISE_LONG_HAUL_PRICES: &str = r#"
    UPDATE ticket_details td
    SET price_per_ticket = td.price_per_ticket + $2
    FROM routes r
    JOIN passengers_on_flights pf ON r.route_id = pf.route_id
    WHERE td.aircraft_id = pf.aircraft_id
    AND r.distance_miles > $1
    RETURNING td.customer_id, td.price_per_ticket, r.distance_miles"#;

const DELETE_EXPIRED_TICKETS: &str = r#"
    DELETE FROM ticket_details
    WHERE p_date < $1
    RETURNING *"#;

const UPSERT_ROUTE: &str = r#"
    INSERT INTO routes (flight_num, origin_airport, destination_airport, aircraft_id, distance_miles)
    VALUES ($1, $2, $3, $4, $5)
    ON CONFLICT DO NOTHING
    RETURNING *"#;

const CHANGE_CLASS: &str = r#"
    UPDATE passengers_on_flights
    SET class_id = $3
    WHERE customer_id = $1 AND flight_num = $2
    AND class_id <> $3
    RETURNING *"#;

const DELETE_CANCELLED_FLIGHTS: &str = r#"
    DELETE FROM passengers_on_flights pf
    USING routes r
    WHERE pf.route_id = r.route_id
    AND r.origin_airport = r.destination_airport
    RETURNING pf.*, r.origin_airport, r.destination_airport"#;

/// Check that `name` can be spliced into SQL as a bare identifier
fn identifier(name: &str) -> Result<&str, UseCaseError> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(name)
    } else {
        Err(UseCaseError::InvalidInput(format!("'{name}' is not a plain SQL identifier")))
    }
}

/// Build `INSERT INTO ticket_details ... VALUES ($1..$8), ($9..$16), ...`
fn insert_tickets_statement(count: usize) -> String {
    let values = (0..count)
        .map(|i| {
            let placeholders = (1..=TICKET_COLUMNS)
                .map(|c| format!("${}", i * TICKET_COLUMNS + c))
                .collect::<Vec<_>>()
                .join(", ");
            format!("({placeholders})")
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO ticket_details (p_date, customer_id, aircraft_id, class_id, no_of_tickets, \
         a_code, price_per_ticket, brand) VALUES {values} RETURNING *"
    )
}

/// Use case for the data modification tour
pub struct DataModificationQueries {
    gateway: Arc<dyn QueryGateway>,
}

impl DataModificationQueries {
    /// Create a new DataModificationQueries
    #[must_use]
    pub fn new(gateway: Arc<dyn QueryGateway>) -> Self {
        Self { gateway }
    }

    async fn first<T: FromRow>(
        &self,
        request: QueryRequest,
    ) -> Result<Option<T>, UseCaseError> {
        Ok(fetch(self.gateway.as_ref(), request).await?.into_iter().next())
    }

    /// Move a serial column's sequence past the current maximum so that
    /// subsequent inserts don't collide with seeded ids. Returns the next
    /// value the sequence will hand out.
    ///
    /// # Errors
    ///
    /// Returns `UseCaseError::InvalidInput` if either name is not a plain
    /// identifier, `UseCaseError::Gateway` if the statement fails.
    pub async fn reset_sequence(&self, table: &str, column: &str) -> Result<i64, UseCaseError> {
        let (table, column) = (identifier(table)?, identifier(column)?);
        let statement = format!(
            "SELECT setval(pg_get_serial_sequence('{table}', '{column}'), \
             COALESCE((SELECT MAX({column}) FROM {table}), 0) + 1, false) AS next_id"
        );
        let rows = self.gateway.execute(&QueryRequest::new(statement)?).await?;
        let next_id = rows
            .first()
            .and_then(|row| row.get("next_id"))
            .and_then(Value::as_i64)
            .ok_or(UseCaseError::EmptyResult("sequence reset"))?;
        tracing::info!(table, column, next_id, "Sequence reset");
        Ok(next_id)
    }

    /// Insert a single customer
    ///
    /// # Errors
    ///
    /// Returns `UseCaseError::EmptyResult` if nothing was returned,
    /// `UseCaseError::Gateway` on failure.
    pub async fn insert_customer(&self, customer: &NewCustomer) -> Result<Customer, UseCaseError> {
        let request = QueryRequest::new(INSERT_CUSTOMER)?
            .bind(customer.first_name.as_str())
            .bind(customer.last_name.as_str())
            .bind(customer.date_of_birth)
            .bind(customer.gender.as_str());
        self.first(request)
            .await?
            .ok_or(UseCaseError::EmptyResult("customer insert"))
    }

    /// Insert several tickets in one multi-row statement
    ///
    /// # Errors
    ///
    /// Returns `UseCaseError::InvalidInput` for an empty batch,
    /// `UseCaseError::Gateway` on failure.
    pub async fn insert_tickets(&self, tickets: &[NewTicket]) -> Result<Vec<TicketDetail>, UseCaseError> {
        if tickets.is_empty() {
            return Err(UseCaseError::InvalidInput("no tickets to insert".into()));
        }
        let params = tickets
            .iter()
            .flat_map(|t| {
                [
                    Value::from(t.p_date),
                    Value::from(t.customer_id),
                    Value::from(t.aircraft_id.as_str()),
                    Value::from(t.class_id.as_str()),
                    Value::from(t.no_of_tickets),
                    Value::from(t.a_code.as_str()),
                    Value::from(t.price_per_ticket),
                    Value::from(t.brand.as_str()),
                ]
            })
            .collect();
        let request = QueryRequest::with_params(insert_tickets_statement(tickets.len()), params)?;
        fetch(self.gateway.as_ref(), request).await
    }

    /// Set the ticket price of every ticket bought by a customer
    ///
    /// # Errors
    ///
    /// Returns `UseCaseError::Gateway` on failure.
    pub async fn update_ticket_price(
        &self,
        customer_id: i64,
        price: Decimal,
    ) -> Result<Option<TicketDetail>, UseCaseError> {
        self.first(QueryRequest::new(UPDATE_TICKET_PRICE)?.bind(customer_id).bind(price))
            .await
    }

    /// Insert a route unless it conflicts with an existing one. `None`
    /// means the route was already present.
    ///
    /// # Errors
    ///
    /// Returns `UseCaseError::Gateway` on failure.
    pub async fn upsert_route(&self, route: &NewRoute) -> Result<Option<Route>, UseCaseError> {
        let request = QueryRequest::new(UPSERT_ROUTE)?
            .bind(route.flight_num.as_str())
            .bind(route.origin_airport.as_str())
            .bind(route.destination_airport.as_str())
            .bind(route.aircraft_id.as_str())
            .bind(route.distance_miles);
        self.first(request).await
    }

    /// Move a passenger to another class; `None` if already in it
    ///
    /// # Errors
    ///
    /// Returns `UseCaseError::Gateway` on failure.
    pub async fn change_class(
        &self,
        customer_id: i64,
        flight_num: &str,
        class_id: &str,
    ) -> Result<Option<PassengerFlight>, UseCaseError> {
        self.first(
            QueryRequest::new(CHANGE_CLASS)?
                .bind(customer_id)
                .bind(flight_num)
                .bind(class_id),
        )
        .await
    }

    /// Execute the use case
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error.
    pub async fn execute(&self) -> Result<Vec<DemoStep>, UseCaseError> {
        let gw = self.gateway.as_ref();
        let date = |y, m, d| {
            NaiveDate::from_ymd_opt(y, m, d)
                .ok_or_else(|| UseCaseError::InvalidInput(format!("invalid date {y}-{m}-{d}")))
        };
        let mut steps = Vec::with_capacity(10);

        for (table, column) in [("customer", "customer_id"), ("routes", "route_id")] {
            let next_id = self.reset_sequence(table, column).await?;
            steps.push(DemoStep::new(
                "Reset sequence",
                vec![record(&[
                    ("table", Value::from(table)),
                    ("next_id", Value::from(next_id)),
                ])],
            ));
        }

        let customer = self
            .insert_customer(&NewCustomer {
                first_name: "John".into(),
                last_name: "Doe".into(),
                date_of_birth: date(1990, 1, 1)?,
                gender: "M".into(),
            })
            .await?;
        steps.push(DemoStep::new("Insert single customer", vec![customer_record(&customer)]));

        let ticket = |aircraft_id: &str, class_id: &str, count, a_code: &str, price: i64| {
            Ok::<_, UseCaseError>(NewTicket {
                p_date: date(2025, 5, 21)?,
                customer_id: customer.customer_id,
                aircraft_id: aircraft_id.into(),
                class_id: class_id.into(),
                no_of_tickets: count,
                a_code: a_code.into(),
                price_per_ticket: Decimal::from(price),
                brand: "ExampleAir".into(),
            })
        };
        let tickets = self
            .insert_tickets(&[
                ticket("A123", "economy", 2, "JFK", 300)?,
                ticket("B456", "business", 1, "LAX", 800)?,
            ])
            .await?;
        tracing::info!(inserted = tickets.len(), "Tickets inserted");

        steps.push(
            step(
                gw,
                "Insert multiple tickets",
                QueryRequest::new("SELECT * FROM ticket_details WHERE customer_id = $1")?
                    .bind(customer.customer_id),
            )
            .await?,
        );
        steps.push(
            step(
                gw,
                "Update ticket price",
                QueryRequest::new(UPDATE_TICKET_PRICE)?
                    .bind(customer.customer_id)
                    .bind(Decimal::from(350)),
            )
            .await?,
        );
        steps.push(
            step(
                gw,
                "Update prices for long-distance flights (UPDATE ... FROM)",
                QueryRequest::new(RAISE_LONG_HAUL_PRICES)?
                    .bind(1000_i32)
                    .bind(Decimal::from(50)),
            )
            .await?,
        );
        steps.push(
            step(
                gw,
                "Delete expired tickets",
                QueryRequest::new(DELETE_EXPIRED_TICKETS)?.bind(date(2025, 4, 21)?),
            )
            .await?,
        );

        let route = NewRoute {
            flight_num: "FL999".into(),
            origin_airport: "JFK".into(),
            destination_airport: "LAX".into(),
            aircraft_id: "A123".into(),
            distance_miles: 2475,
        };
        let upserted = self.upsert_route(&route).await?;
        steps.push(DemoStep::new(
            "Upsert route (ON CONFLICT DO NOTHING)",
            upserted.iter().map(route_record).collect(),
        ));

        let changed = self
            .change_class(customer.customer_id, &route.flight_num, "business")
            .await?;
        steps.push(DemoStep::new(
            "Conditional update: upgrade class",
            changed
                .iter()
                .map(|p| {
                    record(&[
                        ("customer_id", Value::from(p.customer_id)),
                        ("flight_num", Value::from(p.flight_num.as_str())),
                        ("class_id", Value::from(p.class_id.as_str())),
                    ])
                })
                .collect(),
        ));

        steps.push(
            step(
                gw,
                "Delete cancelled flights (DELETE ... USING)",
                QueryRequest::new(DELETE_CANCELLED_FLIGHTS)?,
            )
            .await?,
        );
        Ok(steps)
    }
}

fn record(pairs: &[(&str, Value)]) -> Row {
    let columns: Arc<[String]> = pairs.iter().map(|(c, _)| (*c).to_string()).collect();
    Row::new(columns, pairs.iter().map(|(_, v)| v.clone()).collect())
}

fn customer_record(c: &Customer) -> Row {
    record(&[
        ("customer_id", Value::from(c.customer_id)),
        ("first_name", Value::from(c.first_name.as_str())),
        ("last_name", Value::from(c.last_name.as_str())),
        ("date_of_birth", Value::from(c.date_of_birth)),
        ("gender", Value::from(c.gender.clone())),
    ])
}

fn route_record(r: &Route) -> Row {
    record(&[
        ("route_id", Value::from(r.route_id)),
        ("flight_num", Value::from(r.flight_num.as_str())),
        ("origin_airport", Value::from(r.origin_airport.as_str())),
        ("destination_airport", Value::from(r.destination_airport.as_str())),
        ("aircraft_id", Value::from(r.aircraft_id.as_str())),
        ("distance_miles", Value::from(r.distance_miles)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::gateways::MockQueryGateway;
    use crate::domain::models::row::test_support::row;

    #[test]
    fn should_accept_plain_identifiers_only() {
        assert!(identifier("customer_id").is_ok());
        assert!(identifier("_routes2").is_ok());
        assert!(identifier("2routes").is_err());
        assert!(identifier("routes; DROP TABLE customer").is_err());
        assert!(identifier("").is_err());
    }

    #[test]
    fn should_number_placeholders_across_rows() {
        let statement = insert_tickets_statement(2);

        assert!(statement.contains("($1, $2, $3, $4, $5, $6, $7, $8), ($9, $10"));
        assert!(statement.ends_with("$16) RETURNING *"));
    }

    #[tokio::test]
    async fn should_reject_unsafe_sequence_names_without_querying() {
        let gateway = MockQueryGateway::new();

        let result = DataModificationQueries::new(Arc::new(gateway))
            .reset_sequence("customer'--", "customer_id")
            .await;

        assert!(matches!(result, Err(UseCaseError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn should_fail_when_insert_returns_nothing() {
        let mut gateway = MockQueryGateway::new();
        gateway.expect_execute().returning(|_| Ok(vec![]));

        let result = DataModificationQueries::new(Arc::new(gateway))
            .insert_customer(&NewCustomer {
                first_name: "John".into(),
                last_name: "Doe".into(),
                date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
                gender: "M".into(),
            })
            .await;

        assert!(matches!(result, Err(UseCaseError::EmptyResult("customer insert"))));
    }

    #[tokio::test]
    async fn should_bind_eight_params_per_ticket() {
        let mut gateway = MockQueryGateway::new();
        gateway
            .expect_execute()
            .withf(|req| req.params().len() == 16 && req.params()[9] == Value::Int64(7))
            .returning(|_| Ok(vec![]));
        let ticket = NewTicket {
            p_date: NaiveDate::from_ymd_opt(2025, 5, 21).unwrap(),
            customer_id: 7,
            aircraft_id: "A123".into(),
            class_id: "economy".into(),
            no_of_tickets: 2,
            a_code: "JFK".into(),
            price_per_ticket: Decimal::from(300),
            brand: "ExampleAir".into(),
        };

        let inserted = DataModificationQueries::new(Arc::new(gateway))
            .insert_tickets(&[ticket.clone(), ticket])
            .await
            .unwrap();

        assert!(inserted.is_empty());
    }

    #[tokio::test]
    async fn should_treat_conflicting_upsert_as_none() {
        let mut gateway = MockQueryGateway::new();
        gateway
            .expect_execute()
            .withf(|req| req.statement() == UPSERT_ROUTE && req.params()[4] == Value::Int32(2475))
            .returning(|_| Ok(vec![]));

        let upserted = DataModificationQueries::new(Arc::new(gateway))
            .upsert_route(&NewRoute {
                flight_num: "FL999".into(),
                origin_airport: "JFK".into(),
                destination_airport: "LAX".into(),
                aircraft_id: "A123".into(),
                distance_miles: 2475,
            })
            .await
            .unwrap();

        assert_eq!(upserted, None);
    }

    #[tokio::test]
    async fn should_read_next_sequence_value() {
        let mut gateway = MockQueryGateway::new();
        gateway
            .expect_execute()
            .withf(|req| req.statement().contains("pg_get_serial_sequence('routes', 'route_id')"))
            .returning(|_| Ok(vec![row(vec![("next_id", Value::Int64(51))])]));

        let next = DataModificationQueries::new(Arc::new(gateway))
            .reset_sequence("routes", "route_id")
            .await
            .unwrap();

        assert_eq!(next, 51);
    }

    #[tokio::test]
    async fn should_bind_customer_before_price() {
        let mut gateway = MockQueryGateway::new();
        gateway
            .expect_execute()
            .withf(|req| {
                req.statement() == UPDATE_TICKET_PRICE
                    && req.params() == [Value::Int64(7), Value::Decimal(Decimal::from(350))]
            })
            .returning(|_| Ok(vec![]));

        let updated = DataModificationQueries::new(Arc::new(gateway))
            .update_ticket_price(7, Decimal::from(350))
            .await
            .unwrap();

        assert_eq!(updated, None);
    }
}
