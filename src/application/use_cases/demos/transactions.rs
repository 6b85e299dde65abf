//! Transactions Use Case
//!
//! Books a ticket atomically (passenger seat and ticket purchase in one
//! transaction), then shows that a failing transaction leaves no trace.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use super::{step, DataModificationQueries, DemoStep, RouteListing};
use crate::domain::gateways::QueryGateway;
use crate::domain::models::airline::{NewBooking, NewCustomer, NewTicket, PassengerFlight, TicketDetail};
use crate::domain::models::{FromRow, QueryRequest, Row};
use crate::shared::errors::{GatewayError, UseCaseError};

const INSERT_PASSENGER: &str = r#"
    INSERT INTO passengers_on_flights
        (aircraft_id, route_id, customer_id, depart, arrival, seat_num, class_id, travel_date, flight_num)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
    RETURNING *"#;

const INSERT_TICKET: &str = r#"
    INSERT INTO ticket_details
        (p_date, customer_id, aircraft_id, class_id, no_of_tickets, a_code, price_per_ticket, brand)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
    RETURNING *"#;

const FAILING_STATEMENT: &str = "SELECT 1 / 0 AS never";

const COUNT_SEATS: &str = r#"
    SELECT COUNT(*) AS bookings
    FROM passengers_on_flights
    WHERE customer_id = $1 AND seat_num = $2"#;

const ROLLBACK_SEAT: &str = "99Z";

/// Use case for the transactions tour
pub struct TransactionQueries {
    gateway: Arc<dyn QueryGateway>,
}

fn passenger_request(customer_id: i64, booking: &NewBooking) -> Result<QueryRequest, UseCaseError> {
    Ok(QueryRequest::new(INSERT_PASSENGER)?
        .bind(booking.aircraft_id.as_str())
        .bind(booking.route_id)
        .bind(customer_id)
        .bind(booking.depart.as_str())
        .bind(booking.arrival.as_str())
        .bind(booking.seat_num.as_str())
        .bind(booking.class_id.as_str())
        .bind(booking.travel_date)
        .bind(booking.flight_num.as_str()))
}

fn ticket_request(ticket: &NewTicket) -> Result<QueryRequest, UseCaseError> {
    Ok(QueryRequest::new(INSERT_TICKET)?
        .bind(ticket.p_date)
        .bind(ticket.customer_id)
        .bind(ticket.aircraft_id.as_str())
        .bind(ticket.class_id.as_str())
        .bind(ticket.no_of_tickets)
        .bind(ticket.a_code.as_str())
        .bind(ticket.price_per_ticket)
        .bind(ticket.brand.as_str()))
}

fn single<T: FromRow>(rows: &[Row], what: &'static str) -> Result<T, UseCaseError> {
    let row = rows.first().ok_or(UseCaseError::EmptyResult(what))?;
    Ok(T::from_row(row)?)
}

impl TransactionQueries {
    /// Create a new TransactionQueries
    #[must_use]
    pub fn new(gateway: Arc<dyn QueryGateway>) -> Self {
        Self { gateway }
    }

    /// Seat the passenger and record the ticket purchase in one
    /// transaction. Either both rows exist afterwards or neither does.
    ///
    /// # Errors
    ///
    /// Returns `UseCaseError::Gateway` if either insert fails; the
    /// transaction has then been rolled back.
    pub async fn book_ticket(
        &self,
        booking: &NewBooking,
        ticket: &NewTicket,
    ) -> Result<(PassengerFlight, TicketDetail), UseCaseError> {
        let requests = [passenger_request(ticket.customer_id, booking)?, ticket_request(ticket)?];
        let results = self.gateway.execute_in_transaction(&requests).await?;
        match results.as_slice() {
            [passenger, ticket] => Ok((
                single(passenger, "passenger insert")?,
                single(ticket, "ticket insert")?,
            )),
            _ => Err(UseCaseError::EmptyResult("booking transaction")),
        }
    }

    /// Execute the use case
    ///
    /// # Errors
    ///
    /// Returns the first unexpected failure. The deliberately failing
    /// transaction is not an error.
    pub async fn execute(&self) -> Result<Vec<DemoStep>, UseCaseError> {
        let gw = self.gateway.as_ref();
        let today = Utc::now().date_naive();

        let route = RouteListing::new(Arc::clone(&self.gateway))
            .routes(1)
            .await?
            .into_iter()
            .next()
            .ok_or(UseCaseError::EmptyResult("route lookup"))?;
        let customer = DataModificationQueries::new(Arc::clone(&self.gateway))
            .insert_customer(&NewCustomer {
                first_name: "Jane".into(),
                last_name: format!("Traveler-{}", today.format("%Y%m%d")),
                date_of_birth: NaiveDate::from_ymd_opt(1985, 6, 15)
                    .ok_or_else(|| UseCaseError::InvalidInput("invalid birth date".into()))?,
                gender: "F".into(),
            })
            .await?;

        let booking = NewBooking {
            aircraft_id: route.aircraft_id.clone(),
            route_id: route.route_id,
            depart: route.origin_airport.clone(),
            arrival: route.destination_airport.clone(),
            seat_num: "12A".into(),
            class_id: "economy".into(),
            travel_date: today,
            flight_num: route.flight_num.clone(),
        };
        let ticket = NewTicket {
            p_date: today,
            customer_id: customer.customer_id,
            aircraft_id: route.aircraft_id.clone(),
            class_id: "economy".into(),
            no_of_tickets: 1,
            a_code: route.origin_airport.clone(),
            price_per_ticket: Decimal::from(420),
            brand: "ExampleAir".into(),
        };

        let (passenger, purchase) = self.book_ticket(&booking, &ticket).await?;
        tracing::info!(
            customer_id = passenger.customer_id,
            flight_num = %passenger.flight_num,
            price = %purchase.price_per_ticket,
            "Ticket booked"
        );

        let mut steps = vec![
            step(
                gw,
                "Committed booking",
                QueryRequest::new(
                    "SELECT * FROM passengers_on_flights WHERE customer_id = $1 ORDER BY travel_date",
                )?
                .bind(customer.customer_id),
            )
            .await?,
        ];

        let doomed = [
            passenger_request(
                customer.customer_id,
                &NewBooking {
                    seat_num: ROLLBACK_SEAT.into(),
                    ..booking
                },
            )?,
            QueryRequest::new(FAILING_STATEMENT)?,
        ];
        match gw.execute_in_transaction(&doomed).await {
            Err(GatewayError::QueryFailed { code, detail, .. }) => {
                tracing::info!(sqlstate = ?code, %detail, "Transaction rolled back as expected");
            }
            Err(err) => return Err(err.into()),
            Ok(_) => tracing::warn!("Failing transaction unexpectedly committed"),
        }

        steps.push(
            step(
                gw,
                "After rollback: seat from the failed transaction",
                QueryRequest::new(COUNT_SEATS)?
                    .bind(customer.customer_id)
                    .bind(ROLLBACK_SEAT),
            )
            .await?,
        );
        Ok(steps)
    }
}
