//! Airline Records
//!
//! Typed shapes for the airline schema (`customer`, `routes`,
//! `passengers_on_flights`, `ticket_details`) and for the projections the
//! demo queries return.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::row::{FromRow, Row};
use crate::shared::errors::GatewayError;

/// Row of the `customer` table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Customer {
    pub customer_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
}

impl FromRow for Customer {
    fn from_row(row: &Row) -> Result<Self, GatewayError> {
        Ok(Self {
            customer_id: row.try_get("customer_id")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            date_of_birth: row.try_get("date_of_birth")?,
            gender: row.try_get("gender")?,
        })
    }
}

/// Data required to insert a customer
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
}

/// Row of the `routes` table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub route_id: i64,
    pub flight_num: String,
    pub origin_airport: String,
    pub destination_airport: String,
    pub aircraft_id: String,
    pub distance_miles: i64,
}

impl FromRow for Route {
    fn from_row(row: &Row) -> Result<Self, GatewayError> {
        Ok(Self {
            route_id: row.try_get("route_id")?,
            flight_num: row.try_get("flight_num")?,
            origin_airport: row.try_get("origin_airport")?,
            destination_airport: row.try_get("destination_airport")?,
            aircraft_id: row.try_get("aircraft_id")?,
            distance_miles: row.try_get("distance_miles")?,
        })
    }
}

/// Data required to insert or upsert a route
#[derive(Debug, Clone)]
pub struct NewRoute {
    pub flight_num: String,
    pub origin_airport: String,
    pub destination_airport: String,
    pub aircraft_id: String,
    pub distance_miles: i32,
}

/// Row of the `ticket_details` table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketDetail {
    pub p_date: NaiveDate,
    pub customer_id: i64,
    pub aircraft_id: String,
    pub class_id: String,
    pub no_of_tickets: i64,
    pub a_code: String,
    pub price_per_ticket: Decimal,
    pub brand: String,
}

impl FromRow for TicketDetail {
    fn from_row(row: &Row) -> Result<Self, GatewayError> {
        Ok(Self {
            p_date: row.try_get("p_date")?,
            customer_id: row.try_get("customer_id")?,
            aircraft_id: row.try_get("aircraft_id")?,
            class_id: row.try_get("class_id")?,
            no_of_tickets: row.try_get("no_of_tickets")?,
            a_code: row.try_get("a_code")?,
            price_per_ticket: row.try_get("price_per_ticket")?,
            brand: row.try_get("brand")?,
        })
    }
}

/// Data required to insert a ticket purchase
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub p_date: NaiveDate,
    pub customer_id: i64,
    pub aircraft_id: String,
    pub class_id: String,
    pub no_of_tickets: i32,
    pub a_code: String,
    pub price_per_ticket: Decimal,
    pub brand: String,
}

/// Row of the `passengers_on_flights` table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassengerFlight {
    pub aircraft_id: String,
    pub route_id: i64,
    pub customer_id: i64,
    pub depart: String,
    pub arrival: String,
    pub seat_num: Option<String>,
    pub class_id: String,
    pub travel_date: NaiveDate,
    pub flight_num: String,
}

impl FromRow for PassengerFlight {
    fn from_row(row: &Row) -> Result<Self, GatewayError> {
        Ok(Self {
            aircraft_id: row.try_get("aircraft_id")?,
            route_id: row.try_get("route_id")?,
            customer_id: row.try_get("customer_id")?,
            depart: row.try_get("depart")?,
            arrival: row.try_get("arrival")?,
            seat_num: row.try_get("seat_num")?,
            class_id: row.try_get("class_id")?,
            travel_date: row.try_get("travel_date")?,
            flight_num: row.try_get("flight_num")?,
        })
    }
}

/// Data required to seat a passenger on a flight
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub aircraft_id: String,
    pub route_id: i64,
    pub depart: String,
    pub arrival: String,
    pub seat_num: String,
    pub class_id: String,
    pub travel_date: NaiveDate,
    pub flight_num: String,
}

/// Passenger joined with customer names
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassengerDetail {
    pub flight_num: String,
    pub first_name: String,
    pub last_name: String,
    pub seat_num: Option<String>,
    pub travel_date: NaiveDate,
}

impl FromRow for PassengerDetail {
    fn from_row(row: &Row) -> Result<Self, GatewayError> {
        Ok(Self {
            flight_num: row.try_get("flight_num")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            seat_num: row.try_get("seat_num")?,
            travel_date: row.try_get("travel_date")?,
        })
    }
}

/// Customer with an optional flight (LEFT JOIN)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerFlight {
    pub customer_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub flight_num: Option<String>,
    pub travel_date: Option<NaiveDate>,
}

impl FromRow for CustomerFlight {
    fn from_row(row: &Row) -> Result<Self, GatewayError> {
        Ok(Self {
            customer_id: row.try_get("customer_id")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            flight_num: row.try_get("flight_num")?,
            travel_date: row.try_get("travel_date")?,
        })
    }
}

/// Pair of routes flying the same distance (SELF JOIN)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SameDistanceRoute {
    pub flight1: String,
    pub flight2: String,
    pub distance_miles: i64,
}

impl FromRow for SameDistanceRoute {
    fn from_row(row: &Row) -> Result<Self, GatewayError> {
        Ok(Self {
            flight1: row.try_get("flight1")?,
            flight2: row.try_get("flight2")?,
            distance_miles: row.try_get("distance_miles")?,
        })
    }
}

/// Route with optional ticket sale (FULL OUTER JOIN)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteTicket {
    pub flight_num: Option<String>,
    pub origin_airport: Option<String>,
    pub destination_airport: Option<String>,
    pub brand: Option<String>,
    pub price_per_ticket: Option<Decimal>,
}

impl FromRow for RouteTicket {
    fn from_row(row: &Row) -> Result<Self, GatewayError> {
        Ok(Self {
            flight_num: row.try_get("flight_num")?,
            origin_airport: row.try_get("origin_airport")?,
            destination_airport: row.try_get("destination_airport")?,
            brand: row.try_get("brand")?,
            price_per_ticket: row.try_get("price_per_ticket")?,
        })
    }
}

/// Per-origin route statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteStats {
    pub origin_airport: String,
    pub total_flights: i64,
    pub avg_distance: Decimal,
    pub min_distance: i64,
    pub max_distance: i64,
}

impl FromRow for RouteStats {
    fn from_row(row: &Row) -> Result<Self, GatewayError> {
        Ok(Self {
            origin_airport: row.try_get("origin_airport")?,
            total_flights: row.try_get("total_flights")?,
            avg_distance: row.try_get("avg_distance")?,
            min_distance: row.try_get("min_distance")?,
            max_distance: row.try_get("max_distance")?,
        })
    }
}
