use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::identity::Identity;
use crate::order::Order;
use crate::payment::Ticket;
use crate::search::{City, Flight};
use crate::BookingResult;

/// Booking and order endpoints of the remote gateway.
///
/// Implementations map transport and HTTP failures into `BookingError` and
/// never retry on their own.
#[async_trait]
pub trait BookingGateway: Send + Sync {
    /// Create a ticket, returning the server-assigned ticket id
    async fn create_ticket(
        &self,
        identity: &Identity,
        flight_id: &str,
        price: Decimal,
    ) -> BookingResult<String>;

    /// All tickets of the caller
    async fn list_tickets(&self, identity: &Identity) -> BookingResult<Vec<Ticket>>;

    /// Request payment; settlement happens asynchronously on the server
    async fn pay_ticket(&self, identity: &Identity, ticket_id: &str) -> BookingResult<()>;

    async fn cancel_ticket(&self, identity: &Identity, ticket_id: &str) -> BookingResult<()>;

    /// Order history of the caller
    async fn list_orders(&self, identity: &Identity) -> BookingResult<Vec<Order>>;

    /// Orders of every user (admin only)
    async fn list_all_orders(&self, identity: &Identity) -> BookingResult<Vec<Order>>;
}

/// Flight catalog and city directory endpoints.
#[async_trait]
pub trait DictionaryGateway: Send + Sync {
    async fn list_flights(&self, identity: Option<&Identity>) -> BookingResult<Vec<Flight>>;

    async fn list_cities(&self, identity: Option<&Identity>) -> BookingResult<Vec<City>>;

    async fn add_flight(&self, identity: &Identity, flight: &Flight) -> BookingResult<Flight>;

    async fn delete_flight(&self, identity: &Identity, flight_id: &str) -> BookingResult<()>;

    async fn add_city(&self, identity: &Identity, city: &City) -> BookingResult<City>;

    async fn delete_city(&self, identity: &Identity, name: &str) -> BookingResult<()>;
}
