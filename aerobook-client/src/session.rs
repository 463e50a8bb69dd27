use aerobook_catalog::FlightCatalog;
use aerobook_core::{
    BookingError, BookingGateway, BookingResult, City, DictionaryGateway, Flight, FlightQuery,
    Identity, Order, Ticket, UserOrderSummary,
};
use aerobook_order::{aggregate, derive_orders, Transition};
use aerobook_store::{Config, HttpGateway};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::info;

use crate::admin::{self, FlightDraft};
use crate::orders::{self, OrderReport};
use crate::state::{shared_tickets, transition_channel, SharedTickets, TransitionSender};
use crate::worker::{PollHandle, TicketPoller};
use crate::{bookings, payments};

/// Everything a booking UI needs: identity, catalog projection, the ticket
/// view and the poller that keeps it fresh.
pub struct BookingClient<G: ?Sized> {
    gateway: Arc<G>,
    identity: Option<Identity>,
    catalog: FlightCatalog,
    cities: Vec<City>,
    tickets: SharedTickets,
    events: TransitionSender,
    poll_interval: Duration,
    poller: Option<PollHandle>,
}

impl BookingClient<HttpGateway> {
    pub fn from_config(config: &Config) -> BookingResult<Self> {
        let gateway = HttpGateway::new(&config.gateway)?;
        Ok(Self::new(Arc::new(gateway), config.polling.interval()))
    }
}

impl<G> BookingClient<G>
where
    G: BookingGateway + DictionaryGateway + ?Sized + 'static,
{
    pub fn new(gateway: Arc<G>, poll_interval: Duration) -> Self {
        Self {
            gateway,
            identity: None,
            catalog: FlightCatalog::new(),
            cities: Vec::new(),
            tickets: shared_tickets(),
            events: transition_channel(),
            poll_interval,
            poller: None,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Switch to a new identity. Anything tied to the previous one is dropped.
    pub async fn sign_in(&mut self, identity: Identity) {
        self.stop_polling().await;
        self.tickets.write().await.replace_all(Vec::new());
        info!("Signed in as {}", identity.user_id);
        self.identity = Some(identity);
    }

    /// Clear the identity; the poller stops with it.
    pub async fn sign_out(&mut self) {
        self.stop_polling().await;
        self.tickets.write().await.replace_all(Vec::new());
        if let Some(id) = self.identity.take() {
            info!("Signed out {}", id.user_id);
        }
    }

    pub async fn load_catalog(&mut self) -> BookingResult<&[Flight]> {
        let flights = self.gateway.list_flights(self.identity.as_ref()).await?;
        self.catalog.replace(flights);
        Ok(self.catalog.flights())
    }

    pub async fn load_cities(&mut self) -> BookingResult<&[City]> {
        self.cities = self.gateway.list_cities(self.identity.as_ref()).await?;
        Ok(&self.cities)
    }

    pub fn catalog(&self) -> &FlightCatalog {
        &self.catalog
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    pub fn search(&self, query: &FlightQuery) -> Vec<&Flight> {
        self.catalog.search(query)
    }

    /// Initial load of the ticket view. Unlike polling, errors surface here.
    pub async fn refresh_tickets(&self) -> BookingResult<Vec<Transition>> {
        let identity = Identity::require(self.identity.as_ref())?;
        let fetched = self.gateway.list_tickets(identity).await?;
        let transitions = self.tickets.write().await.replace_all(fetched);
        for t in &transitions {
            let _ = self.events.send(t.clone());
        }
        Ok(transitions)
    }

    /// (Re)start the periodic refresh for the current identity.
    pub async fn start_polling(&mut self) -> BookingResult<()> {
        let identity = Identity::require(self.identity.as_ref())?.clone();
        self.stop_polling().await;

        let poller = TicketPoller::new(
            self.gateway.clone(),
            identity,
            self.tickets.clone(),
            self.events.clone(),
            self.poll_interval,
        );
        self.poller = Some(poller.spawn());
        Ok(())
    }

    pub async fn stop_polling(&mut self) {
        if let Some(handle) = self.poller.take() {
            handle.stop().await;
        }
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(PollHandle::is_running)
    }

    pub fn poller(&self) -> Option<&PollHandle> {
        self.poller.as_ref()
    }

    /// Transitions observed by refreshes and the poller
    pub fn subscribe(&self) -> broadcast::Receiver<Transition> {
        self.events.subscribe()
    }

    pub async fn tickets(&self) -> Vec<Ticket> {
        self.tickets.read().await.tickets().to_vec()
    }

    pub async fn ticket(&self, ticket_id: &str) -> Option<Ticket> {
        self.tickets.read().await.get(ticket_id).cloned()
    }

    /// Order view of the local tickets
    pub async fn orders(&self) -> Vec<Order> {
        derive_orders(self.tickets.read().await.tickets())
    }

    /// Per-user rollup of the local tickets
    pub async fn spend_summary(&self) -> Vec<UserOrderSummary> {
        aggregate(self.tickets.read().await.tickets())
    }

    /// Book at the catalog price
    pub async fn book(&mut self, flight_id: &str) -> BookingResult<Ticket> {
        let price = self
            .catalog
            .get(flight_id)
            .map(|f| f.price)
            .ok_or_else(|| BookingError::NotFound(format!("Flight not found: {}", flight_id)))?;
        self.book_at(flight_id, price).await
    }

    pub async fn book_at(&mut self, flight_id: &str, price: Decimal) -> BookingResult<Ticket> {
        bookings::book(
            self.gateway.as_ref(),
            &mut self.catalog,
            &self.tickets,
            self.identity.as_ref(),
            flight_id,
            price,
        )
        .await
    }

    pub async fn pay(&self, ticket_id: &str) -> BookingResult<()> {
        payments::pay(self.gateway.as_ref(), &self.tickets, self.identity.as_ref(), ticket_id).await
    }

    pub async fn cancel(&self, ticket_id: &str) -> BookingResult<()> {
        bookings::cancel(self.gateway.as_ref(), &self.tickets, self.identity.as_ref(), ticket_id).await
    }

    pub async fn order_history(&self) -> BookingResult<Vec<Order>> {
        orders::order_history(self.gateway.as_ref(), self.identity.as_ref()).await
    }

    pub async fn order_report(&self) -> BookingResult<OrderReport> {
        orders::order_report(self.gateway.as_ref(), self.identity.as_ref()).await
    }

    pub async fn add_flight(&mut self, draft: FlightDraft) -> BookingResult<Flight> {
        admin::add_flight(self.gateway.as_ref(), &mut self.catalog, self.identity.as_ref(), draft).await
    }

    pub async fn delete_flight(&mut self, flight_id: &str) -> BookingResult<()> {
        admin::delete_flight(self.gateway.as_ref(), &mut self.catalog, self.identity.as_ref(), flight_id).await
    }

    pub async fn add_city(&mut self, name: &str) -> BookingResult<City> {
        admin::add_city(self.gateway.as_ref(), &mut self.cities, self.identity.as_ref(), name).await
    }

    pub async fn delete_city(&mut self, name: &str) -> BookingResult<()> {
        admin::delete_city(self.gateway.as_ref(), &mut self.cities, self.identity.as_ref(), name).await
    }
}
