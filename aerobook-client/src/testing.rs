//! In-memory gateway for unit tests.

use aerobook_core::{
    BookingError, BookingGateway, BookingResult, City, DictionaryGateway, Flight, Identity, Order,
    OrderStatus, Role, Ticket, TicketState,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Mutex;
use std::time::Duration;

pub fn flight(id: &str, seats: u32, price: i64) -> Flight {
    Flight {
        flight_id: id.to_string(),
        origin: "Москва".to_string(),
        destination: "Санкт-Петербург".to_string(),
        date: NaiveDate::from_ymd_opt(2024, 12, 20).unwrap(),
        price: Decimal::from(price),
        seat_count: seats,
    }
}

pub fn passenger(user_id: &str) -> Identity {
    Identity::new(user_id, format!("token-{}", user_id), Role::Passenger)
}

pub fn admin() -> Identity {
    Identity::new("admin", "token-admin", Role::Admin)
}

#[derive(Default)]
struct Inner {
    flights: Vec<Flight>,
    cities: Vec<City>,
    tickets: Vec<Ticket>,
    orders: Vec<Order>,
    next_id: u32,
    fail_next: Option<String>,
    reject_payment: Option<String>,
    stall_payments: bool,
    failing_lists: usize,
    create_calls: usize,
    pay_calls: usize,
    list_calls: usize,
}

#[derive(Default)]
pub struct FakeGateway {
    inner: Mutex<Inner>,
}

impl FakeGateway {
    pub fn with_flights(flights: Vec<Flight>) -> Self {
        let gateway = Self::default();
        gateway.inner.lock().unwrap().flights = flights;
        gateway
    }

    pub fn seed_ticket(&self, ticket: Ticket) {
        self.inner.lock().unwrap().tickets.push(ticket);
    }

    pub fn seed_order(&self, order: Order) {
        self.inner.lock().unwrap().orders.push(order);
    }

    pub fn set_state(&self, ticket_id: &str, state: TicketState) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(t) = inner.tickets.iter_mut().find(|t| t.ticket_id == ticket_id) {
            t.state = state;
        }
    }

    /// Next gateway call fails with a 502
    pub fn fail_next(&self, detail: &str) {
        self.inner.lock().unwrap().fail_next = Some(detail.to_string());
    }

    pub fn reject_next_payment(&self, detail: &str) {
        self.inner.lock().unwrap().reject_payment = Some(detail.to_string());
    }

    /// Pay requests hang for an hour before being processed
    pub fn stall_payments(&self, stall: bool) {
        self.inner.lock().unwrap().stall_payments = stall;
    }

    pub fn fail_lists(&self, count: usize) {
        self.inner.lock().unwrap().failing_lists = count;
    }

    pub fn create_calls(&self) -> usize {
        self.inner.lock().unwrap().create_calls
    }

    pub fn pay_calls(&self) -> usize {
        self.inner.lock().unwrap().pay_calls
    }

    pub fn list_calls(&self) -> usize {
        self.inner.lock().unwrap().list_calls
    }

    fn check_failure(inner: &mut Inner) -> BookingResult<()> {
        match inner.fail_next.take() {
            Some(detail) => Err(BookingError::UpstreamFailure { status: Some(502), detail }),
            None => Ok(()),
        }
    }
}

fn rejected(detail: &str) -> BookingError {
    BookingError::UpstreamFailure {
        status: Some(400),
        detail: detail.to_string(),
    }
}

#[async_trait]
impl BookingGateway for FakeGateway {
    async fn create_ticket(
        &self,
        identity: &Identity,
        flight_id: &str,
        price: Decimal,
    ) -> BookingResult<String> {
        let mut inner = self.inner.lock().unwrap();
        inner.create_calls += 1;
        Self::check_failure(&mut inner)?;

        let flight = inner
            .flights
            .iter_mut()
            .find(|f| f.flight_id == flight_id)
            .ok_or_else(|| BookingError::NotFound("Flight not found".to_string()))?;
        if flight.seat_count == 0 {
            return Err(rejected(
                "Failed to decrement passenger count: No more seats available on this flight",
            ));
        }
        flight.seat_count -= 1;

        inner.next_id += 1;
        let ticket_id = format!("T{}", inner.next_id);
        inner
            .tickets
            .push(Ticket::new(ticket_id.clone(), flight_id, identity.user_id.clone(), price));
        Ok(ticket_id)
    }

    async fn list_tickets(&self, identity: &Identity) -> BookingResult<Vec<Ticket>> {
        let mut inner = self.inner.lock().unwrap();
        inner.list_calls += 1;
        Self::check_failure(&mut inner)?;
        if inner.failing_lists > 0 {
            inner.failing_lists -= 1;
            return Err(BookingError::upstream("Failed to load tickets"));
        }

        Ok(inner
            .tickets
            .iter()
            .filter(|t| t.user_id == identity.user_id)
            .cloned()
            .collect())
    }

    async fn pay_ticket(&self, identity: &Identity, ticket_id: &str) -> BookingResult<()> {
        let stalled = {
            let mut inner = self.inner.lock().unwrap();
            inner.pay_calls += 1;
            inner.stall_payments
        };
        if stalled {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }

        let mut inner = self.inner.lock().unwrap();
        Self::check_failure(&mut inner)?;
        if let Some(detail) = inner.reject_payment.take() {
            return Err(rejected(&detail));
        }

        let ticket = inner
            .tickets
            .iter_mut()
            .find(|t| t.ticket_id == ticket_id && t.user_id == identity.user_id)
            .ok_or_else(|| BookingError::NotFound("Ticket not found or not yours".to_string()))?;
        ticket.state = TicketState::Pending;
        Ok(())
    }

    async fn cancel_ticket(&self, identity: &Identity, ticket_id: &str) -> BookingResult<()> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_failure(&mut inner)?;

        let before = inner.tickets.len();
        inner
            .tickets
            .retain(|t| !(t.ticket_id == ticket_id && t.user_id == identity.user_id));
        if inner.tickets.len() == before {
            return Err(BookingError::NotFound("Ticket not found or not yours".to_string()));
        }
        Ok(())
    }

    async fn list_orders(&self, identity: &Identity) -> BookingResult<Vec<Order>> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_failure(&mut inner)?;
        Ok(inner
            .orders
            .iter()
            .filter(|o| o.user_id == identity.user_id)
            .cloned()
            .collect())
    }

    async fn list_all_orders(&self, identity: &Identity) -> BookingResult<Vec<Order>> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_failure(&mut inner)?;
        if !identity.is_admin() {
            return Err(BookingError::Unauthorized("Forbidden".to_string()));
        }
        Ok(inner.orders.clone())
    }
}

#[async_trait]
impl DictionaryGateway for FakeGateway {
    async fn list_flights(&self, _identity: Option<&Identity>) -> BookingResult<Vec<Flight>> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_failure(&mut inner)?;
        Ok(inner.flights.clone())
    }

    async fn list_cities(&self, _identity: Option<&Identity>) -> BookingResult<Vec<City>> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_failure(&mut inner)?;
        Ok(inner.cities.clone())
    }

    async fn add_flight(&self, _identity: &Identity, flight: &Flight) -> BookingResult<Flight> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_failure(&mut inner)?;
        if inner.flights.iter().any(|f| f.flight_id == flight.flight_id) {
            return Err(rejected("Flight ID already exists"));
        }
        inner.flights.push(flight.clone());
        Ok(flight.clone())
    }

    async fn delete_flight(&self, _identity: &Identity, flight_id: &str) -> BookingResult<()> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_failure(&mut inner)?;
        let before = inner.flights.len();
        inner.flights.retain(|f| f.flight_id != flight_id);
        if inner.flights.len() == before {
            return Err(rejected("Flight ID does not exists"));
        }
        Ok(())
    }

    async fn add_city(&self, _identity: &Identity, city: &City) -> BookingResult<City> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_failure(&mut inner)?;
        if inner.cities.iter().any(|c| c.name == city.name) {
            return Err(rejected("City already exists"));
        }
        inner.cities.push(city.clone());
        Ok(city.clone())
    }

    async fn delete_city(&self, _identity: &Identity, name: &str) -> BookingResult<()> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_failure(&mut inner)?;
        let before = inner.cities.len();
        inner.cities.retain(|c| c.name != name);
        if inner.cities.len() == before {
            return Err(rejected("City does not exists"));
        }
        Ok(())
    }
}

pub fn paid_order(user_id: &str, ticket_id: &str, price: i64) -> Order {
    Order {
        order_id: None,
        user_id: user_id.to_string(),
        ticket_id: ticket_id.to_string(),
        price: Decimal::from(price),
        status: OrderStatus::Created,
    }
}
