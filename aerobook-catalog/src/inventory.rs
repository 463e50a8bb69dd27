use aerobook_core::{BookingError, BookingResult, Flight, FlightQuery};

const FLIGHT_ID_PREFIX: &str = "FL";

/// Client-side projection of the flight catalog.
///
/// Seat counts here are advisory: the server decrements capacity on its own and
/// the next `replace` overwrites whatever was projected locally.
#[derive(Debug, Clone, Default)]
pub struct FlightCatalog {
    flights: Vec<Flight>,
}

impl FlightCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_flights(flights: Vec<Flight>) -> Self {
        Self { flights }
    }

    /// Swap in a freshly fetched catalog
    pub fn replace(&mut self, flights: Vec<Flight>) {
        self.flights = flights;
    }

    pub fn flights(&self) -> &[Flight] {
        &self.flights
    }

    pub fn len(&self) -> usize {
        self.flights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }

    pub fn get(&self, flight_id: &str) -> Option<&Flight> {
        self.flights.iter().find(|f| f.flight_id == flight_id)
    }

    pub fn search(&self, query: &FlightQuery) -> Vec<&Flight> {
        self.flights.iter().filter(|f| query.matches(f)).collect()
    }

    /// Fail fast when the projection already shows a full flight.
    pub fn ensure_available(&self, flight_id: &str) -> BookingResult<&Flight> {
        let flight = self
            .get(flight_id)
            .ok_or_else(|| BookingError::NotFound(format!("Flight not found: {}", flight_id)))?;

        if !flight.has_seats() {
            return Err(BookingError::CapacityExceeded {
                flight_id: flight_id.to_string(),
                detail: "No more seats available on this flight".to_string(),
            });
        }

        Ok(flight)
    }

    /// Optimistic decrement after the server accepted a booking.
    /// Returns the projected remaining seats.
    pub fn reserve_seat(&mut self, flight_id: &str) -> BookingResult<u32> {
        self.ensure_available(flight_id)?;
        let flight = self
            .flights
            .iter_mut()
            .find(|f| f.flight_id == flight_id)
            .ok_or_else(|| BookingError::NotFound(format!("Flight not found: {}", flight_id)))?;

        flight.seat_count -= 1;
        Ok(flight.seat_count)
    }

    pub fn upsert(&mut self, flight: Flight) {
        match self.flights.iter_mut().find(|f| f.flight_id == flight.flight_id) {
            Some(existing) => *existing = flight,
            None => self.flights.push(flight),
        }
    }

    pub fn remove(&mut self, flight_id: &str) -> Option<Flight> {
        let idx = self.flights.iter().position(|f| f.flight_id == flight_id)?;
        Some(self.flights.remove(idx))
    }

    /// Next id in the `FL<n>` sequence. Ids that don't follow the pattern are ignored.
    pub fn next_flight_id(&self) -> BookingResult<String> {
        let max = self
            .flights
            .iter()
            .filter_map(|f| f.flight_id.strip_prefix(FLIGHT_ID_PREFIX))
            .filter_map(|n| n.parse::<u64>().ok())
            .max()
            .unwrap_or(0);

        let next = max
            .checked_add(1)
            .ok_or_else(|| BookingError::Validation("Flight id sequence is exhausted".to_string()))?;
        Ok(format!("{}{}", FLIGHT_ID_PREFIX, next))
    }
}
