//! Client core of the booking UI: booking, payment, ticket polling and the
//! admin order report, wired to the gateway traits in `aerobook-core`.

pub mod admin;
pub mod bookings;
pub mod orders;
pub mod payments;
pub mod session;
pub mod state;
pub mod worker;

#[cfg(test)]
mod testing;

pub use admin::FlightDraft;
pub use orders::OrderReport;
pub use session::BookingClient;
pub use state::{SharedTickets, TransitionSender};
pub use worker::{PollHandle, PollStats, TicketPoller};
