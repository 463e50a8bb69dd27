use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payment lifecycle of a ticket.
///
/// The gateway reports this through two fields, `status` and `paid`. They are
/// collapsed here into one state; the boolean is only derived for the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TicketState {
    Unpaid,
    Pending,
    Paid,
}

impl TicketState {
    /// `pending` wins over the flag; otherwise `paid` is authoritative.
    pub fn from_wire(status: Option<&str>, paid: bool) -> Self {
        match status {
            Some(s) if s.eq_ignore_ascii_case("pending") => Self::Pending,
            _ if paid => Self::Paid,
            _ => Self::Unpaid,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Pending => "pending",
            Self::Paid => "paid",
        }
    }

    pub fn is_paid(&self) -> bool {
        *self == Self::Paid
    }

    /// Settled states are the ones a ticket rests in between payment attempts.
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for TicketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reservation against one flight seat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TicketRecord", into = "TicketRecord")]
pub struct Ticket {
    pub ticket_id: String,
    pub flight_id: String,
    pub user_id: String,
    pub price: Decimal,
    pub state: TicketState,
}

impl Ticket {
    pub fn new(
        ticket_id: impl Into<String>,
        flight_id: impl Into<String>,
        user_id: impl Into<String>,
        price: Decimal,
    ) -> Self {
        Self {
            ticket_id: ticket_id.into(),
            flight_id: flight_id.into(),
            user_id: user_id.into(),
            price,
            state: TicketState::Unpaid,
        }
    }

    pub fn with_state(mut self, state: TicketState) -> Self {
        self.state = state;
        self
    }

    /// Wire-compatible boolean view of the state.
    pub fn paid(&self) -> bool {
        self.state.is_paid()
    }

    pub fn status(&self) -> &'static str {
        self.state.as_str()
    }
}

/// Ticket as the booking service sends it.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TicketRecord {
    #[serde(default)]
    ticket_id: String,
    flight_id: String,
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    price: Decimal,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    paid: bool,
}

impl From<TicketRecord> for Ticket {
    fn from(record: TicketRecord) -> Self {
        let state = TicketState::from_wire(record.status.as_deref(), record.paid);
        Self {
            ticket_id: record.ticket_id,
            flight_id: record.flight_id,
            user_id: record.user_id,
            price: record.price,
            state,
        }
    }
}

impl From<Ticket> for TicketRecord {
    fn from(ticket: Ticket) -> Self {
        Self {
            paid: ticket.paid(),
            status: Some(ticket.status().to_string()),
            ticket_id: ticket.ticket_id,
            flight_id: ticket.flight_id,
            user_id: ticket.user_id,
            price: ticket.price,
        }
    }
}
