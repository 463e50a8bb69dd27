use crate::models::Transition;
use aerobook_core::{BookingError, BookingResult, Ticket, TicketState};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// The caller's ticket collection and its payment state machine.
///
/// unpaid -> pending is driven locally when a payment is requested; every
/// other move is observed when the collection is replaced by a fresh fetch.
#[derive(Debug, Default)]
pub struct TicketBook {
    tickets: Vec<Ticket>,
    // Payment commands sent but not yet answered
    in_flight: HashSet<String>,
}

impl TicketBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tickets(tickets: Vec<Ticket>) -> Self {
        Self {
            tickets,
            in_flight: HashSet::new(),
        }
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn get(&self, ticket_id: &str) -> Option<&Ticket> {
        self.tickets.iter().find(|t| t.ticket_id == ticket_id)
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    /// Add a freshly booked ticket to the view
    pub fn insert(&mut self, ticket: Ticket) {
        match self.get_mut(&ticket.ticket_id) {
            Ok(existing) => *existing = ticket,
            Err(_) => self.tickets.push(ticket),
        }
    }

    /// Transition: Unpaid → Pending (optimistic, before the command is sent)
    pub fn begin_payment(&mut self, ticket_id: &str) -> BookingResult<()> {
        let ticket = self.get_mut(ticket_id)?;

        match ticket.state {
            TicketState::Unpaid => {}
            TicketState::Pending => {
                return Err(BookingError::AlreadyPending(ticket_id.to_string()));
            }
            TicketState::Paid => {
                return Err(BookingError::InvalidTransition {
                    from: TicketState::Paid.to_string(),
                    to: TicketState::Pending.to_string(),
                });
            }
        }

        ticket.state = TicketState::Pending;
        self.in_flight.insert(ticket_id.to_string());
        Ok(())
    }

    /// A payment command for this ticket is sent but not yet answered
    pub fn is_in_flight(&self, ticket_id: &str) -> bool {
        self.in_flight.contains(ticket_id)
    }

    /// The gateway accepted the payment request; settlement is left to polling.
    pub fn confirm_payment(&mut self, ticket_id: &str) {
        self.in_flight.remove(ticket_id);
    }

    /// The payment request failed: Pending → Unpaid.
    pub fn abort_payment(&mut self, ticket_id: &str) {
        self.in_flight.remove(ticket_id);
        if let Ok(ticket) = self.get_mut(ticket_id) {
            if ticket.state == TicketState::Pending {
                ticket.state = TicketState::Unpaid;
            }
        }
    }

    /// Deletion is allowed from any state.
    pub fn remove(&mut self, ticket_id: &str) -> BookingResult<Ticket> {
        let idx = self
            .tickets
            .iter()
            .position(|t| t.ticket_id == ticket_id)
            .ok_or_else(|| BookingError::NotFound(format!("Ticket not found: {}", ticket_id)))?;

        self.in_flight.remove(ticket_id);
        Ok(self.tickets.remove(idx))
    }

    /// Replace the whole collection with a server snapshot and report what moved.
    ///
    /// A ticket whose payment command is still unanswered stays Pending even if
    /// the snapshot predates the command.
    pub fn replace_all(&mut self, fetched: Vec<Ticket>) -> Vec<Transition> {
        let previous: HashMap<String, TicketState> = self
            .tickets
            .iter()
            .map(|t| (t.ticket_id.clone(), t.state))
            .collect();

        let mut fetched = fetched;
        for ticket in fetched.iter_mut() {
            if ticket.state == TicketState::Unpaid && self.in_flight.contains(&ticket.ticket_id) {
                debug!("Keeping {} pending while its payment request is in flight", ticket.ticket_id);
                ticket.state = TicketState::Pending;
            }
        }

        let mut transitions = Vec::new();
        for ticket in &fetched {
            match previous.get(&ticket.ticket_id) {
                None => transitions.push(Transition::Appeared {
                    ticket_id: ticket.ticket_id.clone(),
                    state: ticket.state,
                }),
                Some(&before) => {
                    if before == TicketState::Paid && ticket.state != TicketState::Paid {
                        warn!("Ticket {} went from paid back to {}", ticket.ticket_id, ticket.state);
                    }
                    transitions.extend(Transition::between(&ticket.ticket_id, before, ticket.state));
                }
            }
        }

        let still_present: HashSet<&str> = fetched.iter().map(|t| t.ticket_id.as_str()).collect();
        for ticket in &self.tickets {
            if !still_present.contains(ticket.ticket_id.as_str()) {
                transitions.push(Transition::Vanished {
                    ticket_id: ticket.ticket_id.clone(),
                });
            }
        }

        for t in &transitions {
            match t {
                Transition::Settled { ticket_id } => info!("Payment settled for ticket {}", ticket_id),
                Transition::Reverted { ticket_id } => info!("Payment reverted for ticket {}", ticket_id),
                other => debug!("Ticket change: {:?}", other),
            }
        }

        self.in_flight.retain(|id| still_present.contains(id.as_str()));
        self.tickets = fetched;
        transitions
    }

    fn get_mut(&mut self, ticket_id: &str) -> BookingResult<&mut Ticket> {
        self.tickets
            .iter_mut()
            .find(|t| t.ticket_id == ticket_id)
            .ok_or_else(|| BookingError::NotFound(format!("Ticket not found: {}", ticket_id)))
    }
}
