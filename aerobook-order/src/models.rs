use aerobook_core::TicketState;

/// Change in a ticket observed when the local view is replaced by a fresh fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// pending -> paid
    Settled { ticket_id: String },
    /// pending -> unpaid: settlement rejected, payment may be retried
    Reverted { ticket_id: String },
    Appeared { ticket_id: String, state: TicketState },
    Vanished { ticket_id: String },
    /// Anything else, e.g. a payment started from another device
    Changed {
        ticket_id: String,
        from: TicketState,
        to: TicketState,
    },
}

impl Transition {
    pub fn ticket_id(&self) -> &str {
        match self {
            Self::Settled { ticket_id }
            | Self::Reverted { ticket_id }
            | Self::Appeared { ticket_id, .. }
            | Self::Vanished { ticket_id }
            | Self::Changed { ticket_id, .. } => ticket_id,
        }
    }

    pub(crate) fn between(ticket_id: &str, from: TicketState, to: TicketState) -> Option<Self> {
        let ticket_id = ticket_id.to_string();
        match (from, to) {
            (a, b) if a == b => None,
            (TicketState::Pending, TicketState::Paid) => Some(Self::Settled { ticket_id }),
            (TicketState::Pending, TicketState::Unpaid) => Some(Self::Reverted { ticket_id }),
            (from, to) => Some(Self::Changed { ticket_id, from, to }),
        }
    }
}
