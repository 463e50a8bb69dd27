use aerobook_order::{TicketBook, Transition};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// Ticket view shared by user commands and the poller.
/// Never hold the lock across a gateway call.
pub type SharedTickets = Arc<RwLock<TicketBook>>;

pub fn shared_tickets() -> SharedTickets {
    Arc::new(RwLock::new(TicketBook::new()))
}

/// Fan-out of observed ticket transitions to whoever renders them
pub type TransitionSender = broadcast::Sender<Transition>;

pub fn transition_channel() -> TransitionSender {
    let (tx, _) = broadcast::channel(100);
    tx
}
