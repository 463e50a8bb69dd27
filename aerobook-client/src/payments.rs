use aerobook_core::{BookingError, BookingGateway, BookingResult, Identity};
use tracing::{info, warn};

use crate::state::SharedTickets;

/// Rolls the optimistic Pending back if `pay` is dropped before the gateway
/// answer has been recorded.
struct PaymentGuard {
    tickets: SharedTickets,
    ticket_id: String,
    armed: bool,
}

impl PaymentGuard {
    fn new(tickets: &SharedTickets, ticket_id: &str) -> Self {
        Self {
            tickets: tickets.clone(),
            ticket_id: ticket_id.to_string(),
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PaymentGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!("Payment request for ticket {} abandoned", self.ticket_id);

        if let Ok(mut book) = self.tickets.try_write() {
            book.abort_payment(&self.ticket_id);
            return;
        }
        // Lock is busy; finish the rollback on the runtime
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let tickets = self.tickets.clone();
            let ticket_id = std::mem::take(&mut self.ticket_id);
            handle.spawn(async move {
                tickets.write().await.abort_payment(&ticket_id);
            });
        }
    }
}

/// Ask the gateway to charge a ticket.
///
/// The ticket moves to pending before the command is sent and stays there on
/// success; settlement is observed later by a refresh. On failure, or when
/// the call is abandoned, it goes back to unpaid so the user can retry.
pub async fn pay<G>(
    gateway: &G,
    tickets: &SharedTickets,
    identity: Option<&Identity>,
    ticket_id: &str,
) -> BookingResult<()>
where
    G: BookingGateway + ?Sized,
{
    let identity = Identity::require(identity)?;
    tickets.write().await.begin_payment(ticket_id)?;
    let guard = PaymentGuard::new(tickets, ticket_id);

    match gateway.pay_ticket(identity, ticket_id).await {
        Ok(()) => {
            tickets.write().await.confirm_payment(ticket_id);
            guard.disarm();
            info!("Payment requested for ticket {}", ticket_id);
            Ok(())
        }
        Err(e) => {
            tickets.write().await.abort_payment(ticket_id);
            guard.disarm();
            warn!("Payment request for ticket {} failed: {}", ticket_id, e);
            Err(match e {
                BookingError::UpstreamFailure { status: Some(400), detail } => {
                    BookingError::PaymentRejected(detail)
                }
                other => other,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::shared_tickets;
    use crate::testing::{passenger, FakeGateway};
    use aerobook_core::{Ticket, TicketState};
    use rust_decimal::Decimal;
    use std::time::Duration;

    async fn seeded(gateway: &FakeGateway, state: TicketState) -> SharedTickets {
        let ticket = Ticket::new("T1", "FL7", "u1", Decimal::from(5000)).with_state(state);
        gateway.seed_ticket(ticket.clone());
        let tickets = shared_tickets();
        tickets.write().await.insert(ticket);
        tickets
    }

    #[tokio::test]
    async fn test_pay_moves_to_pending_then_poll_settles() {
        let gateway = FakeGateway::default();
        let tickets = seeded(&gateway, TicketState::Unpaid).await;
        let id = passenger("u1");

        pay(&gateway, &tickets, Some(&id), "T1").await.unwrap();
        assert_eq!(tickets.read().await.get("T1").unwrap().state, TicketState::Pending);
        assert_eq!(gateway.pay_calls(), 1);

        gateway.set_state("T1", TicketState::Paid);
        let fetched = gateway.list_tickets(&id).await.unwrap();
        tickets.write().await.replace_all(fetched);
        assert_eq!(tickets.read().await.get("T1").unwrap().state, TicketState::Paid);
    }

    #[tokio::test]
    async fn test_pay_twice_is_already_pending() {
        let gateway = FakeGateway::default();
        let tickets = seeded(&gateway, TicketState::Unpaid).await;
        let id = passenger("u1");

        pay(&gateway, &tickets, Some(&id), "T1").await.unwrap();
        let err = pay(&gateway, &tickets, Some(&id), "T1").await.unwrap_err();

        assert_eq!(err, BookingError::AlreadyPending("T1".to_string()));
        assert_eq!(tickets.read().await.get("T1").unwrap().state, TicketState::Pending);
        // no duplicate charge
        assert_eq!(gateway.pay_calls(), 1);
    }

    #[tokio::test]
    async fn test_rejected_payment_leaves_ticket_unpaid() {
        let gateway = FakeGateway::default();
        let tickets = seeded(&gateway, TicketState::Unpaid).await;
        gateway.reject_next_payment("Kafka unavailable");

        let err = pay(&gateway, &tickets, Some(&passenger("u1")), "T1").await.unwrap_err();

        assert_eq!(err, BookingError::PaymentRejected("Kafka unavailable".to_string()));
        assert_eq!(tickets.read().await.get("T1").unwrap().state, TicketState::Unpaid);
    }

    #[tokio::test]
    async fn test_upstream_failure_leaves_ticket_unpaid() {
        let gateway = FakeGateway::default();
        let tickets = seeded(&gateway, TicketState::Unpaid).await;
        gateway.fail_next("gateway timeout");

        let err = pay(&gateway, &tickets, Some(&passenger("u1")), "T1").await.unwrap_err();

        assert!(matches!(err, BookingError::UpstreamFailure { .. }));
        assert_eq!(tickets.read().await.get("T1").unwrap().state, TicketState::Unpaid);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_payment_can_be_retried() {
        let gateway = FakeGateway::default();
        let tickets = seeded(&gateway, TicketState::Unpaid).await;
        let id = passenger("u1");
        gateway.stall_payments(true);

        let outcome = tokio::time::timeout(Duration::from_secs(1), pay(&gateway, &tickets, Some(&id), "T1")).await;
        assert!(outcome.is_err());
        assert_eq!(tickets.read().await.get("T1").unwrap().state, TicketState::Unpaid);
        assert!(!tickets.read().await.is_in_flight("T1"));

        let unpaid = Ticket::new("T1", "FL7", "u1", Decimal::from(5000));
        for _ in 0..5 {
            tickets.write().await.replace_all(vec![unpaid.clone()]);
        }
        assert_eq!(tickets.read().await.get("T1").unwrap().state, TicketState::Unpaid);

        gateway.stall_payments(false);
        pay(&gateway, &tickets, Some(&id), "T1").await.unwrap();
        assert_eq!(tickets.read().await.get("T1").unwrap().state, TicketState::Pending);
        assert_eq!(gateway.pay_calls(), 2);
    }

    #[tokio::test]
    async fn test_pay_without_identity() {
        let gateway = FakeGateway::default();
        let tickets = seeded(&gateway, TicketState::Unpaid).await;

        let err = pay(&gateway, &tickets, None, "T1").await.unwrap_err();
        assert!(matches!(err, BookingError::Unauthorized(_)));
        assert_eq!(tickets.read().await.get("T1").unwrap().state, TicketState::Unpaid);
        assert_eq!(gateway.pay_calls(), 0);
    }
}
