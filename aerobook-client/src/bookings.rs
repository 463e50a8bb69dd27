use aerobook_catalog::FlightCatalog;
use aerobook_core::{BookingError, BookingGateway, BookingResult, Identity, Ticket};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::state::SharedTickets;

/// Book one seat on `flight_id` for the signed-in user.
///
/// The new ticket starts unpaid. Nothing is recorded locally unless the
/// gateway created the ticket, and failures are never retried here.
pub async fn book<G>(
    gateway: &G,
    catalog: &mut FlightCatalog,
    tickets: &SharedTickets,
    identity: Option<&Identity>,
    flight_id: &str,
    price: Decimal,
) -> BookingResult<Ticket>
where
    G: BookingGateway + ?Sized,
{
    let identity = Identity::require(identity)?;
    catalog.ensure_available(flight_id)?;

    let ticket_id = gateway
        .create_ticket(identity, flight_id, price)
        .await
        .map_err(|e| match e {
            // The seat decrement is what fails server-side when the flight is full
            BookingError::UpstreamFailure { status: Some(400), detail } => {
                BookingError::CapacityExceeded {
                    flight_id: flight_id.to_string(),
                    detail,
                }
            }
            other => other,
        })?;

    // Advisory only; the next catalog load carries the server's count
    match catalog.reserve_seat(flight_id) {
        Ok(remaining) => info!("Booked ticket {} on {} ({} seats left)", ticket_id, flight_id, remaining),
        Err(e) => warn!("Booked ticket {} but could not project seat count: {}", ticket_id, e),
    }

    let ticket = Ticket::new(ticket_id, flight_id, identity.user_id.clone(), price);
    tickets.write().await.insert(ticket.clone());
    Ok(ticket)
}

/// Delete a ticket whatever its payment state.
pub async fn cancel<G>(
    gateway: &G,
    tickets: &SharedTickets,
    identity: Option<&Identity>,
    ticket_id: &str,
) -> BookingResult<()>
where
    G: BookingGateway + ?Sized,
{
    let identity = Identity::require(identity)?;
    gateway.cancel_ticket(identity, ticket_id).await?;

    if tickets.write().await.remove(ticket_id).is_err() {
        // Not in the local view yet; the next refresh agrees with the server anyway
        warn!("Cancelled ticket {} was not in the local view", ticket_id);
    }
    info!("Ticket {} cancelled", ticket_id);
    Ok(())
}
