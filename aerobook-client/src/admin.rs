use aerobook_catalog::FlightCatalog;
use aerobook_core::{BookingError, BookingResult, City, DictionaryGateway, Flight, Identity};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

/// New flight as entered in the admin console; the id is allocated here.
#[derive(Debug, Clone, Deserialize)]
pub struct FlightDraft {
    pub origin: String,
    pub destination: String,
    pub date: Option<NaiveDate>,
    pub price: Decimal,
    #[serde(default)]
    pub seat_count: u32,
}

impl FlightDraft {
    fn validate(&self) -> BookingResult<NaiveDate> {
        let date = self.date.ok_or_else(|| BookingError::Validation("Flight date is required".to_string()))?;

        if self.origin.trim().is_empty() || self.destination.trim().is_empty() {
            return Err(BookingError::Validation("Origin and destination are required".to_string()));
        }
        if self.price <= Decimal::ZERO {
            return Err(BookingError::Validation("Price must be positive".to_string()));
        }
        Ok(date)
    }
}

/// Publish a new flight under the next free `FL<n>` id
pub async fn add_flight<G>(
    gateway: &G,
    catalog: &mut FlightCatalog,
    identity: Option<&Identity>,
    draft: FlightDraft,
) -> BookingResult<Flight>
where
    G: DictionaryGateway + ?Sized,
{
    let identity = Identity::require_admin(identity)?;
    let date = draft.validate()?;
    let flight_id = catalog.next_flight_id()?;

    let flight = Flight {
        flight_id,
        origin: draft.origin.trim().to_string(),
        destination: draft.destination.trim().to_string(),
        date,
        price: draft.price,
        seat_count: draft.seat_count,
    };

    let created = gateway.add_flight(identity, &flight).await?;
    info!("Flight {} added", created.flight_id);
    catalog.upsert(created.clone());
    Ok(created)
}

pub async fn delete_flight<G>(
    gateway: &G,
    catalog: &mut FlightCatalog,
    identity: Option<&Identity>,
    flight_id: &str,
) -> BookingResult<()>
where
    G: DictionaryGateway + ?Sized,
{
    let identity = Identity::require_admin(identity)?;
    gateway.delete_flight(identity, flight_id).await?;
    catalog.remove(flight_id);
    info!("Flight {} deleted", flight_id);
    Ok(())
}

pub async fn add_city<G>(
    gateway: &G,
    cities: &mut Vec<City>,
    identity: Option<&Identity>,
    name: &str,
) -> BookingResult<City>
where
    G: DictionaryGateway + ?Sized,
{
    let identity = Identity::require_admin(identity)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(BookingError::Validation("City name is required".to_string()));
    }

    let city = gateway.add_city(identity, &City { name: name.to_string() }).await?;
    info!("City {} added", city.name);
    cities.push(city.clone());
    Ok(city)
}

pub async fn delete_city<G>(
    gateway: &G,
    cities: &mut Vec<City>,
    identity: Option<&Identity>,
    name: &str,
) -> BookingResult<()>
where
    G: DictionaryGateway + ?Sized,
{
    let identity = Identity::require_admin(identity)?;
    gateway.delete_city(identity, name).await?;
    cities.retain(|c| c.name != name);
    info!("City {} deleted", name);
    Ok(())
}
