use aerobook_core::{
    BookingError, BookingGateway, BookingResult, City, DictionaryGateway, Flight, Identity, Order,
    Ticket,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use crate::app_config::GatewayConfig;

#[derive(Debug, Deserialize)]
struct CreatedTicket {
    ticket_id: String,
}

/// Error envelope of the gateway. `detail` is usually a string but the
/// dictionaries service sometimes nests a whole JSON body in it.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// Talks to the API gateway over HTTP.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(config: &GatewayConfig) -> BookingResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| BookingError::upstream(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client, &config.base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// URL from path segments; each segment is percent-encoded.
    fn segments_url(&self, segments: &[&str]) -> BookingResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| BookingError::upstream(format!("Invalid gateway url {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| BookingError::upstream(format!("Gateway url cannot have a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> BookingResult<Response> {
        let response = request
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| BookingError::upstream(format!("Error connecting to gateway: {}", e)))?;

        let status = response.status();
        debug!("{} {}", status.as_u16(), response.url().path());
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(error_from_response(status, &body))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> BookingResult<T> {
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| BookingError::upstream(format!("Unexpected gateway response: {}", e)))
    }
}

fn error_from_response(status: StatusCode, body: &str) -> BookingError {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .map(|d| match d {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        });

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BookingError::Unauthorized(detail),
        StatusCode::NOT_FOUND => BookingError::NotFound(detail),
        _ => BookingError::UpstreamFailure {
            status: Some(status.as_u16()),
            detail,
        },
    }
}

#[async_trait]
impl BookingGateway for HttpGateway {
    async fn create_ticket(
        &self,
        identity: &Identity,
        flight_id: &str,
        price: Decimal,
    ) -> BookingResult<String> {
        let request = self
            .client
            .post(self.url("/booking/tickets"))
            .header(reqwest::header::AUTHORIZATION, identity.bearer())
            .query(&[("flight_id", flight_id.to_string()), ("price", price.to_string())]);

        let created: CreatedTicket = self.send_json(request).await?;
        info!("Ticket {} created on flight {}", created.ticket_id, flight_id);
        Ok(created.ticket_id)
    }

    async fn list_tickets(&self, identity: &Identity) -> BookingResult<Vec<Ticket>> {
        let request = self
            .client
            .get(self.url("/booking/tickets"))
            .header(reqwest::header::AUTHORIZATION, identity.bearer());
        self.send_json(request).await
    }

    async fn pay_ticket(&self, identity: &Identity, ticket_id: &str) -> BookingResult<()> {
        let request = self
            .client
            .patch(self.segments_url(&["booking", "tickets", ticket_id, "pay"])?)
            .header(reqwest::header::AUTHORIZATION, identity.bearer());
        self.send(request).await?;
        Ok(())
    }

    async fn cancel_ticket(&self, identity: &Identity, ticket_id: &str) -> BookingResult<()> {
        let request = self
            .client
            .delete(self.segments_url(&["booking", "tickets", ticket_id])?)
            .header(reqwest::header::AUTHORIZATION, identity.bearer());
        self.send(request).await?;
        Ok(())
    }

    async fn list_orders(&self, identity: &Identity) -> BookingResult<Vec<Order>> {
        let request = self
            .client
            .get(self.url("/orders"))
            .header(reqwest::header::AUTHORIZATION, identity.bearer());
        self.send_json(request).await
    }

    async fn list_all_orders(&self, identity: &Identity) -> BookingResult<Vec<Order>> {
        let request = self
            .client
            .get(self.url("/admin/orders/"))
            .header(reqwest::header::AUTHORIZATION, identity.bearer());
        self.send_json(request).await
    }
}

#[async_trait]
impl DictionaryGateway for HttpGateway {
    async fn list_flights(&self, identity: Option<&Identity>) -> BookingResult<Vec<Flight>> {
        let mut request = self.client.get(self.url("/dictionaries/flights"));
        if let Some(id) = identity {
            request = request.header(reqwest::header::AUTHORIZATION, id.bearer());
        }
        self.send_json(request).await
    }

    async fn list_cities(&self, identity: Option<&Identity>) -> BookingResult<Vec<City>> {
        let mut request = self.client.get(self.url("/dictionaries/cities"));
        if let Some(id) = identity {
            request = request.header(reqwest::header::AUTHORIZATION, id.bearer());
        }
        self.send_json(request).await
    }

    async fn add_flight(&self, identity: &Identity, flight: &Flight) -> BookingResult<Flight> {
        let request = self
            .client
            .post(self.url("/dictionaries/flights"))
            .header(reqwest::header::AUTHORIZATION, identity.bearer())
            .json(flight);
        self.send_json(request).await
    }

    async fn delete_flight(&self, identity: &Identity, flight_id: &str) -> BookingResult<()> {
        let request = self
            .client
            .delete(self.url("/dictionaries/flight"))
            .header(reqwest::header::AUTHORIZATION, identity.bearer())
            .query(&[("flight_id", flight_id)]);
        self.send(request).await?;
        Ok(())
    }

    async fn add_city(&self, identity: &Identity, city: &City) -> BookingResult<City> {
        let request = self
            .client
            .post(self.url("/dictionaries/cities"))
            .header(reqwest::header::AUTHORIZATION, identity.bearer())
            .json(city);
        self.send_json(request).await
    }

    async fn delete_city(&self, identity: &Identity, name: &str) -> BookingResult<()> {
        let request = self
            .client
            .delete(self.url("/dictionaries/city"))
            .header(reqwest::header::AUTHORIZATION, identity.bearer())
            .query(&[("city_name", name)]);
        self.send(request).await?;
        Ok(())
    }
}
