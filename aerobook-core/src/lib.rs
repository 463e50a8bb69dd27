pub mod search;
pub mod repository;
pub mod identity;
pub mod payment;
pub mod order;

pub use identity::{Identity, Role};
pub use order::{Order, OrderStatus, UserOrderSummary};
pub use payment::{Ticket, TicketState};
pub use repository::{BookingGateway, DictionaryGateway};
pub use search::{City, Flight, FlightQuery};

/// Every failure the booking core can report to its caller.
///
/// All variants are recoverable at the operation boundary; the user may retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("No seats left on flight {flight_id}: {detail}")]
    CapacityExceeded {
        flight_id: String,
        detail: String,
    },
    #[error("Payment already pending for ticket {0}")]
    AlreadyPending(String),
    #[error("Payment rejected: {0}")]
    PaymentRejected(String),
    #[error("Upstream failure: {detail}")]
    UpstreamFailure {
        status: Option<u16>,
        detail: String,
    },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition {
        from: String,
        to: String,
    },
}

impl BookingError {
    pub fn upstream(detail: impl Into<String>) -> Self {
        Self::UpstreamFailure { status: None, detail: detail.into() }
    }

    /// HTTP status reported by the gateway, if the failure came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UpstreamFailure { status, .. } => *status,
            _ => None,
        }
    }

    /// The message shown to the user. Server details pass through verbatim.
    pub fn detail(&self) -> String {
        match self {
            Self::Unauthorized(detail)
            | Self::PaymentRejected(detail)
            | Self::NotFound(detail)
            | Self::Validation(detail) => detail.clone(),
            Self::CapacityExceeded { detail, .. } | Self::UpstreamFailure { detail, .. } => {
                detail.clone()
            }
            other => other.to_string(),
        }
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
