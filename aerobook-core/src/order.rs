use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::payment::Ticket;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Created,
    #[serde(other)]
    NotCreated,
}

/// Settlement-facing projection of a ticket's commercial outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default)]
    pub user_id: String,
    pub ticket_id: String,
    #[serde(default)]
    pub price: Decimal,
    pub status: OrderStatus,
}

impl Order {
    /// A ticket only turns into a created order once it is paid.
    pub fn from_ticket(ticket: &Ticket) -> Self {
        Self {
            order_id: None,
            user_id: ticket.user_id.clone(),
            ticket_id: ticket.ticket_id.clone(),
            price: ticket.price,
            status: if ticket.paid() {
                OrderStatus::Created
            } else {
                OrderStatus::NotCreated
            },
        }
    }

    pub fn is_created(&self) -> bool {
        self.status == OrderStatus::Created
    }
}

/// Per-user rollup used by the admin console
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserOrderSummary {
    pub user_id: String,
    pub order_count: u32,
    pub total_price: Decimal,
}
