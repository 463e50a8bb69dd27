use aerobook_core::{BookingGateway, BookingResult, Identity, Order, UserOrderSummary};
use aerobook_order::{aggregate, grand_total};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

/// Admin view: orders of every user rolled up per user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderReport {
    pub rows: Vec<UserOrderSummary>,
    pub total_orders: usize,
    pub total_price: Decimal,
}

impl OrderReport {
    pub fn from_orders(orders: &[Order]) -> Self {
        let rows = aggregate(orders);
        let total_price = grand_total(&rows);
        Self {
            rows,
            total_orders: orders.len(),
            total_price,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Order history of the signed-in user
pub async fn order_history<G>(gateway: &G, identity: Option<&Identity>) -> BookingResult<Vec<Order>>
where
    G: BookingGateway + ?Sized,
{
    let identity = Identity::require(identity)?;
    gateway.list_orders(identity).await
}

pub async fn order_report<G>(gateway: &G, identity: Option<&Identity>) -> BookingResult<OrderReport>
where
    G: BookingGateway + ?Sized,
{
    let identity = Identity::require_admin(identity)?;
    let orders = gateway.list_all_orders(identity).await?;
    let report = OrderReport::from_orders(&orders);
    info!(
        "Order report: {} users, {} orders, total {}",
        report.rows.len(),
        report.total_orders,
        report.total_price
    );
    Ok(report)
}
