use aerobook_core::{Order, Ticket, UserOrderSummary};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Anything that can be rolled up into a per-user spend report
pub trait Chargeable {
    fn user_id(&self) -> &str;
    fn price(&self) -> Decimal;
}

impl Chargeable for Ticket {
    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn price(&self) -> Decimal {
        self.price
    }
}

impl Chargeable for Order {
    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn price(&self) -> Decimal {
        self.price
    }
}

/// Group records by user, counting them and summing their prices.
///
/// Rows come out sorted by `user_id`, so the result does not depend on the
/// order of the input. Decimal sums are exact.
pub fn aggregate<T: Chargeable>(records: &[T]) -> Vec<UserOrderSummary> {
    let mut per_user: BTreeMap<&str, (u32, Decimal)> = BTreeMap::new();

    for record in records {
        let entry = per_user.entry(record.user_id()).or_insert((0, Decimal::ZERO));
        entry.0 += 1;
        entry.1 += record.price();
    }

    per_user
        .into_iter()
        .map(|(user_id, (order_count, total_price))| UserOrderSummary {
            user_id: user_id.to_string(),
            order_count,
            total_price,
        })
        .collect()
}

/// Order view of every ticket, in ticket order
pub fn derive_orders(tickets: &[Ticket]) -> Vec<Order> {
    tickets.iter().map(Order::from_ticket).collect()
}

pub fn grand_total(summaries: &[UserOrderSummary]) -> Decimal {
    summaries.iter().map(|s| s.total_price).sum()
}
