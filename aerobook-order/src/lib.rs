pub mod models;
pub mod manager;
pub mod finance;

pub use models::Transition;
pub use manager::TicketBook;
pub use finance::{aggregate, derive_orders, grand_total, Chargeable};
