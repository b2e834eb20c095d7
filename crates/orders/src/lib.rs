//! `shopcore-orders`: the Order aggregate.
//!
//! Orders reference catalog products by id but never reach back into the
//! catalog; line items snapshot the name and unit price at placement time.

pub mod order;

pub use order::{
    LineItem, Order, OrderCommand, OrderEvent, OrderId, OrderPlaced, OrderStatus, PaymentStatus,
    PlaceOrder,
};
