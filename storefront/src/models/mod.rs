// storefront/src/models/mod.rs

//! Data structures persisted by the order pipeline.

pub mod address;
pub mod order;
pub mod order_item;
pub mod payment;
pub mod user;

pub use address::{NewAddress, ShippingAddress};
pub use order::{Order, OrderDetails, OrderStatus, PaymentMethod, PaymentStatus};
pub use order_item::{NewLineItem, OrderLineItem};
pub use payment::{NewPayment, Payment};
pub use user::Customer;
