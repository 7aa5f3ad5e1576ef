// storefront/src/repository/mod.rs

//! Persistence seams. Every store implements all three repositories; the
//! rest of the crate only sees `Arc<dyn Store>`.

pub mod memory;
pub mod order_number;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::errors::Result;
use crate::models::{
  Customer, NewAddress, NewLineItem, NewPayment, Order, OrderDetails, OrderStatus, Payment, PaymentMethod,
  ShippingAddress,
};
use crate::services::pricing::PriceBreakdown;
use async_trait::async_trait;
use uuid::Uuid;

/// Everything needed to persist a new order. Amounts come from the pricing
/// calculator and are stored as given.
#[derive(Debug, Clone)]
pub struct OrderDraft {
  pub user_id: Uuid,
  pub address_id: Uuid,
  pub items: Vec<NewLineItem>,
  pub pricing: PriceBreakdown,
  pub payment_method: PaymentMethod,
  pub notes: Option<String>,
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
  /// Stores the header and its items in one unit and assigns the order number.
  async fn create_order(&self, draft: OrderDraft) -> Result<Order>;

  async fn find_order(&self, order_id: Uuid) -> Result<Option<Order>>;

  /// Order with items (checkout order), address, customer and payment.
  async fn find_details(&self, order_id: Uuid) -> Result<Option<OrderDetails>>;

  /// Newest first.
  async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Order>>;

  /// Last writer wins. Transition rules are enforced by the caller.
  async fn update_status(&self, order_id: Uuid, status: OrderStatus) -> Result<Order>;

  /// Marks the payment COMPLETED and moves a CREATED order to PROCESSING in
  /// a single write.
  async fn mark_paid(&self, order_id: Uuid) -> Result<Order>;

  async fn attach_receipt_url(&self, order_id: Uuid, url: &str) -> Result<Order>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
  /// Fails with `Conflict` when the order already has a payment.
  async fn insert_payment(&self, payment: NewPayment) -> Result<Payment>;

  async fn find_payment_for_order(&self, order_id: Uuid) -> Result<Option<Payment>>;
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
  async fn find_customer(&self, customer_id: Uuid) -> Result<Option<Customer>>;

  /// Creates the customer on first sign-in. A later non-empty name replaces the stored one.
  async fn upsert_customer(&self, email: &str, name: Option<&str>) -> Result<Customer>;

  async fn create_address(&self, user_id: Uuid, address: NewAddress) -> Result<ShippingAddress>;

  async fn find_address(&self, address_id: Uuid) -> Result<Option<ShippingAddress>>;
}

pub trait Store: OrderRepository + PaymentRepository + CustomerRepository {}

impl<T> Store for T where T: OrderRepository + PaymentRepository + CustomerRepository {}
