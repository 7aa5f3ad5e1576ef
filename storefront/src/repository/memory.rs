// storefront/src/repository/memory.rs

//! Process-local store used by tests and by servers started without a
//! database. One lock guards every table so multi-table writes are atomic.

use super::order_number::generate_order_number;
use super::{CustomerRepository, OrderDraft, OrderRepository, PaymentRepository};
use crate::errors::{AppError, Result};
use crate::models::{
  Customer, NewAddress, NewPayment, Order, OrderDetails, OrderLineItem, OrderStatus, Payment, PaymentStatus,
  ShippingAddress,
};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

#[derive(Default)]
struct Tables {
  orders: HashMap<Uuid, Order>,
  order_numbers: HashSet<String>,
  items: HashMap<Uuid, Vec<OrderLineItem>>,
  payments: HashMap<Uuid, Payment>,
  customers: HashMap<Uuid, Customer>,
  addresses: HashMap<Uuid, ShippingAddress>,
}

#[derive(Default)]
pub struct MemoryStore {
  tables: RwLock<Tables>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Drops an order and, like the database cascade, its line items.
  pub fn delete_order(&self, order_id: Uuid) -> bool {
    let mut tables = self.tables.write();
    tables.items.remove(&order_id);
    tables.payments.remove(&order_id);
    match tables.orders.remove(&order_id) {
      Some(order) => {
        tables.order_numbers.remove(&order.order_number);
        true
      }
      None => false,
    }
  }

  pub fn item_count(&self, order_id: Uuid) -> usize {
    self.tables.read().items.get(&order_id).map_or(0, Vec::len)
  }

  fn modify_order(&self, order_id: Uuid, f: impl FnOnce(&mut Order)) -> Result<Order> {
    let mut tables = self.tables.write();
    let order = tables
      .orders
      .get_mut(&order_id)
      .ok_or_else(|| AppError::not_found("Order", order_id))?;
    f(order);
    order.updated_at = Utc::now();
    Ok(order.clone())
  }
}

#[async_trait]
impl OrderRepository for MemoryStore {
  async fn create_order(&self, draft: OrderDraft) -> Result<Order> {
    let now = Utc::now();
    let order_id = Uuid::new_v4();
    let mut tables = self.tables.write();

    let mut order_number = generate_order_number();
    while tables.order_numbers.contains(&order_number) {
      order_number = generate_order_number();
    }

    let order = Order {
      id: order_id,
      order_number: order_number.clone(),
      user_id: draft.user_id,
      address_id: draft.address_id,
      subtotal: draft.pricing.subtotal,
      tax: draft.pricing.tax,
      shipping_cost: draft.pricing.shipping,
      total: draft.pricing.total,
      payment_method: draft.payment_method,
      status: OrderStatus::Created,
      payment_status: PaymentStatus::Pending,
      receipt_url: None,
      notes: draft.notes,
      created_at: now,
      updated_at: now,
    };
    let items = draft
      .items
      .into_iter()
      .enumerate()
      .map(|(position, item)| OrderLineItem {
        id: Uuid::new_v4(),
        order_id,
        product_id: item.product_id,
        position: position as i32,
        name: item.name,
        unit_price: item.price,
        quantity: item.quantity,
        size: item.size,
        color: item.color,
      })
      .collect();

    tables.order_numbers.insert(order_number);
    tables.items.insert(order_id, items);
    tables.orders.insert(order_id, order.clone());
    Ok(order)
  }

  async fn find_order(&self, order_id: Uuid) -> Result<Option<Order>> {
    Ok(self.tables.read().orders.get(&order_id).cloned())
  }

  async fn find_details(&self, order_id: Uuid) -> Result<Option<OrderDetails>> {
    let tables = self.tables.read();
    let Some(order) = tables.orders.get(&order_id).cloned() else {
      return Ok(None);
    };
    let address = tables
      .addresses
      .get(&order.address_id)
      .cloned()
      .ok_or_else(|| AppError::Internal(format!("Order {} references a missing address", order.order_number)))?;
    let customer = tables
      .customers
      .get(&order.user_id)
      .cloned()
      .ok_or_else(|| AppError::Internal(format!("Order {} references a missing customer", order.order_number)))?;
    let mut items = tables.items.get(&order_id).cloned().unwrap_or_default();
    items.sort_by_key(|item| item.position);

    Ok(Some(OrderDetails {
      order,
      items,
      address,
      customer,
      payment: tables.payments.get(&order_id).cloned(),
    }))
  }

  async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Order>> {
    let tables = self.tables.read();
    let mut orders: Vec<Order> = tables.orders.values().filter(|o| o.user_id == user_id).cloned().collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.order_number.cmp(&a.order_number)));
    Ok(orders)
  }

  async fn update_status(&self, order_id: Uuid, status: OrderStatus) -> Result<Order> {
    self.modify_order(order_id, |order| order.status = status)
  }

  async fn mark_paid(&self, order_id: Uuid) -> Result<Order> {
    self.modify_order(order_id, |order| {
      order.payment_status = PaymentStatus::Completed;
      if order.status == OrderStatus::Created {
        order.status = OrderStatus::Processing;
      }
    })
  }

  async fn attach_receipt_url(&self, order_id: Uuid, url: &str) -> Result<Order> {
    self.modify_order(order_id, |order| order.receipt_url = Some(url.to_string()))
  }
}

#[async_trait]
impl PaymentRepository for MemoryStore {
  async fn insert_payment(&self, payment: NewPayment) -> Result<Payment> {
    let mut tables = self.tables.write();
    if !tables.orders.contains_key(&payment.order_id) {
      return Err(AppError::not_found("Order", payment.order_id));
    }
    if tables.payments.contains_key(&payment.order_id) {
      return Err(AppError::Conflict(format!(
        "Order {} already has a payment",
        payment.order_id
      )));
    }
    let duplicate_reference = tables.payments.values().any(|p| {
      p.transaction_id == payment.transaction_id || p.provider_receipt_code == payment.provider_receipt_code
    });
    if duplicate_reference {
      return Err(AppError::Conflict("Payment reference already in use".to_string()));
    }

    let stored = Payment {
      id: Uuid::new_v4(),
      order_id: payment.order_id,
      transaction_id: payment.transaction_id,
      provider_receipt_code: payment.provider_receipt_code,
      phone_number: payment.phone_number,
      amount: payment.amount,
      status: payment.status,
      method: payment.method,
      metadata: payment.metadata,
      created_at: Utc::now(),
    };
    tables.payments.insert(stored.order_id, stored.clone());
    Ok(stored)
  }

  async fn find_payment_for_order(&self, order_id: Uuid) -> Result<Option<Payment>> {
    Ok(self.tables.read().payments.get(&order_id).cloned())
  }
}

#[async_trait]
impl CustomerRepository for MemoryStore {
  async fn find_customer(&self, customer_id: Uuid) -> Result<Option<Customer>> {
    Ok(self.tables.read().customers.get(&customer_id).cloned())
  }

  async fn upsert_customer(&self, email: &str, name: Option<&str>) -> Result<Customer> {
    let name = name.map(str::trim).filter(|n| !n.is_empty());
    let mut tables = self.tables.write();
    if let Some(existing) = tables.customers.values_mut().find(|c| c.email == email) {
      if let Some(name) = name {
        existing.name = Some(name.to_string());
      }
      return Ok(existing.clone());
    }
    let customer = Customer {
      id: Uuid::new_v4(),
      email: email.to_string(),
      name: name.map(str::to_string),
      created_at: Utc::now(),
    };
    tables.customers.insert(customer.id, customer.clone());
    Ok(customer)
  }

  async fn create_address(&self, user_id: Uuid, address: NewAddress) -> Result<ShippingAddress> {
    let mut tables = self.tables.write();
    if !tables.customers.contains_key(&user_id) {
      return Err(AppError::not_found("Customer", user_id));
    }
    let stored = ShippingAddress {
      id: Uuid::new_v4(),
      user_id,
      recipient_name: address.recipient_name,
      phone: address.phone,
      line1: address.line1,
      line2: address.line2,
      city: address.city,
      region: address.region,
      postal_code: address.postal_code,
      created_at: Utc::now(),
    };
    tables.addresses.insert(stored.id, stored.clone());
    Ok(stored)
  }

  async fn find_address(&self, address_id: Uuid) -> Result<Option<ShippingAddress>> {
    Ok(self.tables.read().addresses.get(&address_id).cloned())
  }
}
