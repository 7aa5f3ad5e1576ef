// storefront/src/repository/postgres.rs

use super::order_number::generate_order_number;
use super::{CustomerRepository, OrderDraft, OrderRepository, PaymentRepository};
use crate::errors::{AppError, Result};
use crate::models::{
  Customer, NewAddress, NewPayment, Order, OrderDetails, OrderLineItem, OrderStatus, Payment, PaymentStatus,
  ShippingAddress,
};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{instrument, warn};
use uuid::Uuid;

/// Attempts at finding a free order number before giving up.
const ORDER_NUMBER_ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  /// Connects and applies pending migrations.
  pub async fn connect(database_url: &str) -> Result<Self> {
    let pool = PgPoolOptions::new().max_connections(10).connect(database_url).await?;
    sqlx::migrate!("./migrations")
      .run(&pool)
      .await
      .map_err(|e| AppError::Config(format!("Database migration failed: {}", e)))?;
    Ok(Self { pool })
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }

  async fn insert_order(&self, order_id: Uuid, order_number: &str, draft: &OrderDraft) -> Result<Order> {
    let mut tx = self.pool.begin().await?;

    let order = sqlx::query_as::<_, Order>(
      r#"
      INSERT INTO orders (id, order_number, user_id, address_id, subtotal, tax, shipping_cost, total,
                          payment_method, status, payment_status, notes)
      VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
      RETURNING *
      "#,
    )
    .bind(order_id)
    .bind(order_number)
    .bind(draft.user_id)
    .bind(draft.address_id)
    .bind(draft.pricing.subtotal)
    .bind(draft.pricing.tax)
    .bind(draft.pricing.shipping)
    .bind(draft.pricing.total)
    .bind(draft.payment_method)
    .bind(OrderStatus::Created)
    .bind(PaymentStatus::Pending)
    .bind(draft.notes.as_deref())
    .fetch_one(&mut *tx)
    .await?;

    for (position, item) in draft.items.iter().enumerate() {
      sqlx::query(
        r#"
        INSERT INTO order_items (id, order_id, product_id, position, name, unit_price, quantity, size, color)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
      )
      .bind(Uuid::new_v4())
      .bind(order_id)
      .bind(item.product_id)
      .bind(position as i32)
      .bind(&item.name)
      .bind(item.price)
      .bind(item.quantity)
      .bind(item.size.as_deref())
      .bind(item.color.as_deref())
      .execute(&mut *tx)
      .await?;
    }

    tx.commit().await?;
    Ok(order)
  }
}

fn is_unique_violation(err: &AppError, constraint: &str) -> bool {
  match err {
    AppError::Sqlx(sqlx::Error::Database(db_err)) => {
      db_err.is_unique_violation() && db_err.constraint().is_some_and(|c| c.contains(constraint))
    }
    _ => false,
  }
}

#[async_trait]
impl OrderRepository for PgStore {
  #[instrument(name = "pg::create_order", skip(self, draft), fields(user_id = %draft.user_id), err(Display))]
  async fn create_order(&self, draft: OrderDraft) -> Result<Order> {
    let order_id = Uuid::new_v4();
    let mut attempt = 1;
    loop {
      let order_number = generate_order_number();
      match self.insert_order(order_id, &order_number, &draft).await {
        Err(err) if attempt < ORDER_NUMBER_ATTEMPTS && is_unique_violation(&err, "order_number") => {
          warn!(%order_number, attempt, "Order number collision, retrying.");
          attempt += 1;
        }
        other => return other,
      }
    }
  }

  async fn find_order(&self, order_id: Uuid) -> Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
      .bind(order_id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(order)
  }

  #[instrument(name = "pg::find_details", skip(self), err(Display))]
  async fn find_details(&self, order_id: Uuid) -> Result<Option<OrderDetails>> {
    let Some(order) = self.find_order(order_id).await? else {
      return Ok(None);
    };

    let items = sqlx::query_as::<_, OrderLineItem>("SELECT * FROM order_items WHERE order_id = $1 ORDER BY position")
      .bind(order_id)
      .fetch_all(&self.pool)
      .await?;
    let address = sqlx::query_as::<_, ShippingAddress>("SELECT * FROM addresses WHERE id = $1")
      .bind(order.address_id)
      .fetch_one(&self.pool)
      .await?;
    let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
      .bind(order.user_id)
      .fetch_one(&self.pool)
      .await?;
    let payment = self.find_payment_for_order(order_id).await?;

    Ok(Some(OrderDetails {
      order,
      items,
      address,
      customer,
      payment,
    }))
  }

  async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Order>> {
    let orders = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC")
      .bind(user_id)
      .fetch_all(&self.pool)
      .await?;
    Ok(orders)
  }

  async fn update_status(&self, order_id: Uuid, status: OrderStatus) -> Result<Order> {
    sqlx::query_as::<_, Order>("UPDATE orders SET status = $2, updated_at = now() WHERE id = $1 RETURNING *")
      .bind(order_id)
      .bind(status)
      .fetch_optional(&self.pool)
      .await?
      .ok_or_else(|| AppError::not_found("Order", order_id))
  }

  async fn mark_paid(&self, order_id: Uuid) -> Result<Order> {
    sqlx::query_as::<_, Order>(
      r#"
      UPDATE orders
      SET payment_status = 'COMPLETED',
          status = CASE WHEN status = 'CREATED' THEN 'PROCESSING'::order_status ELSE status END,
          updated_at = now()
      WHERE id = $1
      RETURNING *
      "#,
    )
    .bind(order_id)
    .fetch_optional(&self.pool)
    .await?
    .ok_or_else(|| AppError::not_found("Order", order_id))
  }

  async fn attach_receipt_url(&self, order_id: Uuid, url: &str) -> Result<Order> {
    sqlx::query_as::<_, Order>("UPDATE orders SET receipt_url = $2, updated_at = now() WHERE id = $1 RETURNING *")
      .bind(order_id)
      .bind(url)
      .fetch_optional(&self.pool)
      .await?
      .ok_or_else(|| AppError::not_found("Order", order_id))
  }
}

#[async_trait]
impl PaymentRepository for PgStore {
  async fn insert_payment(&self, payment: NewPayment) -> Result<Payment> {
    let result = sqlx::query_as::<_, Payment>(
      r#"
      INSERT INTO payments (id, order_id, transaction_id, provider_receipt_code, phone_number, amount, status,
                            method, metadata)
      VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
      RETURNING *
      "#,
    )
    .bind(Uuid::new_v4())
    .bind(payment.order_id)
    .bind(&payment.transaction_id)
    .bind(&payment.provider_receipt_code)
    .bind(&payment.phone_number)
    .bind(payment.amount)
    .bind(payment.status)
    .bind(payment.method)
    .bind(&payment.metadata)
    .fetch_one(&self.pool)
    .await;

    match result {
      Ok(stored) => Ok(stored),
      Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(AppError::Conflict(format!(
        "Order {} already has a payment or the payment reference is taken",
        payment.order_id
      ))),
      Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
        Err(AppError::not_found("Order", payment.order_id))
      }
      Err(other) => Err(other.into()),
    }
  }

  async fn find_payment_for_order(&self, order_id: Uuid) -> Result<Option<Payment>> {
    let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE order_id = $1")
      .bind(order_id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(payment)
  }
}

#[async_trait]
impl CustomerRepository for PgStore {
  async fn find_customer(&self, customer_id: Uuid) -> Result<Option<Customer>> {
    let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
      .bind(customer_id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(customer)
  }

  async fn upsert_customer(&self, email: &str, name: Option<&str>) -> Result<Customer> {
    let name = name.map(str::trim).filter(|n| !n.is_empty());
    let customer = sqlx::query_as::<_, Customer>(
      r#"
      INSERT INTO customers (id, email, name)
      VALUES ($1, $2, $3)
      ON CONFLICT (email) DO UPDATE SET name = COALESCE(EXCLUDED.name, customers.name)
      RETURNING *
      "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(name)
    .fetch_one(&self.pool)
    .await?;
    Ok(customer)
  }

  async fn create_address(&self, user_id: Uuid, address: NewAddress) -> Result<ShippingAddress> {
    let stored = sqlx::query_as::<_, ShippingAddress>(
      r#"
      INSERT INTO addresses (id, user_id, recipient_name, phone, line1, line2, city, region, postal_code)
      VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
      RETURNING *
      "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&address.recipient_name)
    .bind(&address.phone)
    .bind(&address.line1)
    .bind(address.line2.as_deref())
    .bind(&address.city)
    .bind(address.region.as_deref())
    .bind(address.postal_code.as_deref())
    .fetch_one(&self.pool)
    .await?;
    Ok(stored)
  }

  async fn find_address(&self, address_id: Uuid) -> Result<Option<ShippingAddress>> {
    let address = sqlx::query_as::<_, ShippingAddress>("SELECT * FROM addresses WHERE id = $1")
      .bind(address_id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(address)
  }
}
