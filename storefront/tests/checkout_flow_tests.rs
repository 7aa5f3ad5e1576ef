// tests/checkout_flow_tests.rs

mod common;

use common::{checkout_input, line_item, Harness, BASE_URL};
use duka_storefront::errors::AppError;
use duka_storefront::models::{OrderStatus, PaymentStatus};
use duka_storefront::pipelines::common_steps::issue_receipt;
use duka_storefront::pipelines::{checkout, pay_order};
use duka_storefront::repository::{CustomerRepository, OrderRepository, PaymentRepository};
use duka_storefront::services::notifier::Template;
use duka_storefront::services::receipt::{receipt_lines, ReceiptLine};
use rust_decimal_macros::dec;
use uuid::Uuid;

#[tokio::test]
async fn checkout_prices_pays_and_issues_a_receipt() {
  let h = Harness::new();
  let customer = h.customer("achieng@example.com").await;

  let outcome = checkout(
    &h.state,
    customer.id,
    checkout_input(vec![line_item("Maasai shuka", dec!(15995), 1)], "0712345678"),
  )
  .await
  .expect("checkout");

  let order = &outcome.details.order;
  assert!(outcome.warnings.is_empty(), "unexpected warnings {:?}", outcome.warnings);
  assert_eq!(order.subtotal, dec!(15995));
  assert_eq!(order.tax, dec!(2559));
  assert_eq!(order.shipping_cost, dec!(500));
  assert_eq!(order.total, dec!(19054));
  assert_eq!(order.status, OrderStatus::Processing);
  assert_eq!(order.payment_status, PaymentStatus::Completed);

  let expected_url = format!("{}/receipts/{}.pdf", BASE_URL, order.order_number);
  assert_eq!(order.receipt_url.as_deref(), Some(expected_url.as_str()));

  let receipt_path = h.receipts_dir().join(format!("{}.pdf", order.order_number));
  let bytes = std::fs::read(&receipt_path).expect("receipt file");
  assert!(bytes.starts_with(b"%PDF"));

  let payment = outcome.details.payment.as_ref().expect("payment recorded");
  assert_eq!(payment.phone_number, "254712345678");
  assert_eq!(payment.amount, dec!(19054));
  assert_eq!(payment.status, PaymentStatus::Completed);

  assert_eq!(outcome.details.items.len(), 1);
  assert_eq!(outcome.details.items[0].name, "Maasai shuka");

  let confirmations = h.notifier.sent_with(Template::OrderConfirmation);
  assert_eq!(confirmations.len(), 1);
  assert_eq!(confirmations[0].notification.recipient, "achieng@example.com");
  assert_eq!(confirmations[0].notification.data["receiptUrl"], expected_url.as_str());
}

#[tokio::test]
async fn large_orders_ship_free() {
  let h = Harness::new();
  let customer = h.customer("free@example.com").await;

  let outcome = checkout(
    &h.state,
    customer.id,
    checkout_input(
      vec![line_item("Sandals", dec!(10000), 2), line_item("Beads", dec!(5000), 1)],
      "+254712345678",
    ),
  )
  .await
  .expect("checkout");

  let order = &outcome.details.order;
  assert_eq!(order.subtotal, dec!(25000));
  assert_eq!(order.tax, dec!(4000));
  assert_eq!(order.shipping_cost, dec!(0));
  assert_eq!(order.total, dec!(29000));

  let names: Vec<&str> = outcome.details.items.iter().map(|i| i.name.as_str()).collect();
  assert_eq!(names, ["Sandals", "Beads"]);
}

#[tokio::test]
async fn invalid_requests_persist_nothing() {
  let h = Harness::new();
  let customer = h.customer("invalid@example.com").await;

  let empty = checkout(&h.state, customer.id, checkout_input(vec![], "0712345678")).await;
  assert!(matches!(empty, Err(AppError::Validation(_))));

  let zero_quantity = checkout(
    &h.state,
    customer.id,
    checkout_input(vec![line_item("Hat", dec!(100), 0)], "0712345678"),
  )
  .await;
  assert!(matches!(zero_quantity, Err(AppError::Validation(_))));

  let negative_price = checkout(
    &h.state,
    customer.id,
    checkout_input(vec![line_item("Hat", dec!(-5), 1)], "0712345678"),
  )
  .await;
  assert!(matches!(negative_price, Err(AppError::Validation(_))));

  let bad_phone = checkout(
    &h.state,
    customer.id,
    checkout_input(vec![line_item("Hat", dec!(100), 1)], "12345"),
  )
  .await;
  assert!(matches!(bad_phone, Err(AppError::Validation(_))));

  let mut no_address = checkout_input(vec![line_item("Hat", dec!(100), 1)], "0712345678");
  no_address.address = None;
  assert!(matches!(
    checkout(&h.state, customer.id, no_address).await,
    Err(AppError::Validation(_))
  ));

  assert!(h.store.find_by_user(customer.id).await.unwrap().is_empty());
  assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
async fn prices_that_cannot_be_stored_are_rejected_before_persisting() {
  let h = Harness::new();
  let customer = h.customer("precise@example.com").await;

  let fractional = checkout(
    &h.state,
    customer.id,
    checkout_input(vec![line_item("Thread", dec!(0.333), 3)], "0712345678"),
  )
  .await;
  assert!(matches!(fractional, Err(AppError::Validation(_))));

  let enormous = checkout(
    &h.state,
    customer.id,
    checkout_input(vec![line_item("Island", rust_decimal::Decimal::MAX, 2)], "0712345678"),
  )
  .await;
  assert!(matches!(enormous, Err(AppError::Validation(_))));

  assert!(h.store.find_by_user(customer.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn someone_elses_address_is_not_found() {
  let h = Harness::new();
  let owner = h.customer("owner@example.com").await;
  let intruder = h.customer("intruder@example.com").await;
  let address = h
    .store
    .create_address(owner.id, common::sample_address())
    .await
    .unwrap();

  let mut input = checkout_input(vec![line_item("Hat", dec!(100), 1)], "0712345678");
  input.address = None;
  input.address_id = Some(address.id);

  let result = checkout(&h.state, intruder.id, input).await;
  assert!(matches!(result, Err(AppError::NotFound(_))));
  assert!(h.store.find_by_user(intruder.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn saved_address_can_be_reused() {
  let h = Harness::new();
  let customer = h.customer("repeat@example.com").await;
  let address = h
    .store
    .create_address(customer.id, common::sample_address())
    .await
    .unwrap();

  let mut input = checkout_input(vec![line_item("Hat", dec!(100), 1)], "0712345678");
  input.address = None;
  input.address_id = Some(address.id);

  let outcome = checkout(&h.state, customer.id, input).await.expect("checkout");
  assert_eq!(outcome.details.address.id, address.id);
}

#[tokio::test]
async fn paid_orders_reject_a_second_payment() {
  let h = Harness::new();
  let customer = h.customer("twice@example.com").await;
  let outcome = checkout(
    &h.state,
    customer.id,
    checkout_input(vec![line_item("Hat", dec!(1000), 1)], "0712345678"),
  )
  .await
  .unwrap();
  let order = outcome.details.order;

  let second = pay_order(&h.state, order.id, Some(customer.id), "0712345678", order.total).await;
  assert!(matches!(second, Err(AppError::Conflict(_))));

  let payment = h.store.find_payment_for_order(order.id).await.unwrap().unwrap();
  assert_eq!(Some(payment.transaction_id), outcome.details.payment.map(|p| p.transaction_id));
}

#[tokio::test]
async fn payment_amount_must_match_the_order_total() {
  let h = Harness::new();
  let customer = h.customer("amount@example.com").await;
  let order = h.unpaid_order(&customer, dec!(1000)).await;

  let short = pay_order(&h.state, order.id, Some(customer.id), "0712345678", dec!(1)).await;
  assert!(matches!(short, Err(AppError::Validation(_))));
  assert!(h.store.find_payment_for_order(order.id).await.unwrap().is_none());

  let paid = pay_order(&h.state, order.id, Some(customer.id), "0712345678", order.total)
    .await
    .expect("payment");
  assert_eq!(paid.order.status, OrderStatus::Processing);
  assert!(paid.receipt_url.is_some());
}

#[tokio::test]
async fn paying_someone_elses_order_is_not_found() {
  let h = Harness::new();
  let owner = h.customer("payer@example.com").await;
  let stranger = h.customer("stranger@example.com").await;
  let order = h.unpaid_order(&owner, dec!(1000)).await;

  let result = pay_order(&h.state, order.id, Some(stranger.id), "0712345678", order.total).await;
  assert!(matches!(result, Err(AppError::NotFound(_))));

  let missing = pay_order(&h.state, Uuid::new_v4(), None, "0712345678", order.total).await;
  assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn receipt_failure_does_not_fail_checkout() {
  let h = Harness::with_broken_receipts();
  let customer = h.customer("norceipt@example.com").await;

  let outcome = checkout(
    &h.state,
    customer.id,
    checkout_input(vec![line_item("Hat", dec!(1000), 1)], "0712345678"),
  )
  .await
  .expect("checkout still succeeds");

  assert_eq!(outcome.details.order.status, OrderStatus::Processing);
  assert_eq!(outcome.details.order.payment_status, PaymentStatus::Completed);
  assert!(outcome.details.order.receipt_url.is_none());
  assert!(outcome.warnings.iter().any(|w| w.starts_with("receipt")));
  // The confirmation still goes out, without a receipt link.
  assert_eq!(h.notifier.sent_with(Template::OrderConfirmation).len(), 1);
}

#[tokio::test]
async fn notification_failure_does_not_fail_checkout() {
  let h = Harness::new();
  let customer = h.customer("fail_test@example.com").await;

  let outcome = checkout(
    &h.state,
    customer.id,
    checkout_input(vec![line_item("Hat", dec!(1000), 1)], "0712345678"),
  )
  .await
  .expect("checkout still succeeds");

  assert!(outcome.details.order.receipt_url.is_some());
  assert!(outcome.warnings.iter().any(|w| w.starts_with("confirmation email")));
}

#[tokio::test]
async fn unpaid_orders_get_no_receipt() {
  let h = Harness::new();
  let customer = h.customer("unpaid@example.com").await;
  let order = h.unpaid_order(&customer, dec!(2500)).await;

  let err = issue_receipt(&h.state, order.id).await.unwrap_err();
  assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);

  let stored = h.store.find_order(order.id).await.unwrap().unwrap();
  assert!(stored.receipt_url.is_none());
  assert_eq!(std::fs::read_dir(h.receipts_dir()).unwrap().count(), 0);
}

#[tokio::test]
async fn regenerating_a_receipt_reuses_its_path_and_reflects_the_latest_snapshot() {
  let h = Harness::new();
  let customer = h.customer("regen@example.com").await;
  let order = h.unpaid_order(&customer, dec!(2500)).await;

  let paid = pay_order(&h.state, order.id, None, "0712345678", order.total)
    .await
    .expect("payment");
  let first_url = paid.receipt_url.clone().expect("receipt issued on payment");

  h.store
    .upsert_customer("regen@example.com", Some("Regina Wanjiru"))
    .await
    .unwrap();
  let after = issue_receipt(&h.state, order.id).await.expect("regenerated receipt");
  assert_eq!(after.receipt_url.as_deref(), Some(first_url.as_str()));

  let details = h.store.find_details(order.id).await.unwrap().unwrap();
  let lines = receipt_lines(&details, &h.state.config.store_name, &h.state.config.currency);
  let code_line = ReceiptLine::Text(format!("Payment code: {}", paid.payment.provider_receipt_code));
  assert!(lines.contains(&code_line));
  assert!(lines.contains(&ReceiptLine::Text("Regina Wanjiru".to_string())));

  let entries: Vec<_> = std::fs::read_dir(h.receipts_dir())
    .unwrap()
    .map(|e| e.unwrap().file_name().into_string().unwrap())
    .collect();
  assert_eq!(entries, vec![format!("{}.pdf", order.order_number)]);
}
