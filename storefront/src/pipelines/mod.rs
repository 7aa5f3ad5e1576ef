// storefront/src/pipelines/mod.rs

//! The order lifecycle, expressed as `duka_flow` pipelines.
//!
//! * checkout: validate, price, resolve the address, create the order, then
//!   hand over to the payment pipeline.
//! * payment: guard, charge, settle, receipt, confirmation.
//! * status: operator transitions, including delivery.

use crate::errors::AppError;
use duka_flow::Flows;

pub mod checkout_pipeline;
pub mod common_steps;
pub mod contexts;
pub mod payment_pipeline;
pub mod status_pipeline;

pub use checkout_pipeline::{checkout, CheckoutInput, CheckoutOutcome};
pub use payment_pipeline::{pay_order, PaymentOutcome};
pub use status_pipeline::{change_status, mark_delivered, StatusChange};

/// Registers every storefront pipeline. Called once per [`crate::state::AppState`].
pub fn register_all_pipelines(flows: &Flows<AppError>) {
  flows.register(checkout_pipeline::build_checkout_pipeline());
  flows.register(payment_pipeline::build_payment_pipeline());
  flows.register(status_pipeline::build_status_pipeline());
  tracing::debug!("Storefront pipelines registered.");
}
