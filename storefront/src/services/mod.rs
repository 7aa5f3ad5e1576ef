// storefront/src/services/mod.rs

pub mod auth_service;
pub mod notifier;
pub mod payment_sim;
pub mod phone;
pub mod pricing;
pub mod receipt;
pub mod temp_store;
