// storefront/src/lib.rs

//! Duka storefront backend: checkout, simulated mobile-money payment, order
//! lifecycle and PDF receipts, served over actix-web.

pub mod config;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod repository;
pub mod services;
pub mod state;
pub mod web;
