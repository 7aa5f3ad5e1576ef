// storefront/src/web/routes.rs

use crate::web::handlers::{admin_handlers, auth_handlers, checkout_handlers, order_handlers, payment_handlers};
use actix_web::web;
use std::path::Path;

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/auth")
          .route("/otp/request", web::post().to(auth_handlers::request_otp_handler))
          .route("/otp/verify", web::post().to(auth_handlers::verify_otp_handler))
          .route("/signout", web::post().to(auth_handlers::sign_out_handler)),
      )
      .route("/checkout", web::post().to(checkout_handlers::checkout_handler))
      .route("/payments", web::post().to(payment_handlers::pay_order_handler))
      .service(
        web::scope("/orders")
          .route("", web::get().to(order_handlers::list_orders_handler))
          .route("/{order_id}", web::get().to(order_handlers::get_order_handler)),
      )
      .service(
        web::scope("/admin/orders")
          .route("/{order_id}", web::get().to(admin_handlers::admin_get_order_handler))
          .route("/{order_id}/status", web::put().to(admin_handlers::update_status_handler))
          .route("/{order_id}/receipt", web::post().to(admin_handlers::regenerate_receipt_handler)),
      ),
  );
}

/// Serves `/receipts/{orderNumber}.pdf` from the receipts directory. The
/// directory must exist when this is called.
pub fn receipt_files(receipts_dir: &Path) -> actix_files::Files {
  actix_files::Files::new("/receipts", receipts_dir)
}
