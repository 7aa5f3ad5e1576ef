// storefront/src/services/notifier.rs

//! Outbound customer notifications. Delivery itself is external; the crate
//! only hands `(recipient, template, data)` to a [`Notifier`].

use crate::errors::{AppError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Template {
  OrderConfirmation,
  OrderShipped,
  OrderDelivered,
  OtpCode,
}

impl Template {
  pub fn as_str(self) -> &'static str {
    match self {
      Template::OrderConfirmation => "order_confirmation",
      Template::OrderShipped => "order_shipped",
      Template::OrderDelivered => "order_delivered",
      Template::OtpCode => "otp_code",
    }
  }

  fn subject(self) -> &'static str {
    match self {
      Template::OrderConfirmation => "Your order is confirmed",
      Template::OrderShipped => "Your order is on its way",
      Template::OrderDelivered => "Your order has been delivered",
      Template::OtpCode => "Your sign-in code",
    }
  }
}

impl fmt::Display for Template {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
  pub recipient: String,
  pub template: Template,
  pub data: serde_json::Value,
}

impl Notification {
  pub fn new(recipient: impl Into<String>, template: Template, data: serde_json::Value) -> Self {
    Self {
      recipient: recipient.into(),
      template,
      data,
    }
  }
}

#[derive(Debug, Clone)]
pub struct SentNotification {
  pub message_id: String,
  pub sender: String,
  pub subject: String,
  pub notification: Notification,
}

#[async_trait]
pub trait Notifier: Send + Sync {
  async fn send(&self, notification: Notification) -> Result<SentNotification>;
}

/// Logs messages instead of delivering them and keeps a copy of each one.
///
/// Recipients containing `fail_test` are rejected, which lets tests exercise
/// the failure path.
pub struct MockEmailNotifier {
  sender: String,
  latency: Duration,
  outbox: Mutex<Vec<SentNotification>>,
}

impl MockEmailNotifier {
  pub fn new(sender: impl Into<String>) -> Self {
    Self {
      sender: sender.into(),
      latency: Duration::from_millis(5),
      outbox: Mutex::new(Vec::new()),
    }
  }

  pub fn sent(&self) -> Vec<SentNotification> {
    self.outbox.lock().clone()
  }

  pub fn sent_with(&self, template: Template) -> Vec<SentNotification> {
    self
      .outbox
      .lock()
      .iter()
      .filter(|m| m.notification.template == template)
      .cloned()
      .collect()
  }
}

#[async_trait]
impl Notifier for MockEmailNotifier {
  #[instrument(name = "notifier::send", skip(self, notification), fields(recipient = %notification.recipient, template = %notification.template))]
  async fn send(&self, notification: Notification) -> Result<SentNotification> {
    tokio::time::sleep(self.latency).await;

    if notification.recipient.contains("fail_test") {
      warn!("Simulated email failure.");
      return Err(AppError::Notification(format!(
        "Mailbox {} rejected the message",
        notification.recipient
      )));
    }

    let sent = SentNotification {
      message_id: format!("mock_email_{}", uuid::Uuid::new_v4()),
      sender: self.sender.clone(),
      subject: notification.template.subject().to_string(),
      notification,
    };
    info!(message_id = %sent.message_id, "Mock email sent.");
    self.outbox.lock().push(sent.clone());
    Ok(sent)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[tokio::test]
  async fn records_sent_messages() {
    let notifier = MockEmailNotifier::new("shop@example.com");
    notifier
      .send(Notification::new("a@example.com", Template::OrderShipped, json!({ "orderNumber": "ORD-1" })))
      .await
      .unwrap();

    let sent = notifier.sent_with(Template::OrderShipped);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].sender, "shop@example.com");
    assert_eq!(sent[0].notification.data["orderNumber"], "ORD-1");
    assert!(notifier.sent_with(Template::OrderDelivered).is_empty());
  }

  #[tokio::test]
  async fn fail_test_recipients_are_rejected() {
    let notifier = MockEmailNotifier::new("shop@example.com");
    let err = notifier
      .send(Notification::new("fail_test@example.com", Template::OtpCode, json!({})))
      .await
      .unwrap_err();
    assert!(matches!(err, AppError::Notification(_)));
    assert!(notifier.sent().is_empty());
  }
}
