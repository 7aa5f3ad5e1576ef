// tests/common/mod.rs
#![allow(dead_code)]

use duka_flow::{ContextData, FlowError, HandlerFuture, PipelineControl};
use once_cell::sync::Lazy;
use tracing::Level;

/// Context threaded through the engine tests. `trail` records which
/// handlers ran, in order.
#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub counter: i32,
  pub trail: Vec<String>,
  pub stop_at: Option<String>,
  pub skip_refund: bool,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("flow error: {0}")]
  Flow(String),

  #[error("handler failed: {0}")]
  Handler(String),
}

impl From<FlowError> for TestError {
  fn from(fe: FlowError) -> Self {
    TestError::Flow(format!("{:?}", fe))
  }
}

/// Handler that bumps the counter, records `label` and stops if the context
/// asks it to.
pub fn recording_handler(label: &'static str) -> duka_flow::Handler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| -> HandlerFuture<TestError> {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.counter += 1;
      guard.trail.push(label.to_string());
      if guard.stop_at.as_deref() == Some(label) {
        return Ok::<_, TestError>(PipelineControl::Stop);
      }
      Ok::<_, TestError>(PipelineControl::Continue)
    })
  })
}

pub fn failing_handler(label: &'static str, message: &'static str) -> duka_flow::Handler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| -> HandlerFuture<TestError> {
    Box::pin(async move {
      ctx.write().trail.push(label.to_string());
      Err(TestError::Handler(message.to_string()))
    })
  })
}

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
