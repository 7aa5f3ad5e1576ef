// tests/context_management_tests.rs
mod common;

use common::*;
use duka_flow::{ContextData, Pipeline, PipelineControl, StepDef};
use serial_test::serial;

#[tokio::test]
#[serial]
async fn later_steps_observe_earlier_writes() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(
    "sharing",
    vec![StepDef::required("write"), StepDef::required("read_then_write")],
  );

  pipeline.on("write", |ctx: ContextData<TestContext>| async move {
    ctx.write().counter = 10;
    Ok::<_, TestError>(PipelineControl::Continue)
  });
  pipeline.on("read_then_write", |ctx: ContextData<TestContext>| async move {
    let seen = ctx.read().counter;
    tokio::time::sleep(std::time::Duration::from_millis(1)).await;
    ctx.update(|data| {
      data.counter = seen + 5;
      data.trail.push(format!("saw {}", seen));
    });
    Ok::<_, TestError>(PipelineControl::Continue)
  });

  let ctx = ContextData::new(TestContext::default());
  pipeline.run(ctx.clone()).await.unwrap();

  let snapshot = ctx.snapshot();
  assert_eq!(snapshot.counter, 15);
  assert_eq!(snapshot.trail, vec!["saw 10"]);
}

#[test]
fn clones_share_the_same_data() {
  let original = ContextData::new(TestContext {
    counter: 1,
    ..Default::default()
  });
  let cloned = original.clone();

  original.write().counter = 5;
  assert_eq!(cloned.read().counter, 5);

  cloned.update(|data| data.counter = 10);
  assert_eq!(original.with(|data| data.counter), 10);
}
