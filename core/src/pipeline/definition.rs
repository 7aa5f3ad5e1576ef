// core/src/pipeline/definition.rs

use crate::core::context::Handler;
use crate::core::step::StepDef;
use crate::error::FlowError;
use std::collections::HashMap;
use std::fmt;

/// Phase of a step a handler is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  Before,
  On,
  After,
}

impl fmt::Display for Phase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Phase::Before => f.write_str("before"),
      Phase::On => f.write_str("on"),
      Phase::After => f.write_str("after"),
    }
  }
}

/// Handlers registered for one step, grouped by phase.
pub(crate) struct StepHandlers<TData: 'static + Send + Sync, Err> {
  pub(crate) before: Vec<Handler<TData, Err>>,
  pub(crate) on: Vec<Handler<TData, Err>>,
  pub(crate) after: Vec<Handler<TData, Err>>,
}

impl<TData: 'static + Send + Sync, Err> Default for StepHandlers<TData, Err> {
  fn default() -> Self {
    Self {
      before: Vec::new(),
      on: Vec::new(),
      after: Vec::new(),
    }
  }
}

impl<TData: 'static + Send + Sync, Err> StepHandlers<TData, Err> {
  pub(crate) fn phase(&self, phase: Phase) -> &[Handler<TData, Err>] {
    match phase {
      Phase::Before => &self.before,
      Phase::On => &self.on,
      Phase::After => &self.after,
    }
  }

  pub(crate) fn phase_mut(&mut self, phase: Phase) -> &mut Vec<Handler<TData, Err>> {
    match phase {
      Phase::Before => &mut self.before,
      Phase::On => &mut self.on,
      Phase::After => &mut self.after,
    }
  }

  pub(crate) fn is_empty(&self) -> bool {
    self.before.is_empty() && self.on.is_empty() && self.after.is_empty()
  }
}

/// An ordered workflow over a context of type `TData`, whose handlers fail
/// with `Err`.
///
/// `Err` must be constructible from [`FlowError`] so that engine-level
/// problems (a required step with no handler) surface through the same type
/// the handlers use.
pub struct Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) name: String,
  pub(crate) steps: Vec<StepDef<TData>>,
  pub(crate) handlers: HashMap<String, StepHandlers<TData, Err>>,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Creates a pipeline from its step definitions, in execution order.
  ///
  /// Panics on duplicate step names: that is a wiring mistake, not a runtime
  /// condition.
  pub fn new(name: impl Into<String>, steps: Vec<StepDef<TData>>) -> Self {
    let name = name.into();
    for (idx, step) in steps.iter().enumerate() {
      if steps[..idx].iter().any(|earlier| earlier.name == step.name) {
        panic!("Pipeline '{}' declares step '{}' twice.", name, step.name);
      }
    }
    Self {
      name,
      steps,
      handlers: HashMap::new(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// Step names in execution order.
  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  pub(crate) fn ensure_step_exists(&self, step_name: &str) {
    if !self.steps.iter().any(|s| s.name == step_name) {
      panic!(
        "Pipeline '{}' has no step named '{}'. Declare it in Pipeline::new first.",
        self.name, step_name
      );
    }
  }

  pub(crate) fn push_handler(&mut self, step_name: &str, phase: Phase, handler: Handler<TData, Err>) {
    self.ensure_step_exists(step_name);
    self
      .handlers
      .entry(step_name.to_string())
      .or_default()
      .phase_mut(phase)
      .push(handler);
  }
}
