// core/src/pipeline/execution.rs

use crate::core::context_data::ContextData;
use crate::core::control::{PipelineControl, PipelineResult};
use crate::error::FlowError;
use crate::pipeline::definition::{Phase, Pipeline, StepHandlers};
use tracing::{event, Instrument, Level};

/// What a single phase of a step decided.
enum PhaseOutcome {
  Continue,
  Stopped,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Runs every step in order against `ctx_data`.
  ///
  /// Returns `Ok(Completed)` when the last step finishes, `Ok(Stopped { step })`
  /// when a handler asks to stop, and the first handler error otherwise. The
  /// failing step and phase are logged at `ERROR` before the error is
  /// returned.
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err> {
    let run_span = tracing::info_span!("pipeline_run", pipeline = %self.name, num_steps = self.steps.len());
    self.run_steps(ctx_data).instrument(run_span).await
  }

  async fn run_steps(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err> {
    event!(Level::DEBUG, "Pipeline execution starting.");

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();

      if step_def.should_skip(&ctx_data) {
        event!(Level::DEBUG, step = step_name, "Step skipped by its skip condition.");
        continue;
      }

      let handlers = match self.handlers.get(step_name) {
        Some(h) if !h.is_empty() => h,
        _ if step_def.optional => {
          event!(Level::DEBUG, step = step_name, "Optional step has no handlers, skipping.");
          continue;
        }
        _ => {
          event!(Level::ERROR, step = step_name, "Required step has no handlers.");
          return Err(Err::from(FlowError::HandlerMissing {
            step_name: step_def.name.clone(),
          }));
        }
      };

      let step_span = tracing::info_span!("pipeline_step", step = step_name, step_index = step_idx);
      let outcome = self
        .run_step(step_name, handlers, &ctx_data)
        .instrument(step_span)
        .await?;

      if let PhaseOutcome::Stopped = outcome {
        event!(Level::INFO, pipeline = %self.name, step = step_name, "Pipeline stopped by handler.");
        return Ok(PipelineResult::Stopped {
          step: step_def.name.clone(),
        });
      }
    }

    event!(Level::DEBUG, "Pipeline execution completed.");
    Ok(PipelineResult::Completed)
  }

  async fn run_step(
    &self,
    step_name: &str,
    handlers: &StepHandlers<TData, Err>,
    ctx_data: &ContextData<TData>,
  ) -> Result<PhaseOutcome, Err> {
    for phase in [Phase::Before, Phase::On, Phase::After] {
      for (handler_idx, handler_fn) in handlers.phase(phase).iter().enumerate() {
        match handler_fn(ctx_data.clone()).await {
          Ok(PipelineControl::Continue) => {}
          Ok(PipelineControl::Stop) => return Ok(PhaseOutcome::Stopped),
          Err(e) => {
            event!(
              Level::ERROR,
              pipeline = %self.name,
              step = step_name,
              phase = %phase,
              handler_index = handler_idx,
              error = %e,
              "Pipeline step failed."
            );
            return Err(e);
          }
        }
      }
    }
    Ok(PhaseOutcome::Continue)
  }
}
