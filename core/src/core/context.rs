// core/src/core/context.rs

//! The boxed handler type every registered step handler is normalised into.

use crate::core::context_data::ContextData;
use crate::core::control::PipelineControl;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by a [`Handler`].
pub type HandlerFuture<Err> = Pin<Box<dyn Future<Output = Result<PipelineControl, Err>> + Send>>;

/// A pipeline step handler.
///
/// Handlers receive a clone of the run's [`ContextData`] and resolve to a
/// [`PipelineControl`]. Lock guards taken on the context must be released
/// before the handler awaits anything.
pub type Handler<TData, Err> = Box<dyn Fn(ContextData<TData>) -> HandlerFuture<Err> + Send + Sync>;

/// Wraps a user closure into a [`Handler`], converting its error type into
/// the pipeline's error type.
pub(crate) fn box_handler<TData, Err, F, UserErr>(
  handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
) -> Handler<TData, Err>
where
  TData: Send + Sync + 'static,
  F: Future<Output = Result<PipelineControl, UserErr>> + Send + 'static,
  UserErr: Into<Err> + Send + 'static,
  Err: 'static,
{
  Box::new(move |ctx_data: ContextData<TData>| -> HandlerFuture<Err> {
    let user_fut = handler_fn(ctx_data);
    Box::pin(async move { user_fut.await.map_err(Into::into) })
  })
}
