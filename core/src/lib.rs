// core/src/lib.rs

//! duka-flow: a small asynchronous workflow engine.
//!
//! A [`Pipeline`] is an ordered list of named steps. Each step can carry
//! `before`, `on` and `after` handlers which all receive a shared
//! [`ContextData`] and decide whether the run continues or stops. Steps run
//! strictly one after another: every handler is awaited before the next one
//! starts, so a step can rely on whatever its predecessors wrote into the
//! context.
//!
//! The first handler error short-circuits the run and is returned to the
//! caller unchanged. The engine logs the failing step and phase through
//! `tracing` before returning.
//!
//! [`Flows`] is a registry keyed by context type, so application code can hold
//! one object and dispatch any registered pipeline by handing it a context.

pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;

pub use crate::core::context::{Handler, HandlerFuture};
pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::step::{SkipCondition, StepDef};

pub use crate::pipeline::definition::Pipeline;

pub use crate::error::{FlowError, FlowResult};

pub use crate::registry::Flows;
