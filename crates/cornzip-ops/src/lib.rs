//! Archive operation pipeline for cornzip.
//!
//! This crate runs compression, extraction and conversion as async tasks on
//! the tokio runtime. The byte-level work is delegated to a [`CodecEngine`];
//! each [`TaskRunner`] enforces one active run per operation kind, publishes
//! monotonic progress and produces a typed [`OperationResult`] whose
//! follow-up actions are explicit [`Capability`] values.

mod capability;
mod compress;
mod convert;
mod engine;
mod error;
mod executor;
mod extract;
mod operation;
mod plan;
mod progress;
mod runner;
mod simulated;

pub use capability::{Action, ActionError, ActionHandler, Capability, FsActionHandler};
pub use compress::CompressionResult;
pub use convert::{ConversionResult, SourceFormat};
pub use engine::{Artifact, CodecEngine, EngineJob, EngineOutput, ProgressSink, SinkClosed};
pub use error::{EngineError, FailureReason, RunError};
pub use executor::OperationExecutor;
pub use extract::ExtractionResult;
pub use operation::{OperationOptions, OperationResult};
pub use progress::{OperationKind, OperationProgress, ProgressDetail, ProgressUpdate};
pub use runner::{OperationHandle, ProgressSubscription, RunSnapshot, RunState, TaskRunner};
pub use simulated::{SimulatedEngine, SimulationConfig, SimulationConfigBuilder};
