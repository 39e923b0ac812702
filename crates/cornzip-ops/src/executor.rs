//! High-level executor owning one runner per operation kind.

use std::sync::Arc;

use cornzip_core::{classify, ArchiveEntry, InputFileRef, PipelineConfig};

use crate::engine::CodecEngine;
use crate::error::{FailureReason, RunError};
use crate::operation::{OperationOptions, OperationResult};
use crate::progress::OperationKind;
use crate::runner::{OperationHandle, ProgressSubscription, TaskRunner};

/// Executor for archive operations over a shared codec engine.
#[derive(Debug)]
pub struct OperationExecutor<E: CodecEngine> {
    engine: Arc<E>,
    compression: TaskRunner<E>,
    extraction: TaskRunner<E>,
    conversion: TaskRunner<E>,
}

impl<E: CodecEngine> OperationExecutor<E> {
    /// Create an executor with the default configuration.
    pub fn new(engine: E) -> Self {
        Self::with_config(engine, PipelineConfig::default())
    }

    /// Create an executor with the given configuration.
    pub fn with_config(engine: E, config: PipelineConfig) -> Self {
        let engine = Arc::new(engine);
        let config = Arc::new(config);
        let runner = |kind| TaskRunner::new(kind, Arc::clone(&engine), Arc::clone(&config));

        Self {
            compression: runner(OperationKind::Compression),
            extraction: runner(OperationKind::Extraction),
            conversion: runner(OperationKind::Conversion),
            engine,
        }
    }

    /// The runner for `kind`.
    pub fn runner(&self, kind: OperationKind) -> &TaskRunner<E> {
        match kind {
            OperationKind::Compression => &self.compression,
            OperationKind::Extraction => &self.extraction,
            OperationKind::Conversion => &self.conversion,
        }
    }

    /// Start an operation on the runner for `kind`.
    pub fn start_operation(
        &self,
        kind: OperationKind,
        inputs: Vec<InputFileRef>,
        options: impl Into<OperationOptions>,
    ) -> Result<OperationHandle, RunError> {
        self.runner(kind).start(inputs, options)
    }

    /// Subscribe to the progress of a run.
    pub fn subscribe_progress(&self, handle: &OperationHandle) -> ProgressSubscription {
        handle.subscribe()
    }

    /// Get the result of a run.
    pub fn get_result(&self, handle: &OperationHandle) -> Result<OperationResult, RunError> {
        handle.result()
    }

    /// List the members of an archive through the engine.
    pub async fn inspect(&self, archive: &InputFileRef) -> Result<Vec<ArchiveEntry>, RunError> {
        let format = classify(&archive.name).ok_or_else(|| {
            RunError::InvalidInput(format!("{} is not a supported archive", archive.name))
        })?;

        self.engine
            .inspect(archive, format)
            .await
            .map_err(|e| RunError::OperationFailed(FailureReason::Engine(e.to_string())))
    }
}
