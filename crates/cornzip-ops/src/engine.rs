//! The codec engine contract.
//!
//! A [`CodecEngine`] performs the byte-level work of a run. The pipeline
//! hands it an [`EngineJob`] and a [`ProgressSink`]; the engine reports
//! progress from 0 to 100 through the sink and finally returns an
//! [`EngineOutput`] or an [`EngineError`]. Whether the engine computes
//! locally, on a worker pool or remotely is invisible to the pipeline.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use cornzip_core::{
    total_size, ArchiveEntry, ArchiveFormat, CompressionOptions, ExtractionOptions,
    ExtractionScope, InputFileRef,
};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::error::EngineError;
use crate::progress::{OperationKind, ProgressDetail, ProgressUpdate};

/// Opaque bytes produced by an engine (an archive, an export bundle).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact(Arc<[u8]>);

impl Artifact {
    /// Wrap produced bytes.
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self(bytes.into())
    }

    /// The produced bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no bytes were produced.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Work handed to an engine.
#[derive(Debug, Clone)]
pub enum EngineJob {
    /// Pack `inputs` into one archive.
    Compress {
        inputs: Vec<InputFileRef>,
        options: CompressionOptions,
    },
    /// Unpack `archives` into `destination`.
    Extract {
        archives: Vec<(InputFileRef, ArchiveFormat)>,
        destination: PathBuf,
        scope: ExtractionScope,
        options: ExtractionOptions,
    },
    /// Re-encode each archive as `target`.
    Convert {
        archives: Vec<(InputFileRef, ArchiveFormat)>,
        target: ArchiveFormat,
    },
}

impl EngineJob {
    /// The operation kind this job belongs to.
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Compress { .. } => OperationKind::Compression,
            Self::Extract { .. } => OperationKind::Extraction,
            Self::Convert { .. } => OperationKind::Conversion,
        }
    }

    /// The input files of the job.
    pub fn inputs(&self) -> Vec<&InputFileRef> {
        match self {
            Self::Compress { inputs, .. } => inputs.iter().collect(),
            Self::Extract { archives, .. } | Self::Convert { archives, .. } => {
                archives.iter().map(|(input, _)| input).collect()
            }
        }
    }

    /// Sum of input sizes.
    pub fn total_input_bytes(&self) -> u64 {
        total_size(self.inputs())
    }
}

/// What an engine produced for a job.
#[derive(Debug, Clone)]
pub enum EngineOutput {
    /// Archive written; the bytes, if the engine keeps them.
    Compressed { artifact: Option<Artifact> },
    /// Members extracted.
    Extracted {
        file_count: u64,
        total_size: u64,
        artifact: Option<Artifact>,
    },
    /// Archives converted.
    Converted {
        converted: usize,
        artifact: Option<Artifact>,
    },
}

impl EngineOutput {
    /// The operation kind this output answers.
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Compressed { .. } => OperationKind::Compression,
            Self::Extracted { .. } => OperationKind::Extraction,
            Self::Converted { .. } => OperationKind::Conversion,
        }
    }
}

/// The receiving side of a sink went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("progress receiver closed")]
pub struct SinkClosed;

/// Channel an engine reports progress through.
///
/// Reporting waits when the runner is behind, so a fast engine cannot flood
/// a slow consumer.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    tx: mpsc::Sender<ProgressUpdate>,
}

impl ProgressSink {
    /// Create a sink and the receiver that observes it.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ProgressUpdate>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Report a completion percentage.
    pub async fn report(&self, percent: f64) -> Result<(), SinkClosed> {
        self.send(ProgressUpdate::percent(percent)).await
    }

    /// Report a completion percentage with detail.
    pub async fn report_with(
        &self,
        percent: f64,
        detail: ProgressDetail,
    ) -> Result<(), SinkClosed> {
        self.send(ProgressUpdate { percent, detail }).await
    }

    /// Send a prepared update.
    pub async fn send(&self, update: ProgressUpdate) -> Result<(), SinkClosed> {
        self.tx.send(update).await.map_err(|_| SinkClosed)
    }

    /// Whether the run stopped listening (cancelled, timed out).
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Performs the byte-level work of archive operations.
pub trait CodecEngine: Send + Sync + 'static {
    /// Run a job, reporting progress through `sink`.
    fn run(
        &self,
        job: EngineJob,
        sink: ProgressSink,
    ) -> impl Future<Output = Result<EngineOutput, EngineError>> + Send;

    /// List the members of an archive.
    fn inspect(
        &self,
        archive: &InputFileRef,
        format: ArchiveFormat,
    ) -> impl Future<Output = Result<Vec<ArchiveEntry>, EngineError>> + Send {
        let _ = (archive, format);
        std::future::ready(Err(EngineError::Unsupported {
            operation: "inspect",
        }))
    }
}
