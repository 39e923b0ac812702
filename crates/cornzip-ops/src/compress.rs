//! Compression: validation, size estimation and result construction.

use std::path::PathBuf;

use cornzip_core::{
    estimate, total_size, ArchiveFormat, CompressionOptions, InputFileRef, OptionsError,
    SizeEstimate,
};
use serde::Serialize;

use crate::capability::Capability;
use crate::engine::{Artifact, EngineJob};

/// Outcome of a compression run.
#[derive(Debug, Clone, Serialize)]
pub struct CompressionResult {
    /// Sum of input sizes in bytes.
    pub original_size: u64,
    /// Estimated archive size in bytes.
    pub compressed_size: u64,
    /// Space saved, in percent.
    pub ratio: u8,
    /// Archive file name including the format extension.
    pub archive_name: String,
    /// Directory the archive is materialized into.
    pub output_path: PathBuf,
    /// Archive format.
    pub format: ArchiveFormat,
    /// Number of volumes when splitting.
    pub volumes: Option<u64>,
    /// Follow-up actions.
    #[serde(skip)]
    pub capabilities: Vec<Capability>,
}

impl CompressionResult {
    /// Full path of the archive.
    pub fn archive_path(&self) -> PathBuf {
        self.output_path.join(&self.archive_name)
    }
}

/// A validated compression run waiting for its engine.
#[derive(Debug, Clone)]
pub(crate) struct CompressionPlan {
    inputs: Vec<InputFileRef>,
    options: CompressionOptions,
    original_size: u64,
    estimate: SizeEstimate,
}

impl CompressionPlan {
    pub(crate) fn prepare(
        inputs: Vec<InputFileRef>,
        options: CompressionOptions,
    ) -> Result<Self, OptionsError> {
        options.validate()?;
        let level = options.compression_level()?;
        let original_size = total_size(&inputs);
        let estimate = estimate(original_size, level, options.method);

        Ok(Self {
            inputs,
            options,
            original_size,
            estimate,
        })
    }

    pub(crate) fn job(&self) -> EngineJob {
        EngineJob::Compress {
            inputs: self.inputs.clone(),
            options: self.options.clone(),
        }
    }

    pub(crate) fn finish(self, artifact: Option<Artifact>) -> CompressionResult {
        let archive_name = self.options.archive_file_name();
        let archive_path = self.options.archive_path();
        let compressed_size = self.estimate.estimated_bytes;

        tracing::info!(
            archive = %archive_name,
            original = self.original_size,
            compressed = compressed_size,
            "compression finished"
        );

        CompressionResult {
            original_size: self.original_size,
            compressed_size,
            ratio: self.estimate.saved_percent,
            volumes: self.options.split.map(|split| split.volumes_for(compressed_size)),
            capabilities: vec![
                Capability::materialize(archive_path, artifact.clone()),
                Capability::export(&archive_name, artifact),
            ],
            archive_name,
            output_path: self.options.output_path,
            format: self.options.format,
        }
    }
}
