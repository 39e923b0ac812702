//! Core types for cornzip.
//!
//! This crate provides the pieces of the archive pipeline that need no
//! runtime: the archive format catalog and filename classifier, the
//! compressed-size estimator, input file references, per-operation option
//! schemas and the shared pipeline configuration.

mod config;
mod entry;
mod error;
mod estimate;
mod format;
mod input;
mod options;

pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use entry::{ArchiveEntry, EntryKind};
pub use error::{ConfigError, OptionsError};
pub use estimate::{estimate, ratio, CompressionLevel, CompressionMethod, SizeEstimate};
pub use format::{classify, is_archive, partition_archives, ArchiveFormat, ArchivePartition};
pub use input::{total_size, ContentHandle, InputFileRef};
pub use options::{
    validate_archive_name, CompressionOptions, CompressionOptionsBuilder, ConversionOptions,
    ExtractionMode, ExtractionOptions, ExtractionOptionsBuilder, ExtractionScope, SplitSize,
    SplitUnit,
};
