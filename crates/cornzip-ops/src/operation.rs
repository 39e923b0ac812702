//! Operation options and results shared by every runner.

use cornzip_core::{CompressionOptions, ConversionOptions, ExtractionOptions};
use humansize::{format_size, BINARY};
use serde::{Deserialize, Serialize};

use crate::capability::Capability;
use crate::compress::CompressionResult;
use crate::convert::ConversionResult;
use crate::extract::ExtractionResult;
use crate::progress::OperationKind;

/// Options for one run, tagged by operation kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OperationOptions {
    Compression(CompressionOptions),
    Extraction(ExtractionOptions),
    Conversion(ConversionOptions),
}

impl OperationOptions {
    /// The operation kind these options belong to.
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Compression(_) => OperationKind::Compression,
            Self::Extraction(_) => OperationKind::Extraction,
            Self::Conversion(_) => OperationKind::Conversion,
        }
    }
}

impl From<CompressionOptions> for OperationOptions {
    fn from(options: CompressionOptions) -> Self {
        Self::Compression(options)
    }
}

impl From<ExtractionOptions> for OperationOptions {
    fn from(options: ExtractionOptions) -> Self {
        Self::Extraction(options)
    }
}

impl From<ConversionOptions> for OperationOptions {
    fn from(options: ConversionOptions) -> Self {
        Self::Conversion(options)
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OperationResult {
    Compression(CompressionResult),
    Extraction(ExtractionResult),
    Conversion(ConversionResult),
}

impl OperationResult {
    /// The operation kind that produced this result.
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Compression(_) => OperationKind::Compression,
            Self::Extraction(_) => OperationKind::Extraction,
            Self::Conversion(_) => OperationKind::Conversion,
        }
    }

    /// Follow-up actions available on this result.
    pub fn capabilities(&self) -> &[Capability] {
        match self {
            Self::Compression(result) => &result.capabilities,
            Self::Extraction(result) => &result.capabilities,
            Self::Conversion(result) => &result.capabilities,
        }
    }

    pub fn as_compression(&self) -> Option<&CompressionResult> {
        match self {
            Self::Compression(result) => Some(result),
            _ => None,
        }
    }

    pub fn as_extraction(&self) -> Option<&ExtractionResult> {
        match self {
            Self::Extraction(result) => Some(result),
            _ => None,
        }
    }

    pub fn as_conversion(&self) -> Option<&ConversionResult> {
        match self {
            Self::Conversion(result) => Some(result),
            _ => None,
        }
    }

    /// Get a one-line summary of the result.
    pub fn summary(&self) -> String {
        let verb = self.kind().verb();
        match self {
            Self::Compression(result) => format!(
                "{} {} to {} ({}% saved)",
                verb,
                format_size(result.original_size, BINARY),
                format_size(result.compressed_size, BINARY),
                result.ratio
            ),
            Self::Extraction(result) => format!(
                "{} {} files ({}) to {}",
                verb,
                result.file_count,
                format_size(result.total_size, BINARY),
                result.extract_path.display()
            ),
            Self::Conversion(result) => format!(
                "{} {} archives from {} to {}",
                verb, result.converted_count, result.source_format, result.target_format
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use cornzip_core::ArchiveFormat;

    use crate::convert::SourceFormat;

    #[test]
    fn test_options_kind() {
        let options: OperationOptions = ConversionOptions::new("zip", "7z").into();
        assert_eq!(options.kind(), OperationKind::Conversion);

        let options: OperationOptions = ExtractionOptions::default().into();
        assert_eq!(options.kind(), OperationKind::Extraction);
    }

    #[test]
    fn test_conversion_summary() {
        let result = OperationResult::Conversion(ConversionResult {
            converted_count: 2,
            source_format: SourceFormat::Detected(vec![ArchiveFormat::Zip, ArchiveFormat::Rar]),
            target_format: ArchiveFormat::SevenZip,
            skipped: vec![],
            capabilities: vec![],
        });

        assert_eq!(result.summary(), "Converted 2 archives from zip, rar to 7z");
        assert!(result.as_conversion().is_some());
        assert!(result.as_compression().is_none());
    }
}
