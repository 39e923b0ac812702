//! Conversion: format resolution and result construction.

use std::fmt;

use cornzip_core::{partition_archives, ArchiveFormat, ConversionOptions, InputFileRef};
use serde::Serialize;

use crate::capability::Capability;
use crate::engine::{Artifact, EngineJob};

/// Where the source format of a conversion came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "formats", rename_all = "lowercase")]
pub enum SourceFormat {
    /// Chosen by the user.
    Explicit(ArchiveFormat),
    /// Detected per input, deduplicated in input order.
    Detected(Vec<ArchiveFormat>),
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit(format) => write!(f, "{format}"),
            Self::Detected(formats) => {
                let values: Vec<_> = formats.iter().map(|format| format.value()).collect();
                write!(f, "{}", values.join(", "))
            }
        }
    }
}

/// Outcome of a conversion run.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionResult {
    /// Number of converted archives.
    pub converted_count: usize,
    /// Source format.
    pub source_format: SourceFormat,
    /// Target format.
    pub target_format: ArchiveFormat,
    /// Inputs that were not recognized as archives.
    pub skipped: Vec<String>,
    /// Follow-up actions.
    #[serde(skip)]
    pub capabilities: Vec<Capability>,
}

/// Name of the export bundle for a conversion to `target`.
pub fn export_file_name(target: ArchiveFormat) -> String {
    format!("converted_archives.{}", target.value())
}

/// A validated conversion run waiting for its engine.
#[derive(Debug, Clone)]
pub(crate) struct ConversionPlan {
    archives: Vec<(InputFileRef, ArchiveFormat)>,
    skipped: Vec<String>,
    source: SourceFormat,
    target: ArchiveFormat,
}

impl ConversionPlan {
    pub(crate) fn prepare(
        inputs: Vec<InputFileRef>,
        options: &ConversionOptions,
    ) -> Result<Self, String> {
        let target = options.target().map_err(|e| e.to_string())?;
        let explicit = options.source().map_err(|e| e.to_string())?;

        let partition = partition_archives(inputs);
        for name in &partition.excluded {
            tracing::warn!(file = %name, "skipping non-archive input");
        }
        if partition.accepted.is_empty() {
            return Err("No archive files selected".to_string());
        }

        let source = match explicit {
            Some(format) => SourceFormat::Explicit(format),
            None => {
                let mut detected = Vec::new();
                for (_, format) in &partition.accepted {
                    if !detected.contains(format) {
                        detected.push(*format);
                    }
                }
                SourceFormat::Detected(detected)
            }
        };

        Ok(Self {
            archives: partition.accepted,
            skipped: partition.excluded,
            source,
            target,
        })
    }

    pub(crate) fn job(&self) -> EngineJob {
        EngineJob::Convert {
            archives: self.archives.clone(),
            target: self.target,
        }
    }

    pub(crate) fn finish(self, converted: usize, artifact: Option<Artifact>) -> ConversionResult {
        tracing::info!(
            converted,
            from = %self.source,
            to = %self.target,
            "conversion finished"
        );

        ConversionResult {
            converted_count: converted,
            capabilities: vec![Capability::export(export_file_name(self.target), artifact)],
            source_format: self.source,
            target_format: self.target,
            skipped: self.skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detected_source_formats() {
        let inputs = vec![
            InputFileRef::new("a.zip", 1),
            InputFileRef::new("b.rar", 1),
            InputFileRef::new("c.ZIP", 1),
        ];
        let plan =
            ConversionPlan::prepare(inputs, &ConversionOptions::detect_source("7z")).unwrap();

        assert_eq!(
            plan.source,
            SourceFormat::Detected(vec![ArchiveFormat::Zip, ArchiveFormat::Rar])
        );
        assert_eq!(plan.source.to_string(), "zip, rar");
    }

    #[test]
    fn test_explicit_source() {
        let inputs = vec![InputFileRef::new("a.zip", 1), InputFileRef::new("x.txt", 1)];
        let plan =
            ConversionPlan::prepare(inputs, &ConversionOptions::new("zip", "tar.gz")).unwrap();
        let result = plan.finish(1, None);

        assert_eq!(
            result.source_format,
            SourceFormat::Explicit(ArchiveFormat::Zip)
        );
        assert_eq!(result.target_format, ArchiveFormat::TarGz);
        assert_eq!(result.skipped, vec!["x.txt".to_string()]);
        assert_eq!(
            result.capabilities[0].target().to_str(),
            Some("converted_archives.tar.gz")
        );
    }

    #[test]
    fn test_empty_target_rejected() {
        let inputs = vec![InputFileRef::new("a.zip", 1)];
        let err = ConversionPlan::prepare(inputs, &ConversionOptions::new("zip", "")).unwrap_err();
        assert_eq!(err, "Target format is required");
    }

    #[test]
    fn test_unknown_source_rejected() {
        let inputs = vec![InputFileRef::new("a.zip", 1)];
        let result = ConversionPlan::prepare(inputs, &ConversionOptions::new("zap", "7z"));
        assert!(result.is_err());
    }
}
