//! Kind dispatch between the runner and the per-kind operations.

use cornzip_core::{InputFileRef, PipelineConfig};

use crate::compress::CompressionPlan;
use crate::convert::ConversionPlan;
use crate::engine::{EngineJob, EngineOutput};
use crate::error::FailureReason;
use crate::extract::ExtractionPlan;
use crate::operation::{OperationOptions, OperationResult};
use crate::progress::OperationKind;

/// A validated run of one kind, ready to hand to an engine.
#[derive(Debug, Clone)]
pub(crate) enum Plan {
    Compression(CompressionPlan),
    Extraction(ExtractionPlan),
    Conversion(ConversionPlan),
}

impl Plan {
    /// Validate a start request for a runner of `kind`.
    ///
    /// Returns the message of the rejection on failure.
    pub(crate) fn prepare(
        kind: OperationKind,
        inputs: Vec<InputFileRef>,
        options: OperationOptions,
        config: &PipelineConfig,
    ) -> Result<Self, String> {
        if options.kind() != kind {
            return Err(format!(
                "{} options given to the {} runner",
                options.kind(),
                kind
            ));
        }
        if inputs.is_empty() {
            return Err("No files selected".to_string());
        }

        match options {
            OperationOptions::Compression(options) => CompressionPlan::prepare(inputs, options)
                .map(Self::Compression)
                .map_err(|e| e.to_string()),
            OperationOptions::Extraction(options) => {
                ExtractionPlan::prepare(inputs, options, config).map(Self::Extraction)
            }
            OperationOptions::Conversion(options) => {
                ConversionPlan::prepare(inputs, &options).map(Self::Conversion)
            }
        }
    }

    pub(crate) fn kind(&self) -> OperationKind {
        match self {
            Self::Compression(_) => OperationKind::Compression,
            Self::Extraction(_) => OperationKind::Extraction,
            Self::Conversion(_) => OperationKind::Conversion,
        }
    }

    pub(crate) fn job(&self) -> EngineJob {
        match self {
            Self::Compression(plan) => plan.job(),
            Self::Extraction(plan) => plan.job(),
            Self::Conversion(plan) => plan.job(),
        }
    }

    /// Called whenever published progress rises.
    pub(crate) fn observe(&mut self, percent: f64) {
        if let Self::Extraction(plan) = self {
            plan.observe(percent);
        }
    }

    /// Build the result from the engine's output.
    pub(crate) fn finish(self, output: EngineOutput) -> Result<OperationResult, FailureReason> {
        match (self, output) {
            (Self::Compression(plan), EngineOutput::Compressed { artifact }) => {
                Ok(OperationResult::Compression(plan.finish(artifact)))
            }
            (
                Self::Extraction(plan),
                EngineOutput::Extracted {
                    file_count,
                    total_size,
                    artifact,
                },
            ) => Ok(OperationResult::Extraction(
                plan.finish(file_count, total_size, artifact),
            )),
            (Self::Conversion(plan), EngineOutput::Converted { converted, artifact }) => {
                Ok(OperationResult::Conversion(plan.finish(converted, artifact)))
            }
            (plan, output) => Err(FailureReason::Contract(format!(
                "{} run received {} output",
                plan.kind(),
                output.kind()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use cornzip_core::{CompressionOptions, ConversionOptions};

    fn config() -> PipelineConfig {
        PipelineConfig::default()
    }

    #[test]
    fn test_kind_mismatch() {
        let err = Plan::prepare(
            OperationKind::Extraction,
            vec![InputFileRef::new("a.zip", 1)],
            CompressionOptions::new("x").into(),
            &config(),
        )
        .unwrap_err();
        assert_eq!(err, "compression options given to the extraction runner");
    }

    #[test]
    fn test_empty_inputs() {
        let err = Plan::prepare(
            OperationKind::Compression,
            vec![],
            CompressionOptions::new("x").into(),
            &config(),
        )
        .unwrap_err();
        assert_eq!(err, "No files selected");
    }

    #[test]
    fn test_wrong_output_is_contract_failure() {
        let plan = Plan::prepare(
            OperationKind::Conversion,
            vec![InputFileRef::new("a.zip", 1)],
            ConversionOptions::detect_source("7z").into(),
            &config(),
        )
        .unwrap();

        let err = plan
            .finish(EngineOutput::Compressed { artifact: None })
            .unwrap_err();
        assert!(matches!(err, FailureReason::Contract(_)));
    }
}
