//! A reference engine that simulates archive work.
//!
//! [`SimulatedEngine`] paces progress in fixed steps and derives plausible
//! statistics from input sizes. It writes placeholder artifacts, not real
//! archives, and is meant for demos and tests.

use std::time::Duration;

use cornzip_core::{ArchiveEntry, ArchiveFormat, ExtractionScope, InputFileRef};
use derive_builder::Builder;

use crate::engine::{Artifact, CodecEngine, EngineJob, EngineOutput, ProgressSink};
use crate::error::EngineError;
use crate::progress::{OperationKind, ProgressDetail};

/// Bytes of archive per simulated extracted file.
const BYTES_PER_FILE: u64 = 50_000;

/// Files every archive contributes regardless of size.
const BASE_FILES_PER_ARCHIVE: u64 = 5;

/// Pacing of the simulated engine.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct SimulationConfig {
    /// Number of progress steps per run.
    #[builder(default = "100")]
    pub steps: u32,

    /// Delay per step when compressing.
    #[builder(default = "Duration::from_millis(40)")]
    pub compression_delay: Duration,

    /// Delay per step when extracting.
    #[builder(default = "Duration::from_millis(30)")]
    pub extraction_delay: Duration,

    /// Delay per step when converting.
    #[builder(default = "Duration::from_millis(60)")]
    pub conversion_delay: Duration,
}

impl SimulationConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(0) = self.steps {
            return Err("Steps must be at least 1".to_string());
        }
        Ok(())
    }
}

impl SimulationConfig {
    /// Create a new config builder.
    pub fn builder() -> SimulationConfigBuilder {
        SimulationConfigBuilder::default()
    }

    /// No delay between steps.
    pub fn instant() -> Self {
        Self {
            compression_delay: Duration::ZERO,
            extraction_delay: Duration::ZERO,
            conversion_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Per-step delay for `kind`.
    pub fn delay(&self, kind: OperationKind) -> Duration {
        match kind {
            OperationKind::Compression => self.compression_delay,
            OperationKind::Extraction => self.extraction_delay,
            OperationKind::Conversion => self.conversion_delay,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            steps: 100,
            compression_delay: Duration::from_millis(40),
            extraction_delay: Duration::from_millis(30),
            conversion_delay: Duration::from_millis(60),
        }
    }
}

/// Engine that simulates compression, extraction and conversion.
#[derive(Debug, Clone, Default)]
pub struct SimulatedEngine {
    config: SimulationConfig,
    listing: Option<Vec<ArchiveEntry>>,
}

impl SimulatedEngine {
    /// Create an engine with the given pacing.
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            listing: None,
        }
    }

    /// Answer `inspect` with `entries`.
    pub fn with_listing(mut self, entries: Vec<ArchiveEntry>) -> Self {
        self.listing = Some(entries);
        self
    }

    fn output(&self, job: &EngineJob) -> EngineOutput {
        match job {
            EngineJob::Compress { inputs, options } => {
                let mut manifest =
                    format!("CornZip simulated {} archive\n", options.format.label());
                for input in inputs {
                    manifest.push_str(&format!("{}\t{}\n", input.name, input.size));
                }
                EngineOutput::Compressed {
                    artifact: Some(Artifact::new(manifest.into_bytes())),
                }
            }
            EngineJob::Extract {
                archives,
                destination,
                scope,
                ..
            } => {
                let file_count = match scope {
                    ExtractionScope::All => archives
                        .iter()
                        .map(|(input, _)| input.size / BYTES_PER_FILE + BASE_FILES_PER_ARCHIVE)
                        .sum(),
                    ExtractionScope::Only(files) => files.len() as u64,
                };
                let total_size = job.total_input_bytes().saturating_mul(3) / 2;
                let manifest = format!(
                    "Extracted files from CornZip\nPath: {}\n",
                    destination.display()
                );
                EngineOutput::Extracted {
                    file_count,
                    total_size,
                    artifact: Some(Artifact::new(manifest.into_bytes())),
                }
            }
            EngineJob::Convert { archives, target } => {
                let manifest = format!(
                    "CornZip simulated conversion to {}\n{}\n",
                    target.label(),
                    archives
                        .iter()
                        .map(|(input, _)| input.name.as_str())
                        .collect::<Vec<_>>()
                        .join("\n")
                );
                EngineOutput::Converted {
                    converted: archives.len(),
                    artifact: Some(Artifact::new(manifest.into_bytes())),
                }
            }
        }
    }
}

/// Bytes per second needed to get through `bytes` in `duration`.
fn throughput(bytes: u64, duration: Duration) -> Option<u64> {
    let millis = u64::try_from(duration.as_millis()).ok().filter(|ms| *ms > 0)?;
    Some(bytes.saturating_mul(1000) / millis)
}

impl CodecEngine for SimulatedEngine {
    async fn run(&self, job: EngineJob, sink: ProgressSink) -> Result<EngineOutput, EngineError> {
        let delay = self.config.delay(job.kind());
        let steps = self.config.steps.max(1);
        let names: Vec<String> = job
            .inputs()
            .iter()
            .map(|input| input.name.clone())
            .collect();
        let total = names.len() as u64;
        let bytes = job.total_input_bytes();
        let throughput = throughput(bytes, delay.saturating_mul(steps));

        for step in 0..=steps {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let processed = u64::from(step) * total / u64::from(steps);
            let mut detail = ProgressDetail::default()
                .with_items(processed, total)
                .with_eta(delay.saturating_mul(steps - step));
            detail.current_item = names.get(processed as usize).cloned();
            if let Some(bytes_per_second) = throughput {
                detail = detail.with_throughput(bytes_per_second);
            }

            let percent = f64::from(step) * 100.0 / f64::from(steps);
            sink.report_with(percent, detail).await?;
        }

        tracing::debug!(kind = %job.kind(), inputs = total, "simulated run finished");
        Ok(self.output(&job))
    }

    async fn inspect(
        &self,
        archive: &InputFileRef,
        format: ArchiveFormat,
    ) -> Result<Vec<ArchiveEntry>, EngineError> {
        tracing::debug!(archive = %archive.name, %format, "inspect");
        self.listing.clone().ok_or(EngineError::Unsupported {
            operation: "inspect",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;

    use cornzip_core::ExtractionOptions;

    fn extract_job(scope: ExtractionScope) -> EngineJob {
        EngineJob::Extract {
            archives: vec![
                (InputFileRef::new("a.zip", 120_000), ArchiveFormat::Zip),
                (InputFileRef::new("b.rar", 10_000), ArchiveFormat::Rar),
            ],
            destination: PathBuf::from("out"),
            scope,
            options: ExtractionOptions::default(),
        }
    }

    #[test]
    fn test_builder_defaults() {
        let config = SimulationConfig::builder().build().unwrap();
        assert_eq!(config.steps, 100);
        assert_eq!(
            config.delay(OperationKind::Conversion),
            Duration::from_millis(60)
        );
        assert!(SimulationConfig::builder().steps(0u32).build().is_err());
    }

    #[test]
    fn test_extraction_statistics() {
        let engine = SimulatedEngine::default();
        match engine.output(&extract_job(ExtractionScope::All)) {
            EngineOutput::Extracted {
                file_count,
                total_size,
                ..
            } => {
                // (2 + 5) + (0 + 5)
                assert_eq!(file_count, 12);
                assert_eq!(total_size, 195_000);
            }
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[test]
    fn test_selective_extraction_counts_subset() {
        let engine = SimulatedEngine::default();
        let scope = ExtractionScope::Only(vec!["x.txt".into(), "y.txt".into()]);
        match engine.output(&extract_job(scope)) {
            EngineOutput::Extracted { file_count, .. } => assert_eq!(file_count, 2),
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_reports_every_step() {
        let engine = SimulatedEngine::new(
            SimulationConfig::builder()
                .steps(4u32)
                .extraction_delay(Duration::ZERO)
                .build()
                .unwrap(),
        );
        let (sink, mut rx) = ProgressSink::channel(16);

        engine
            .run(extract_job(ExtractionScope::All), sink)
            .await
            .unwrap();

        let mut percents = Vec::new();
        while let Some(update) = rx.recv().await {
            percents.push(update.percent);
        }
        assert_eq!(percents, vec![0.0, 25.0, 50.0, 75.0, 100.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_reports_eta_and_throughput() {
        let engine = SimulatedEngine::new(
            SimulationConfig::builder()
                .steps(4u32)
                .extraction_delay(Duration::from_millis(10))
                .build()
                .unwrap(),
        );
        let (sink, mut rx) = ProgressSink::channel(16);

        engine
            .run(extract_job(ExtractionScope::All), sink)
            .await
            .unwrap();

        let first = rx.recv().await.unwrap();
        assert_eq!(first.detail.eta, Some(Duration::from_millis(40)));
        // 130 000 bytes over 40ms
        assert_eq!(first.detail.bytes_per_second, Some(3_250_000));

        let mut last = first;
        while let Some(update) = rx.recv().await {
            last = update;
        }
        assert_eq!(last.detail.eta, Some(Duration::ZERO));
        assert_eq!(last.detail.items_processed, Some(2));
    }

    #[test]
    fn test_instant_engine_reports_no_throughput() {
        assert_eq!(throughput(1_000, Duration::ZERO), None);
        assert_eq!(throughput(1_000, Duration::from_millis(500)), Some(2_000));
    }

    #[tokio::test]
    async fn test_inspect_without_listing() {
        let engine = SimulatedEngine::default();
        let err = engine
            .inspect(&InputFileRef::new("a.zip", 1), ArchiveFormat::Zip)
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::Unsupported { operation: "inspect" });
    }
}
