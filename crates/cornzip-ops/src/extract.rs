//! Extraction: input filtering, the operation log and result construction.

use std::path::{Path, PathBuf};

use chrono::Local;
use cornzip_core::{
    partition_archives, ArchiveFormat, ExtractionMode, ExtractionOptions, InputFileRef,
    PipelineConfig,
};
use humansize::{format_size, BINARY};
use serde::Serialize;

use crate::capability::Capability;
use crate::engine::{Artifact, EngineJob};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Outcome of an extraction run.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    /// Number of extracted files.
    pub file_count: u64,
    /// Total size of extracted files in bytes.
    pub total_size: u64,
    /// Destination directory.
    pub extract_path: PathBuf,
    /// Human-readable operation log.
    pub log: String,
    /// Inputs that were not recognized as archives.
    pub skipped: Vec<String>,
    /// Follow-up actions.
    #[serde(skip)]
    pub capabilities: Vec<Capability>,
}

/// Name of the export bundle for an extraction into `extract_path`.
pub fn export_file_name(extract_path: &Path) -> String {
    let stem = extract_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "extracted".to_string());
    format!("{stem}_files.zip")
}

/// Running log of an extraction.
#[derive(Debug, Clone)]
pub(crate) struct ExtractionLog {
    text: String,
    step: u16,
    next_milestone: u16,
}

impl ExtractionLog {
    pub(crate) fn begin(
        destination: &Path,
        mode: ExtractionMode,
        archives: usize,
        skipped: &[String],
        step: u8,
    ) -> Self {
        let mut text = String::from("CornZip Extraction Log\n");
        text.push_str(&format!("Started: {}\n", Local::now().format(TIMESTAMP_FORMAT)));
        text.push_str(&format!("Destination: {}\n", destination.display()));
        text.push_str(&format!("Mode: {mode}\n"));
        text.push_str(&format!("Archives: {archives}\n"));
        if !skipped.is_empty() {
            text.push_str(&format!("Skipped: {}\n", skipped.join(", ")));
        }
        text.push('\n');

        Self {
            text,
            step: u16::from(step.max(1)),
            next_milestone: 0,
        }
    }

    /// Append every milestone up to `percent` not yet written.
    pub(crate) fn record_progress(&mut self, percent: f64) {
        while self.next_milestone <= 100 && f64::from(self.next_milestone) <= percent {
            self.text.push_str(&format!(
                "Progress: {}% - Processing files...\n",
                self.next_milestone
            ));
            self.next_milestone += self.step;
        }
    }

    pub(crate) fn finish(mut self, file_count: u64, total_size: u64) -> String {
        self.record_progress(100.0);
        self.text
            .push_str(&format!("\nCompleted: {}\n", Local::now().format(TIMESTAMP_FORMAT)));
        self.text.push_str(&format!("Files extracted: {file_count}\n"));
        self.text
            .push_str(&format!("Total size: {}\n", format_size(total_size, BINARY)));
        self.text.push_str("Status: Success\n");
        self.text
    }
}

/// A validated extraction run waiting for its engine.
#[derive(Debug, Clone)]
pub(crate) struct ExtractionPlan {
    archives: Vec<(InputFileRef, ArchiveFormat)>,
    skipped: Vec<String>,
    destination: PathBuf,
    options: ExtractionOptions,
    log: ExtractionLog,
}

impl ExtractionPlan {
    pub(crate) fn prepare(
        inputs: Vec<InputFileRef>,
        options: ExtractionOptions,
        config: &PipelineConfig,
    ) -> Result<Self, String> {
        let partition = partition_archives(inputs);
        for name in &partition.excluded {
            tracing::warn!(file = %name, "skipping non-archive input");
        }
        if partition.accepted.is_empty() {
            return Err("No archive files selected".to_string());
        }

        let destination = options
            .destination(&config.default_extract_path)
            .to_path_buf();
        tracing::debug!(
            destination = %destination.display(),
            encrypted = options.password().is_some(),
            "extraction prepared"
        );
        let log = ExtractionLog::begin(
            &destination,
            options.mode,
            partition.accepted.len(),
            &partition.excluded,
            config.log_milestone_step,
        );

        Ok(Self {
            archives: partition.accepted,
            skipped: partition.excluded,
            destination,
            options,
            log,
        })
    }

    pub(crate) fn job(&self) -> EngineJob {
        EngineJob::Extract {
            archives: self.archives.clone(),
            destination: self.destination.clone(),
            scope: self.options.scope(),
            options: self.options.clone(),
        }
    }

    pub(crate) fn observe(&mut self, percent: f64) {
        self.log.record_progress(percent);
    }

    pub(crate) fn finish(
        self,
        file_count: u64,
        total_size: u64,
        artifact: Option<Artifact>,
    ) -> ExtractionResult {
        tracing::info!(
            destination = %self.destination.display(),
            files = file_count,
            bytes = total_size,
            "extraction finished"
        );

        let export_name = export_file_name(&self.destination);
        ExtractionResult {
            file_count,
            total_size,
            log: self.log.finish(file_count, total_size),
            skipped: self.skipped,
            capabilities: vec![
                Capability::reveal(&self.destination),
                Capability::export(export_name, artifact),
            ],
            extract_path: self.destination,
        }
    }
}
