//! Progress reporting types for archive operations.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// The kind of operation being performed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Compression,
    Extraction,
    Conversion,
}

impl OperationKind {
    /// Past-tense verb used in summaries.
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Compression => "Compressed",
            Self::Extraction => "Extracted",
            Self::Conversion => "Converted",
        }
    }
}

/// Optional description of what an operation is doing right now.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressDetail {
    /// The item currently being processed.
    pub current_item: Option<String>,
    /// Number of items processed so far.
    pub items_processed: Option<u64>,
    /// Total number of items.
    pub items_total: Option<u64>,
    /// Current throughput.
    pub bytes_per_second: Option<u64>,
    /// Estimated time remaining.
    pub eta: Option<Duration>,
}

impl ProgressDetail {
    /// Detail naming the current item.
    pub fn item(name: impl Into<String>) -> Self {
        Self {
            current_item: Some(name.into()),
            ..Default::default()
        }
    }

    /// Set processed/total item counts.
    pub fn with_items(mut self, processed: u64, total: u64) -> Self {
        self.items_processed = Some(processed);
        self.items_total = Some(total);
        self
    }

    /// Set the estimated time remaining.
    pub fn with_eta(mut self, eta: Duration) -> Self {
        self.eta = Some(eta);
        self
    }

    /// Set the throughput.
    pub fn with_throughput(mut self, bytes_per_second: u64) -> Self {
        self.bytes_per_second = Some(bytes_per_second);
        self
    }
}

/// A progress report sent by a codec engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressUpdate {
    /// Reported completion percentage.
    pub percent: f64,
    /// What the engine is doing.
    pub detail: ProgressDetail,
}

impl ProgressUpdate {
    /// A bare percentage report.
    pub fn percent(percent: f64) -> Self {
        Self {
            percent,
            detail: ProgressDetail::default(),
        }
    }
}

/// Progress of a run as seen by callers.
///
/// `percent` stays within `[0, 100]` and never decreases over the life of a
/// run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationProgress {
    /// The kind of operation.
    pub kind: OperationKind,
    /// Completion percentage.
    pub percent: f64,
    /// Latest detail reported with a non-decreasing percentage.
    pub detail: ProgressDetail,
}

impl OperationProgress {
    /// Progress at 0%.
    pub fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            percent: 0.0,
            detail: ProgressDetail::default(),
        }
    }

    /// Whether the run has reached 100%.
    pub fn is_complete(&self) -> bool {
        self.percent >= 100.0
    }

    /// Merge an engine report, keeping the percentage monotonic.
    ///
    /// NaN and stale (lower) reports are ignored. Returns whether anything
    /// changed.
    pub fn advance(&mut self, update: ProgressUpdate) -> bool {
        if update.percent.is_nan() {
            return false;
        }

        let percent = update.percent.clamp(0.0, 100.0);
        if percent < self.percent {
            return false;
        }

        let changed = percent > self.percent || update.detail != self.detail;
        self.percent = percent;
        self.detail = update.detail;
        changed
    }

    /// Jump to 100%.
    pub fn complete(&mut self) {
        self.percent = 100.0;
    }

    /// Back to 0% with no detail.
    pub fn reset(&mut self) {
        self.percent = 0.0;
        self.detail = ProgressDetail::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_is_monotonic() {
        let mut progress = OperationProgress::new(OperationKind::Compression);

        assert!(progress.advance(ProgressUpdate::percent(40.0)));
        assert!(!progress.advance(ProgressUpdate::percent(30.0)));
        assert_eq!(progress.percent, 40.0);

        assert!(progress.advance(ProgressUpdate::percent(250.0)));
        assert_eq!(progress.percent, 100.0);
        assert!(progress.is_complete());
    }

    #[test]
    fn test_advance_ignores_nan() {
        let mut progress = OperationProgress::new(OperationKind::Extraction);
        progress.advance(ProgressUpdate::percent(10.0));
        assert!(!progress.advance(ProgressUpdate::percent(f64::NAN)));
        assert_eq!(progress.percent, 10.0);
    }

    #[test]
    fn test_negative_report_clamps_to_zero() {
        let mut progress = OperationProgress::new(OperationKind::Conversion);
        assert!(!progress.advance(ProgressUpdate::percent(-5.0)));
        assert_eq!(progress.percent, 0.0);
    }

    #[test]
    fn test_detail_update_at_same_percent() {
        let mut progress = OperationProgress::new(OperationKind::Extraction);
        let update = ProgressUpdate {
            percent: 0.0,
            detail: ProgressDetail::item("a.zip").with_items(0, 2),
        };
        assert!(progress.advance(update));
        assert_eq!(progress.detail.current_item.as_deref(), Some("a.zip"));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(OperationKind::Compression.to_string(), "compression");
        assert_eq!(
            "EXTRACTION".parse::<OperationKind>().unwrap(),
            OperationKind::Extraction
        );
    }
}
