//! Compressed-size estimation.
//!
//! The estimate is a fixed policy rather than a measurement: each method has a
//! base ratio which the compression level scales down linearly,
//! `ratio = base * (1 - level / 20)`. All arithmetic is done on integers so
//! the results are exact for every input size.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::OptionsError;

/// Compression method, trading speed for ratio.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter, EnumString, Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum CompressionMethod {
    /// Prioritize speed over compression.
    Fast,
    /// Balanced speed and compression.
    #[default]
    Standard,
    /// Best compression, slower.
    Maximum,
    /// Extreme compression.
    Ultra,
}

impl CompressionMethod {
    /// Base output/input ratio in tenths (fast 0.8 ... ultra 0.3).
    fn base_tenths(&self) -> u64 {
        match self {
            Self::Fast => 8,
            Self::Standard => 6,
            Self::Maximum => 4,
            Self::Ultra => 3,
        }
    }
}

/// A compression level in `0..=9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct CompressionLevel(u8);

impl CompressionLevel {
    /// Highest supported level.
    pub const MAX: u8 = 9;

    /// Level used when none is chosen.
    pub const DEFAULT: CompressionLevel = CompressionLevel(5);

    /// Create a level, rejecting values above [`CompressionLevel::MAX`].
    pub fn new(level: u8) -> Result<Self, OptionsError> {
        if level > Self::MAX {
            return Err(OptionsError::LevelOutOfRange { level });
        }
        Ok(Self(level))
    }

    /// The numeric level.
    pub fn get(&self) -> u8 {
        self.0
    }

    /// Iterate over every valid level, lowest first.
    pub fn all() -> impl Iterator<Item = CompressionLevel> {
        (0..=Self::MAX).map(CompressionLevel)
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u8> for CompressionLevel {
    type Error = OptionsError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Self::new(level)
    }
}

impl From<CompressionLevel> for u8 {
    fn from(level: CompressionLevel) -> Self {
        level.0
    }
}

/// Estimated output of a compression run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeEstimate {
    /// Estimated archive size in bytes.
    pub estimated_bytes: u64,
    /// Estimated space saved, as a whole percentage.
    pub saved_percent: u8,
}

impl SizeEstimate {
    /// Bytes saved relative to the input total.
    pub fn saved_bytes(&self, total_input_bytes: u64) -> u64 {
        total_input_bytes.saturating_sub(self.estimated_bytes)
    }
}

/// The scaled ratio `base * (1 - level / 20)` as a fraction over 200.
fn ratio_over_200(level: CompressionLevel, method: CompressionMethod) -> u64 {
    method.base_tenths() * (20 - u64::from(level.get()))
}

/// Output/input ratio for a level and method.
pub fn ratio(level: CompressionLevel, method: CompressionMethod) -> f64 {
    ratio_over_200(level, method) as f64 / 200.0
}

/// Estimate the compressed size of `total_input_bytes`.
///
/// `estimated_bytes = floor(total * ratio)` and
/// `saved_percent = round((1 - ratio) * 100)`, halves rounding up.
pub fn estimate(
    total_input_bytes: u64,
    level: CompressionLevel,
    method: CompressionMethod,
) -> SizeEstimate {
    let numerator = ratio_over_200(level, method);

    let estimated_bytes = (u128::from(total_input_bytes) * u128::from(numerator) / 200) as u64;

    // (1 - n/200) * 100 == (200 - n) / 2
    let saved_twice = 200 - numerator;
    let saved_percent = saved_twice.div_ceil(2) as u8;

    SizeEstimate {
        estimated_bytes,
        saved_percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(n: u8) -> CompressionLevel {
        CompressionLevel::new(n).unwrap()
    }

    #[test]
    fn test_standard_level_five() {
        let est = estimate(10_000_000, level(5), CompressionMethod::Standard);
        assert_eq!(est.estimated_bytes, 4_500_000);
        assert_eq!(est.saved_percent, 55);
    }

    #[test]
    fn test_level_zero_uses_base_ratio() {
        let est = estimate(1_000, level(0), CompressionMethod::Fast);
        assert_eq!(est.estimated_bytes, 800);
        assert_eq!(est.saved_percent, 20);
    }

    #[test]
    fn test_half_percent_rounds_up() {
        // ultra at level 1: ratio = 0.3 * 0.95 = 0.285 -> 71.5% saved
        let est = estimate(1_000, level(1), CompressionMethod::Ultra);
        assert_eq!(est.estimated_bytes, 285);
        assert_eq!(est.saved_percent, 72);
    }

    #[test]
    fn test_estimate_floors() {
        let est = estimate(7, level(9), CompressionMethod::Maximum);
        // 7 * 0.4 * 0.55 = 1.54
        assert_eq!(est.estimated_bytes, 1);
    }

    #[test]
    fn test_zero_input() {
        let est = estimate(0, level(9), CompressionMethod::Ultra);
        assert_eq!(est.estimated_bytes, 0);
    }

    #[test]
    fn test_huge_input_does_not_overflow() {
        let est = estimate(u64::MAX, level(0), CompressionMethod::Fast);
        assert_eq!(
            est.estimated_bytes,
            (u128::from(u64::MAX) * 160 / 200) as u64
        );
    }

    #[test]
    fn test_level_bounds() {
        assert!(CompressionLevel::new(9).is_ok());
        assert!(matches!(
            CompressionLevel::new(10),
            Err(OptionsError::LevelOutOfRange { level: 10 })
        ));
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!(
            "ULTRA".parse::<CompressionMethod>().unwrap(),
            CompressionMethod::Ultra
        );
        assert_eq!(CompressionMethod::Maximum.to_string(), "maximum");
    }

    #[test]
    fn test_ratio_display_value() {
        let standard = ratio(level(5), CompressionMethod::Standard);
        assert!((standard - 0.45).abs() < 1e-12);
    }
}
