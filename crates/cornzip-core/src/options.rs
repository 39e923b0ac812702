//! Option schemas for the three operation kinds.

use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::OptionsError;
use crate::estimate::{CompressionLevel, CompressionMethod};
use crate::format::ArchiveFormat;

/// Unit for split-volume sizes (1024-based).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter, EnumString, Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum SplitUnit {
    Kb,
    #[default]
    Mb,
    Gb,
}

impl SplitUnit {
    /// Number of bytes in one unit.
    pub fn multiplier(&self) -> u64 {
        match self {
            Self::Kb => 1024,
            Self::Mb => 1024 * 1024,
            Self::Gb => 1024 * 1024 * 1024,
        }
    }
}

/// Maximum size of each volume of a split archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitSize {
    /// Size in `unit`s; must be positive.
    pub size: u64,
    /// Unit of `size`.
    #[serde(default)]
    pub unit: SplitUnit,
}

impl SplitSize {
    /// Create a split size.
    pub fn new(size: u64, unit: SplitUnit) -> Self {
        Self { size, unit }
    }

    /// Volume size in bytes.
    pub fn bytes(&self) -> u64 {
        self.size.saturating_mul(self.unit.multiplier())
    }

    /// Number of volumes needed for `total` bytes (at least one).
    pub fn volumes_for(&self, total: u64) -> u64 {
        let per_volume = self.bytes().max(1);
        total.div_ceil(per_volume).max(1)
    }
}

/// Settings for a compression run.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct CompressionOptions {
    /// Output archive format.
    #[builder(default = "ArchiveFormat::Zip")]
    #[serde(default = "default_format")]
    pub format: ArchiveFormat,

    /// Compression level, 0-9.
    #[builder(default = "5")]
    #[serde(default = "default_level")]
    pub level: u8,

    /// Compression method.
    #[builder(default)]
    #[serde(default)]
    pub method: CompressionMethod,

    /// Password; `Some` enables encryption.
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub password: Option<String>,

    /// Volume size; `Some` enables splitting.
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub split: Option<SplitSize>,

    /// Archive base name, with or without the format extension.
    #[builder(default = "String::from(\"archive\")")]
    #[serde(default = "default_archive_name")]
    pub archive_name: String,

    /// Directory the archive is materialized into.
    #[builder(default = "PathBuf::from(\"Downloads\")")]
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
}

fn default_format() -> ArchiveFormat {
    ArchiveFormat::Zip
}

fn default_level() -> u8 {
    CompressionLevel::DEFAULT.get()
}

fn default_archive_name() -> String {
    "archive".to_string()
}

fn default_output_path() -> PathBuf {
    PathBuf::from("Downloads")
}

impl CompressionOptionsBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref name) = self.archive_name {
            validate_archive_name(name).map_err(|e| e.to_string())?;
        }
        if let Some(level) = self.level {
            CompressionLevel::new(level).map_err(|e| e.to_string())?;
        }
        if let Some(Some(ref password)) = self.password {
            if password.is_empty() {
                return Err(OptionsError::EmptyPassword.to_string());
            }
        }
        if let Some(Some(split)) = self.split {
            if split.size == 0 {
                return Err(OptionsError::NonPositiveSplitSize.to_string());
            }
        }
        Ok(())
    }
}

impl CompressionOptions {
    /// Create an options builder.
    pub fn builder() -> CompressionOptionsBuilder {
        CompressionOptionsBuilder::default()
    }

    /// Create options with defaults and the given archive name.
    pub fn new(archive_name: impl Into<String>) -> Self {
        Self {
            format: default_format(),
            level: default_level(),
            method: CompressionMethod::default(),
            password: None,
            split: None,
            archive_name: archive_name.into(),
            output_path: default_output_path(),
        }
    }

    /// Check every option invariant.
    pub fn validate(&self) -> Result<(), OptionsError> {
        validate_archive_name(&self.archive_name)?;
        self.compression_level()?;
        if !self.format.is_writable() {
            return Err(OptionsError::NotWritable {
                format: self.format.label(),
            });
        }
        if matches!(self.password.as_deref(), Some("")) {
            return Err(OptionsError::EmptyPassword);
        }
        if matches!(self.split, Some(split) if split.size == 0) {
            return Err(OptionsError::NonPositiveSplitSize);
        }
        Ok(())
    }

    /// The validated compression level.
    pub fn compression_level(&self) -> Result<CompressionLevel, OptionsError> {
        CompressionLevel::new(self.level)
    }

    /// Whether the archive is encrypted.
    pub fn encryption_enabled(&self) -> bool {
        self.password.is_some()
    }

    /// Archive file name with the format extension appended when missing.
    pub fn archive_file_name(&self) -> String {
        let extension = self.format.extension();
        if self.archive_name.to_ascii_lowercase().ends_with(&extension) {
            self.archive_name.clone()
        } else {
            format!("{}{}", self.archive_name, extension)
        }
    }

    /// Full path the archive is materialized at.
    pub fn archive_path(&self) -> PathBuf {
        self.output_path.join(self.archive_file_name())
    }
}

/// Check that an archive name is non-empty and has no path separators.
pub fn validate_archive_name(name: &str) -> Result<(), OptionsError> {
    if name.trim().is_empty() {
        return Err(OptionsError::EmptyArchiveName);
    }
    if let Some(separator) = name.chars().find(|c| matches!(c, '/' | '\\')) {
        return Err(OptionsError::ArchiveNameHasSeparator { separator });
    }
    Ok(())
}

/// Where and how extracted files are placed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter, EnumString, Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Extract to a new folder.
    #[default]
    Folder,
    /// Extract to the current location.
    Current,
    /// Extract to a custom path.
    Custom,
    /// Extract only the selected files.
    Selective,
}

/// Which archive members an extraction covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionScope {
    /// Every member.
    All,
    /// Exactly these members.
    Only(Vec<String>),
}

/// Settings for an extraction run.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
pub struct ExtractionOptions {
    /// Destination directory; empty means the configured default.
    #[builder(default)]
    #[serde(default)]
    pub extract_path: PathBuf,

    /// Archive password, if required.
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub password: Option<String>,

    /// Overwrite existing files at the destination.
    #[builder(default = "false")]
    #[serde(default)]
    pub overwrite: bool,

    /// Keep the archive's folder structure.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub preserve_structure: bool,

    /// Extraction mode.
    #[builder(default)]
    #[serde(default)]
    pub mode: ExtractionMode,

    /// Members to extract in selective mode.
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub selected_files: Option<Vec<String>>,
}

fn default_true() -> bool {
    true
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            extract_path: PathBuf::new(),
            password: None,
            overwrite: false,
            preserve_structure: true,
            mode: ExtractionMode::default(),
            selected_files: None,
        }
    }
}

impl ExtractionOptions {
    /// Create an options builder.
    pub fn builder() -> ExtractionOptionsBuilder {
        ExtractionOptionsBuilder::default()
    }

    /// The members this extraction covers.
    ///
    /// A subset only applies in selective mode; an absent or empty subset
    /// means everything.
    pub fn scope(&self) -> ExtractionScope {
        match (&self.mode, &self.selected_files) {
            (ExtractionMode::Selective, Some(files)) if !files.is_empty() => {
                ExtractionScope::Only(files.clone())
            }
            _ => ExtractionScope::All,
        }
    }

    /// Password, treating an empty string as none.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }

    /// Destination, falling back to `default` when unset.
    pub fn destination<'a>(&'a self, default: &'a Path) -> &'a Path {
        if self.extract_path.as_os_str().is_empty() {
            default
        } else {
            &self.extract_path
        }
    }
}

/// Settings for a conversion run.
///
/// Formats are kept as the strings the user chose so that an unset source
/// can be told apart from an unknown one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionOptions {
    /// Source format value; empty means detect per file.
    #[serde(default)]
    pub source_format: String,
    /// Target format value.
    pub target_format: String,
}

impl ConversionOptions {
    /// Create conversion options.
    pub fn new(source_format: impl Into<String>, target_format: impl Into<String>) -> Self {
        Self {
            source_format: source_format.into(),
            target_format: target_format.into(),
        }
    }

    /// Convert whatever format each input is detected as.
    pub fn detect_source(target_format: impl Into<String>) -> Self {
        Self::new(String::new(), target_format)
    }

    /// Parse the target format.
    pub fn target(&self) -> Result<ArchiveFormat, OptionsError> {
        if self.target_format.trim().is_empty() {
            return Err(OptionsError::MissingFormat { field: "Target" });
        }
        self.target_format.parse()
    }

    /// Parse the source format; `None` when detection is requested.
    pub fn source(&self) -> Result<Option<ArchiveFormat>, OptionsError> {
        if self.source_format.trim().is_empty() {
            return Ok(None);
        }
        self.source_format.parse().map(Some)
    }

    /// Check every option invariant.
    pub fn validate(&self) -> Result<(), OptionsError> {
        self.target()?;
        self.source()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_builder_defaults() {
        let options = CompressionOptions::builder()
            .archive_name("backup")
            .build()
            .unwrap();

        assert_eq!(options.format, ArchiveFormat::Zip);
        assert_eq!(options.level, 5);
        assert_eq!(options.method, CompressionMethod::Standard);
        assert_eq!(options.output_path, PathBuf::from("Downloads"));
        assert!(!options.encryption_enabled());
    }

    #[test]
    fn test_compression_builder_rejects_bad_values() {
        assert!(
            CompressionOptions::builder()
                .archive_name("")
                .build()
                .is_err()
        );
        assert!(CompressionOptions::builder().level(10u8).build().is_err());
        assert!(CompressionOptions::builder().password("").build().is_err());
        assert!(
            CompressionOptions::builder()
                .split(SplitSize::new(0, SplitUnit::Mb))
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_compression_validate() {
        let mut options = CompressionOptions::new("docs");
        assert!(options.validate().is_ok());

        options.archive_name = "a/b".into();
        assert_eq!(
            options.validate(),
            Err(OptionsError::ArchiveNameHasSeparator { separator: '/' })
        );

        options.archive_name = "docs".into();
        options.format = ArchiveFormat::Deb;
        assert!(matches!(
            options.validate(),
            Err(OptionsError::NotWritable { .. })
        ));
    }

    #[test]
    fn test_archive_file_name_appends_extension() {
        let mut options = CompressionOptions::new("photos");
        options.format = ArchiveFormat::TarGz;
        assert_eq!(options.archive_file_name(), "photos.tar.gz");

        options.archive_name = "photos.TAR.GZ".into();
        assert_eq!(options.archive_file_name(), "photos.TAR.GZ");
    }

    #[test]
    fn test_split_volumes() {
        let split = SplitSize::new(1, SplitUnit::Kb);
        assert_eq!(split.bytes(), 1024);
        assert_eq!(split.volumes_for(0), 1);
        assert_eq!(split.volumes_for(1024), 1);
        assert_eq!(split.volumes_for(1025), 2);
    }

    #[test]
    fn test_extraction_scope() {
        let mut options = ExtractionOptions::builder()
            .selected_files(vec!["a.txt".to_string()])
            .build()
            .unwrap();
        assert_eq!(options.scope(), ExtractionScope::All);

        options.mode = ExtractionMode::Selective;
        assert_eq!(
            options.scope(),
            ExtractionScope::Only(vec!["a.txt".to_string()])
        );

        options.selected_files = Some(vec![]);
        assert_eq!(options.scope(), ExtractionScope::All);
    }

    #[test]
    fn test_extraction_password_ignores_empty() {
        let mut options = ExtractionOptions::default();
        assert_eq!(options.password(), None);

        options.password = Some(String::new());
        assert_eq!(options.password(), None);

        options.password = Some("hunter2".to_string());
        assert_eq!(options.password(), Some("hunter2"));
    }

    #[test]
    fn test_extraction_destination_default() {
        let options = ExtractionOptions::default();
        let fallback = Path::new("Downloads/CornZip_Extracted");
        assert_eq!(options.destination(fallback), fallback);
        assert!(options.preserve_structure);
    }

    #[test]
    fn test_conversion_formats() {
        let options = ConversionOptions::new("", "7z");
        assert_eq!(options.source().unwrap(), None);
        assert_eq!(options.target().unwrap(), ArchiveFormat::SevenZip);

        let options = ConversionOptions::new("zip", "");
        assert_eq!(
            options.validate(),
            Err(OptionsError::MissingFormat { field: "Target" })
        );

        let options = ConversionOptions::new("zap", "zip");
        assert!(matches!(
            options.validate(),
            Err(OptionsError::UnknownFormat { .. })
        ));
    }
}
