//! Archive format catalog and filename classification.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator};

use crate::error::OptionsError;
use crate::input::InputFileRef;

/// A recognized archive or compressed-stream format.
///
/// Declaration order is catalog order; [`ArchiveFormat::all`] yields the
/// formats in the order they are offered to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Serialize, Deserialize)]
pub enum ArchiveFormat {
    #[serde(rename = "zip")]
    Zip,
    #[serde(rename = "7z")]
    SevenZip,
    #[serde(rename = "rar")]
    Rar,
    #[serde(rename = "tar")]
    Tar,
    #[serde(rename = "tar.gz")]
    TarGz,
    #[serde(rename = "tar.bz2")]
    TarBz2,
    #[serde(rename = "tar.xz")]
    TarXz,
    #[serde(rename = "iso")]
    Iso,
    #[serde(rename = "cab")]
    Cab,
    #[serde(rename = "arj")]
    Arj,
    #[serde(rename = "lzh")]
    Lzh,
    #[serde(rename = "ace")]
    Ace,
    #[serde(rename = "jar")]
    Jar,
    #[serde(rename = "war")]
    War,
    #[serde(rename = "ear")]
    Ear,
    #[serde(rename = "apk")]
    Apk,
    #[serde(rename = "deb")]
    Deb,
    #[serde(rename = "rpm")]
    Rpm,
    #[serde(rename = "dmg")]
    Dmg,
    #[serde(rename = "wim")]
    Wim,
    #[serde(rename = "gz")]
    Gz,
    #[serde(rename = "bz2")]
    Bz2,
    #[serde(rename = "xz")]
    Xz,
}

impl ArchiveFormat {
    /// The canonical value string, e.g. `"tar.gz"`.
    pub fn value(&self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::SevenZip => "7z",
            Self::Rar => "rar",
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
            Self::TarBz2 => "tar.bz2",
            Self::TarXz => "tar.xz",
            Self::Iso => "iso",
            Self::Cab => "cab",
            Self::Arj => "arj",
            Self::Lzh => "lzh",
            Self::Ace => "ace",
            Self::Jar => "jar",
            Self::War => "war",
            Self::Ear => "ear",
            Self::Apk => "apk",
            Self::Deb => "deb",
            Self::Rpm => "rpm",
            Self::Dmg => "dmg",
            Self::Wim => "wim",
            Self::Gz => "gz",
            Self::Bz2 => "bz2",
            Self::Xz => "xz",
        }
    }

    /// Upper-case display label, e.g. `"TAR.GZ"`.
    pub fn label(&self) -> String {
        self.value().to_ascii_uppercase()
    }

    /// Canonical file extension including the leading dot.
    pub fn extension(&self) -> String {
        format!(".{}", self.value())
    }

    /// Alternative extensions that also identify this format.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::TarGz => &[".tgz"],
            Self::TarBz2 => &[".tbz", ".tbz2"],
            Self::TarXz => &[".txz"],
            Self::Wim => &[".swm", ".esd"],
            _ => &[],
        }
    }

    /// Short description shown next to the format in pickers.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Zip => "Universal compatibility",
            Self::SevenZip => "Best compression ratio",
            Self::Rar => "WinRAR format",
            Self::Tar => "Uncompressed tape archive",
            Self::TarGz => "Unix/Linux standard",
            Self::TarBz2 => "Better compression",
            Self::TarXz => "Excellent compression",
            Self::Iso => "Disc image format",
            Self::Cab => "Windows cabinet",
            Self::Arj => "Legacy DOS archive",
            Self::Lzh => "LHA archive",
            Self::Ace => "Legacy WinAce archive",
            Self::Jar => "Java archive",
            Self::War => "Java web application archive",
            Self::Ear => "Java enterprise archive",
            Self::Apk => "Android package",
            Self::Deb => "Debian package",
            Self::Rpm => "RPM package",
            Self::Dmg => "macOS disk image",
            Self::Wim => "Windows imaging",
            Self::Gz => "Gzip stream",
            Self::Bz2 => "Bzip2 stream",
            Self::Xz => "XZ stream",
        }
    }

    /// Whether archives of this format can be created by a compression run.
    pub fn is_writable(&self) -> bool {
        matches!(
            self,
            Self::Zip
                | Self::SevenZip
                | Self::TarGz
                | Self::TarBz2
                | Self::TarXz
                | Self::Rar
                | Self::Iso
                | Self::Wim
        )
    }

    /// Iterate over the whole catalog in order.
    pub fn all() -> impl Iterator<Item = ArchiveFormat> {
        Self::iter()
    }

    /// Iterate over the writable formats in catalog order.
    pub fn writable() -> impl Iterator<Item = ArchiveFormat> {
        Self::iter().filter(ArchiveFormat::is_writable)
    }

    /// All suffixes (canonical and alias) that identify this format.
    fn suffixes(self) -> impl Iterator<Item = String> {
        std::iter::once(self.extension())
            .chain(self.aliases().iter().map(|s| s.to_string()))
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}

impl FromStr for ArchiveFormat {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_start_matches('.');
        Self::iter()
            .find(|format| format.value().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| OptionsError::UnknownFormat {
                value: s.to_string(),
            })
    }
}

/// Classify a filename by its extension.
///
/// Matching is case-insensitive and the longest matching suffix wins, so
/// `backup.tar.gz` is [`ArchiveFormat::TarGz`] rather than
/// [`ArchiveFormat::Gz`].
pub fn classify(filename: &str) -> Option<ArchiveFormat> {
    let name = filename.to_ascii_lowercase();

    ArchiveFormat::iter()
        .flat_map(|format| format.suffixes().map(move |suffix| (suffix, format)))
        .filter(|(suffix, _)| name.ends_with(suffix.as_str()))
        .max_by_key(|(suffix, _)| suffix.len())
        .map(|(_, format)| format)
}

/// Check whether a filename names a known archive.
pub fn is_archive(filename: &str) -> bool {
    classify(filename).is_some()
}

/// Inputs split into recognized archives and excluded names.
#[derive(Debug, Clone, Default)]
pub struct ArchivePartition {
    /// Inputs that classified as an archive, with their detected format.
    pub accepted: Vec<(InputFileRef, ArchiveFormat)>,
    /// Names of inputs that are not archives.
    pub excluded: Vec<String>,
}

impl ArchivePartition {
    /// Whether no input was recognized.
    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }
}

/// Partition inputs into archives and non-archives, preserving order.
pub fn partition_archives(inputs: Vec<InputFileRef>) -> ArchivePartition {
    let mut partition = ArchivePartition::default();

    for input in inputs {
        match classify(&input.name) {
            Some(format) => partition.accepted.push((input, format)),
            None => partition.excluded.push(input.name),
        }
    }

    partition
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_compound_extension() {
        assert_eq!(classify("archive.tar.gz"), Some(ArchiveFormat::TarGz));
        assert_eq!(classify("archive.gz"), Some(ArchiveFormat::Gz));
        assert_eq!(classify("logs.tar.xz"), Some(ArchiveFormat::TarXz));
        assert_eq!(classify("logs.tar"), Some(ArchiveFormat::Tar));
    }

    #[test]
    fn test_classify_aliases() {
        assert_eq!(classify("src.tgz"), Some(ArchiveFormat::TarGz));
        assert_eq!(classify("src.TBZ2"), Some(ArchiveFormat::TarBz2));
        assert_eq!(classify("install.esd"), Some(ArchiveFormat::Wim));
    }

    #[test]
    fn test_classify_rejects_non_archives() {
        assert_eq!(classify("notes.txt"), None);
        assert_eq!(classify("zip"), None);
        assert_eq!(classify(""), None);
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            "TAR.GZ".parse::<ArchiveFormat>().unwrap(),
            ArchiveFormat::TarGz
        );
        assert_eq!(
            ".7z".parse::<ArchiveFormat>().unwrap(),
            ArchiveFormat::SevenZip
        );
        assert!("".parse::<ArchiveFormat>().is_err());
        assert!("tar.zst".parse::<ArchiveFormat>().is_err());
    }

    #[test]
    fn test_writable_subset() {
        let writable: Vec<_> = ArchiveFormat::writable().collect();
        assert_eq!(writable.len(), 8);
        assert!(!ArchiveFormat::Deb.is_writable());
    }
}
