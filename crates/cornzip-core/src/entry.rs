//! Archive member listing types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Type of archive member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
}

/// A single member of an archive, as shown in an extraction preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    /// Member name (last path component).
    pub name: String,
    /// Full path inside the archive.
    pub path: String,
    /// Size in bytes (aggregate for directories).
    pub size: u64,
    /// File or directory.
    pub kind: EntryKind,
    /// Last modification time.
    pub modified_at: DateTime<Utc>,
}

impl ArchiveEntry {
    /// Create a file entry.
    pub fn file(path: impl Into<String>, size: u64, modified_at: DateTime<Utc>) -> Self {
        let path = path.into();
        Self {
            name: last_component(&path),
            path,
            size,
            kind: EntryKind::File,
            modified_at,
        }
    }

    /// Create a directory entry.
    pub fn directory(path: impl Into<String>, size: u64, modified_at: DateTime<Utc>) -> Self {
        let path = path.into();
        Self {
            name: last_component(&path),
            path,
            size,
            kind: EntryKind::Directory,
            modified_at,
        }
    }

    /// Check if this entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Check if this entry is a file.
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

fn last_component(path: &str) -> String {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_names() {
        let now = Utc::now();
        let file = ArchiveEntry::file("/images/photo1.jpg", 3_100_000, now);
        assert_eq!(file.name, "photo1.jpg");
        assert!(file.is_file());

        let dir = ArchiveEntry::directory("/images/", 0, now);
        assert_eq!(dir.name, "images");
        assert!(dir.is_dir());
    }
}
