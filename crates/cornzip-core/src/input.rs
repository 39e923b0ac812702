//! References to user-selected input files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Opaque handle to the content of an input file.
///
/// The pipeline never reads through this handle; it is carried unchanged to
/// the codec engine.
#[derive(Debug, Clone, Default)]
pub enum ContentHandle {
    /// Content lives on disk at this path.
    Path(PathBuf),
    /// Content is held in memory.
    Memory(Arc<[u8]>),
    /// No content is attached (size-only reference).
    #[default]
    Detached,
}

/// A user-selected file: name, length and content handle.
#[derive(Debug, Clone)]
pub struct InputFileRef {
    /// File name as selected (no directory components required).
    pub name: String,
    /// Length in bytes.
    pub size: u64,
    /// Handle to the content.
    pub content: ContentHandle,
}

impl InputFileRef {
    /// Create a size-only reference.
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            content: ContentHandle::Detached,
        }
    }

    /// Create a reference to a file on disk with a known size.
    pub fn from_path(path: impl Into<PathBuf>, size: u64) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Self {
            name,
            size,
            content: ContentHandle::Path(path),
        }
    }

    /// Create a reference to an in-memory buffer.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            content: ContentHandle::Memory(bytes),
        }
    }

    /// The on-disk path, if the content lives on disk.
    pub fn path(&self) -> Option<&Path> {
        match &self.content {
            ContentHandle::Path(path) => Some(path),
            _ => None,
        }
    }
}

/// Sum of the byte lengths of `inputs`.
pub fn total_size<'a>(inputs: impl IntoIterator<Item = &'a InputFileRef>) -> u64 {
    inputs
        .into_iter()
        .fold(0u64, |total, input| total.saturating_add(input.size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path_uses_file_name() {
        let input = InputFileRef::from_path("/home/user/report.pdf", 42);
        assert_eq!(input.name, "report.pdf");
        assert_eq!(input.path(), Some(Path::new("/home/user/report.pdf")));
    }

    #[test]
    fn test_from_bytes_size() {
        let input = InputFileRef::from_bytes("a.txt", b"hello".to_vec());
        assert_eq!(input.size, 5);
        assert!(input.path().is_none());
    }

    #[test]
    fn test_total_size() {
        let inputs = vec![InputFileRef::new("a", 10), InputFileRef::new("b", 32)];
        assert_eq!(total_size(&inputs), 42);
    }
}
