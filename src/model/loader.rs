//! Model file loading.

use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::{AippError, Result};

/// Memory-mapped model file for zero-copy decoding.
/// Uses memmap2 for cross-platform support.
#[derive(Debug)]
pub struct MappedModel {
    mmap: Mmap,
    path: PathBuf,
}

impl MappedModel {
    /// Memory-map a model file of at most `max_bytes` bytes.
    pub fn open(path: impl AsRef<Path>, max_bytes: u64) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        if size == 0 {
            return Err(AippError::InvalidArgument(format!(
                "model file {} is empty",
                path.display()
            )));
        }
        if size > max_bytes {
            tracing::error!(path = %path.display(), size, max_bytes, "model file exceeds size limit");
            return Err(AippError::InvalidArgument(format!(
                "model file {} is {} bytes, limit is {}",
                path.display(),
                size,
                max_bytes
            )));
        }
        // SAFETY: File is opened read-only, model files are not modified while mapped
        let mmap = unsafe { Mmap::map(&file)? };
        tracing::debug!(path = %path.display(), size, "mapped model file");
        Ok(Self {
            mmap,
            path: path.to_path_buf(),
        })
    }

    /// Model data as a byte slice (zero-copy).
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stem of the file name, used as the default model name.
    pub fn name(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
    }

    /// Length of mapped data in bytes.
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Check if mapped region is empty.
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn maps_file_contents() {
        let mut file = tempfile::Builder::new().suffix(".om").tempfile().unwrap();
        file.write_all(b"model-bytes").unwrap();
        let mapped = MappedModel::open(file.path(), 1024).unwrap();
        assert_eq!(mapped.as_bytes(), b"model-bytes");
        assert_eq!(mapped.len(), 11);
        assert!(!mapped.name().is_empty());
    }

    #[test]
    fn enforces_size_limit() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 64]).unwrap();
        assert!(matches!(
            MappedModel::open(file.path(), 32),
            Err(AippError::InvalidArgument(_))
        ));
    }

    #[test]
    fn empty_and_missing_files_fail() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(MappedModel::open(file.path(), 32).is_err());
        assert!(matches!(
            MappedModel::open("/nonexistent/model.om", 32),
            Err(AippError::Io(_))
        ));
    }
}
