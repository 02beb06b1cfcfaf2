//! Uploaded documents: the bytes a user hands over, plus a display name.
//!
//! The renderer works on bytes in memory, so a document read from disk and
//! one received from an upload widget look the same from here on. The name
//! only feeds error messages and logs.

use crate::error::AtsError;
use std::path::Path;
use tracing::debug;

/// PDF files start with this signature.
pub const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Raw bytes of a user-supplied document.
#[derive(Clone)]
pub struct UploadedDocument {
    name: String,
    bytes: Vec<u8>,
}

impl std::fmt::Debug for UploadedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedDocument")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl UploadedDocument {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a document from a local file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AtsError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| AtsError::DocumentUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        debug!("Read '{}' ({} bytes)", name, bytes.len());
        Ok(Self { name, bytes })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// `true` if the bytes start with the `%PDF` signature.
    pub fn has_pdf_magic(&self) -> bool {
        self.bytes.starts_with(PDF_MAGIC)
    }

    /// First bytes of the document, for diagnostics.
    pub(crate) fn magic(&self) -> [u8; 4] {
        let mut magic = [0u8; 4];
        let n = self.bytes.len().min(4);
        magic[..n].copy_from_slice(&self.bytes[..n]);
        magic
    }
}
