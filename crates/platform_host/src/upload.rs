//! User-uploaded file contracts (custom sounds, sound-config documents).

use std::{future::Future, pin::Pin};

/// Object-safe boxed future used by [`UploadedFile`].
pub type UploadFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// A file picked by the user. Reading its contents suspends until the host has decoded it.
pub trait UploadedFile {
    /// File name as reported by the picker.
    fn name(&self) -> &str;

    /// MIME type as reported by the picker. May be empty.
    fn mime_type(&self) -> &str;

    /// Size in bytes as reported by the picker.
    fn byte_size(&self) -> u64;

    /// Reads the full contents.
    fn read_bytes(&self) -> UploadFuture<'_, Result<Vec<u8>, String>>;

    /// Reads the full contents as UTF-8 text.
    fn read_text(&self) -> UploadFuture<'_, Result<String, String>> {
        Box::pin(async move {
            let bytes = self.read_bytes().await?;
            String::from_utf8(bytes).map_err(|e| e.to_string())
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Uploaded file held in memory.
pub struct MemoryUploadedFile {
    name: String,
    mime_type: String,
    contents: Result<Vec<u8>, String>,
}

impl MemoryUploadedFile {
    /// Creates a readable file.
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            contents: Ok(bytes),
        }
    }

    /// Creates a file whose read always fails with `reason`.
    pub fn unreadable(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mime_type: String::new(),
            contents: Err(reason.into()),
        }
    }
}

impl UploadedFile for MemoryUploadedFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn byte_size(&self) -> u64 {
        self.contents
            .as_ref()
            .map(|bytes| bytes.len() as u64)
            .unwrap_or(0)
    }

    fn read_bytes(&self) -> UploadFuture<'_, Result<Vec<u8>, String>> {
        Box::pin(async move { self.contents.clone() })
    }
}
