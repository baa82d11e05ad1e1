//! Per-request attachment staging.
//!
//! The bytes of an uploaded resume are written to a `NamedTempFile` inside
//! the upload directory. The file is unlinked when the guard is closed or
//! dropped, so every exit path of a send cleans up after itself.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::warn;

use crate::mail::transport::MailAttachment;

pub struct UploadedFile {
    file: NamedTempFile,
    pub file_name: String,
    pub content_type: Option<String>,
}

impl UploadedFile {
    pub fn stage(
        dir: &Path,
        file_name: impl Into<String>,
        content_type: Option<String>,
        bytes: &[u8],
    ) -> std::io::Result<Self> {
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(Self {
            file,
            file_name: file_name.into(),
            content_type,
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub async fn to_attachment(&self) -> std::io::Result<MailAttachment> {
        Ok(MailAttachment {
            file_name: self.file_name.clone(),
            content_type: self.content_type.clone(),
            bytes: tokio::fs::read(self.path()).await?,
        })
    }

    /// Deletes the staged file now. A failure is logged; the guard is gone either way.
    pub fn close(self) {
        let path = self.path().to_path_buf();
        if let Err(e) = self.file.close() {
            warn!("Failed to remove staged upload {}: {e}", path.display());
        }
    }
}
