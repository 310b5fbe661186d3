//! Input validation: make sure the source is a readable PDF before any
//! worker is started.

use crate::error::Pdf2ImgError;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// pdfium accepts a header anywhere in the first KiB of the file.
const HEADER_WINDOW: usize = 1024;

/// Validate that `path` exists, can be read and looks like a PDF.
pub fn resolve_local(path: impl AsRef<Path>) -> Result<PathBuf, Pdf2ImgError> {
    let path = path.as_ref().to_path_buf();

    if !path.exists() {
        return Err(Pdf2ImgError::NotFound { path });
    }
    if !path.is_file() {
        return Err(Pdf2ImgError::UnreadableDocument {
            path,
            detail: "not a regular file".into(),
        });
    }

    let mut file = match File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            return Err(Pdf2ImgError::PermissionDenied { path });
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(Pdf2ImgError::NotFound { path });
        }
        Err(e) => {
            return Err(Pdf2ImgError::UnreadableDocument {
                path,
                detail: e.to_string(),
            });
        }
    };

    let mut head = Vec::with_capacity(HEADER_WINDOW);
    if let Err(e) = file.by_ref().take(HEADER_WINDOW as u64).read_to_end(&mut head) {
        return Err(Pdf2ImgError::UnreadableDocument {
            path,
            detail: e.to_string(),
        });
    }
    if !head.windows(5).any(|w| w == b"%PDF-") {
        return Err(Pdf2ImgError::UnreadableDocument {
            path,
            detail: "no %PDF- header".into(),
        });
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}
