//! Registration hook for hosts that resolve named fragment loaders.
//!
//! A host hands every loader a single string argument and expects a list of
//! files back. This module exposes the conversion under the name
//! [`LOADER_NAME`]:
//!
//! ```rust
//! use pdf2images::loader::{register_loaders, FragmentLoader, LOADER_NAME};
//! use std::collections::HashMap;
//!
//! let mut loaders: HashMap<&'static str, FragmentLoader> = HashMap::new();
//! register_loaders(&mut |name, loader| {
//!     loaders.insert(name, loader);
//! });
//! assert!(loaders.contains_key(LOADER_NAME));
//! ```

use crate::convert::convert_sync;
use crate::error::Pdf2ImgError;
use crate::output::OutputArtifact;
use crate::query::parse_argument;
use tracing::info;

/// Name the PDF loader is registered under.
pub const LOADER_NAME: &str = "pdf-to-images";

/// Signature shared by all loaders: argument string in, files out.
pub type FragmentLoader = fn(&str) -> Result<Vec<OutputArtifact>, Pdf2ImgError>;

/// Register every loader this crate provides.
pub fn register_loaders(register: &mut impl FnMut(&'static str, FragmentLoader)) {
    register(LOADER_NAME, pdf_to_images_loader);
}

/// Convert `path?options` into image files.
///
/// Blocks the calling thread until every image is written. Safe to call
/// from inside a tokio runtime, see [`convert_sync`].
pub fn pdf_to_images_loader(argument: &str) -> Result<Vec<OutputArtifact>, Pdf2ImgError> {
    let parsed = parse_argument(argument)?;
    info!("Loading {} as images", parsed.path.display());
    let output = convert_sync(&parsed.path, &parsed.config)?;
    Ok(output.artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_pdf_loader_once() {
        let mut names = Vec::new();
        register_loaders(&mut |name, _| names.push(name));
        assert_eq!(names, vec!["pdf-to-images"]);
    }

    #[test]
    fn bad_argument_fails_before_touching_disk() {
        let err = pdf_to_images_loader("missing.pdf?format=tiff").unwrap_err();
        assert!(matches!(err, Pdf2ImgError::UnsupportedFormat { .. }));
    }

    #[test]
    fn missing_source_is_not_found() {
        let err = pdf_to_images_loader("/no/such/dir/file.pdf?dpi=72").unwrap_err();
        assert!(matches!(err, Pdf2ImgError::NotFound { .. }));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn callable_from_multi_thread_runtime() {
        let err = pdf_to_images_loader("/no/such/dir/file.pdf").unwrap_err();
        assert!(matches!(err, Pdf2ImgError::NotFound { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn callable_from_current_thread_runtime() {
        let err = pdf_to_images_loader("/no/such/dir/file.pdf").unwrap_err();
        assert!(matches!(err, Pdf2ImgError::NotFound { .. }), "{err:?}");
    }
}
