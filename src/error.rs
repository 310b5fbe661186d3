//! Error type for the pdf2images library.
//!
//! Every failure is fatal to the `convert` call that hit it. A page that
//! cannot be rendered, encoded or written aborts the whole conversion instead
//! of being skipped: callers map artifact *N* back to its source pages by
//! position and file name, and a silently missing image would shift that
//! mapping without any visible sign.
//!
//! The variants fall into a few families:
//!
//! * input — [`Pdf2ImgError::NotFound`], [`Pdf2ImgError::PermissionDenied`]
//! * document — [`Pdf2ImgError::UnreadableDocument`] and the password variants
//! * request — format, page selection and argument validation, all raised
//!   before the first page is rendered
//! * per-group — rasterisation, compositing, encoding and writing

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdf2images library.
#[derive(Debug, Error)]
pub enum Pdf2ImgError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Source path does not exist.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    NotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    // ── Document errors ───────────────────────────────────────────────────
    /// The file exists but pdfium could not open or parse it.
    #[error("Cannot read document '{path}': {detail}")]
    UnreadableDocument { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    // ── Request errors ────────────────────────────────────────────────────
    /// Output format is not one of `jpg`, `jpeg`, `png`.
    #[error("Unsupported image format: '{format}' (expected jpg, jpeg or png)")]
    UnsupportedFormat { format: String },

    /// The `pages` expression could not be parsed.
    #[error("Invalid page selection '{input}': {reason}")]
    InvalidPageSelection { input: String, reason: String },

    /// A loader argument had a value of the wrong shape (e.g. `dpi=abc`).
    #[error("Invalid value for '{key}': '{value}'")]
    InvalidArgument { key: String, value: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Per-group errors ──────────────────────────────────────────────────
    /// pdfium failed to rasterise a page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// The image for a group would exceed the output format's maximum
    /// dimension or the compositing memory budget.
    #[error(
        "Image for pages {first_page}-{last_page} would be too large for the output format.\n\
Lower the DPI or allow more images so fewer pages are stacked together."
    )]
    CompositeTooLarge { first_page: usize, last_page: usize },

    /// The image codec rejected the pixel buffer.
    #[error("Encoding the image starting at page {first_page} failed: {detail}")]
    EncodeFailed { first_page: usize, detail: String },

    /// Could not create the output directory or write an image file.
    #[error("Failed to write output '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first run.\n\
If the auto-download failed, you can:\n\
  • Check your internet connection and try again.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<pdfium_auto::PdfiumAutoError> for Pdf2ImgError {
    fn from(e: pdfium_auto::PdfiumAutoError) -> Self {
        Pdf2ImgError::PdfiumBindingFailed(e.to_string())
    }
}
