//! # pdf2images
//!
//! Rasterise PDF pages into JPEG or PNG files, optionally stitching several
//! pages into one tall image so that a document never produces more than a
//! given number of files.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    check the file exists and has a PDF header
//!  ├─ 2. Plan     one group per page, per selected page, or ceil(N / max) pages
//!  ├─ 3. Render   rasterise each page at dpi / 72 via pdfium (spawn_blocking)
//!  ├─ 4. Compose  stack a group's pages top to bottom, left-aligned
//!  ├─ 5. Encode   JPEG (quality 1–100) or PNG
//!  └─ 6. Write    page_NNN.ext in a fresh pdf_to_images_* directory
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2images::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .dpi(150)
//!         .image_count_constraint(20)
//!         .build()?;
//!     let output = convert("document.pdf", &config).await?;
//!     for path in output.paths() {
//!         println!("{}", path.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Grouping
//!
//! With `image_count_constraint = Some(k)` and a document of `N > k` pages,
//! every image holds `ceil(N / k)` consecutive pages (the last may hold
//! fewer). Because the group size is rounded up, the number of images can be
//! noticeably below `k`: 100 pages with `k = 40` gives groups of 3 and
//! 34 images. A page selection (`pages`) always wins over the ceiling.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2images` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! pdf2images = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod query;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, OutputFormat, PageSelection};
pub use convert::{
    convert, convert_from_bytes, convert_sync, convert_with_renderer, inspect, plan_groups,
};
pub use error::Pdf2ImgError;
pub use loader::{register_loaders, LOADER_NAME};
pub use output::{ConversionOutput, ConversionStats, DocumentInfo, OutputArtifact};
pub use pipeline::group::PageGroup;
pub use pipeline::render::{PageRenderer, PdfiumRenderer, RenderedPage};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use query::{parse_argument, LoaderArgument};
