//! Pipeline stages for PDF-to-image conversion.
//!
//! Each submodule implements exactly one transformation step.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ group ──▶ render ──▶ compose ──▶ encode ──▶ write
//! (path)   (plan)    (pdfium)   (stitch)    (jpg/png)  (page_NNN.ext)
//! ```
//!
//! 1. [`input`]   — check the source exists and carries a PDF header
//! 2. [`group`]   — decide which pages share an output image
//! 3. [`render`]  — rasterise a group's pages; runs in `spawn_blocking`
//!    because pdfium is CPU-bound and not async-safe
//! 4. [`compose`] — stack a multi-page group into one RGB image
//! 5. [`encode`]  — JPEG (with quality) or PNG bytes
//! 6. [`write`]   — name the file after its first page and write it atomically

pub mod compose;
pub mod encode;
pub mod group;
pub mod input;
pub mod render;
pub mod write;
