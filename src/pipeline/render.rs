//! PDF rasterisation: turn the pages of one group into pixel buffers.
//!
//! [`PageRenderer`] is the seam between the pipeline and the document
//! library. The pipeline calls it from `spawn_blocking` workers, one group per
//! call, so an implementation only has to be `Send + Sync`; it never sees an
//! async context.
//!
//! [`PdfiumRenderer`] opens a fresh document handle for every call. pdfium
//! handles are not shareable across threads, and a per-group handle keeps the
//! workers independent at the cost of re-parsing the document's xref table,
//! which is negligible next to rasterising a page at 300 DPI.

use crate::error::Pdf2ImgError;
use crate::output::DocumentInfo;
use crate::pipeline::group::PageGroup;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::debug;

/// One rasterised source page.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// 1-based page number.
    pub page: usize,
    pub image: DynamicImage,
}

impl RenderedPage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Source of page pixels.
pub trait PageRenderer: Send + Sync {
    /// Open the document and report its page count and metadata.
    fn inspect(&self, path: &Path) -> Result<DocumentInfo, Pdf2ImgError>;

    /// Rasterise every page of `group`, in page order, at `scale` × the
    /// page's 72-DPI size.
    fn render_group(
        &self,
        path: &Path,
        group: &PageGroup,
        scale: f32,
    ) -> Result<Vec<RenderedPage>, Pdf2ImgError>;
}

/// [`PageRenderer`] backed by pdfium.
#[derive(Debug, Clone, Default)]
pub struct PdfiumRenderer {
    password: Option<String>,
}

impl PdfiumRenderer {
    pub fn new(password: Option<String>) -> Self {
        Self { password }
    }

    fn with_document<T>(
        &self,
        path: &Path,
        f: impl FnOnce(&PdfDocument<'_>) -> Result<T, Pdf2ImgError>,
    ) -> Result<T, Pdf2ImgError> {
        let pdfium = pdfium_auto::bind_pdfium()?;
        let document = pdfium
            .load_pdf_from_file(path, self.password.as_deref())
            .map_err(|e| self.open_error(path, e))?;
        f(&document)
    }

    fn open_error(&self, path: &Path, e: PdfiumError) -> Pdf2ImgError {
        let path = path.to_path_buf();
        match e {
            PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
                if self.password.is_some() {
                    Pdf2ImgError::WrongPassword { path }
                } else {
                    Pdf2ImgError::PasswordRequired { path }
                }
            }
            other => Pdf2ImgError::UnreadableDocument {
                path,
                detail: format!("{other:?}"),
            },
        }
    }
}

impl PageRenderer for PdfiumRenderer {
    fn inspect(&self, path: &Path) -> Result<DocumentInfo, Pdf2ImgError> {
        self.with_document(path, |document| {
            let metadata = document.metadata();
            let tag = |kind: PdfDocumentMetadataTagType| -> Option<String> {
                metadata
                    .get(kind)
                    .map(|t| t.value().trim().to_string())
                    .filter(|v| !v.is_empty())
            };

            Ok(DocumentInfo {
                page_count: document.pages().len() as usize,
                title: tag(PdfDocumentMetadataTagType::Title),
                author: tag(PdfDocumentMetadataTagType::Author),
                producer: tag(PdfDocumentMetadataTagType::Producer),
                pdf_version: format!("{:?}", document.version()),
            })
        })
    }

    fn render_group(
        &self,
        path: &Path,
        group: &PageGroup,
        scale: f32,
    ) -> Result<Vec<RenderedPage>, Pdf2ImgError> {
        self.with_document(path, |document| {
            let pages = document.pages();
            let render_config = PdfRenderConfig::new().scale_page_by_factor(scale);

            group
                .indices()
                .map(|idx| {
                    let page_num = idx + 1;
                    let failed = |detail: String| Pdf2ImgError::RasterisationFailed {
                        page: page_num,
                        detail,
                    };

                    let index = u16::try_from(idx)
                        .map_err(|_| failed("page index exceeds pdfium's limit".into()))?;
                    let page = pages.get(index).map_err(|e| failed(format!("{e:?}")))?;
                    let bitmap = page
                        .render_with_config(&render_config)
                        .map_err(|e| failed(format!("{e:?}")))?;
                    let image = bitmap.as_image();

                    debug!(
                        "Rendered page {} → {}x{} px",
                        page_num,
                        image.width(),
                        image.height()
                    );
                    Ok(RenderedPage {
                        page: page_num,
                        image,
                    })
                })
                .collect()
        })
    }
}
