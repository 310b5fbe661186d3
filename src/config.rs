//! Configuration types for PDF-to-image conversion.
//!
//! A request is described by one [`ConversionConfig`], built with
//! [`ConversionConfigBuilder`] and validated once in
//! [`ConversionConfigBuilder::build`]. Defaults:
//!
//! | Field | Default |
//! |-------|---------|
//! | `dpi` | 300 |
//! | `format` | [`OutputFormat::Jpeg`] |
//! | `quality` | 30 |
//! | `pages` | none (every page) |
//! | `image_count_constraint` | none (one image per page) |

use crate::error::Pdf2ImgError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// PDF user space is 72 units per inch; `dpi / BASE_DPI` is the render scale.
pub const BASE_DPI: f32 = 72.0;

/// Upper bound accepted for `dpi`. A Letter page at 2400 DPI is already
/// ~20 400 × 26 400 px.
pub const MAX_DPI: u32 = 2400;

/// Configuration for a PDF-to-image conversion.
///
/// # Example
/// ```rust
/// use pdf2images::{ConversionConfig, OutputFormat};
///
/// let config = ConversionConfig::builder()
///     .dpi(150)
///     .format(OutputFormat::Png)
///     .image_count_constraint(20)
///     .build()
///     .unwrap();
/// assert_eq!(config.scale(), 150.0 / 72.0);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Rendering resolution in dots per inch. Default: 300.
    pub dpi: u32,

    /// Output codec. Default: JPEG.
    pub format: OutputFormat,

    /// JPEG quality, 1–100. Default: 30. Ignored for PNG.
    ///
    /// 30 keeps text legible while a 300-DPI page stays in the low hundreds
    /// of kilobytes, which is what matters when the images are attached to
    /// a model prompt.
    pub quality: u8,

    /// Explicit page selection. When set, every selected page becomes its own
    /// image and `image_count_constraint` is ignored.
    pub pages: Option<PageSelection>,

    /// Maximum number of images to produce. Pages are stitched vertically
    /// into groups when the document has more pages than this.
    pub image_count_constraint: Option<usize>,

    /// Number of groups rendered at the same time. Default:
    /// `min(available_parallelism, 4)`.
    ///
    /// Each in-flight group holds its decoded pages in memory, so this is a
    /// memory knob as much as a speed one.
    pub concurrency: usize,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Directory in which the per-call output directory is created.
    /// Default: the system temp directory.
    pub output_root: Option<PathBuf>,

    /// Optional per-group progress events.
    pub progress_callback: Option<ProgressCallback>,
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(4)
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            dpi: 300,
            format: OutputFormat::default(),
            quality: 30,
            pages: None,
            image_count_constraint: None,
            concurrency: default_concurrency(),
            password: None,
            output_root: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("dpi", &self.dpi)
            .field("format", &self.format)
            .field("quality", &self.quality)
            .field("pages", &self.pages)
            .field("image_count_constraint", &self.image_count_constraint)
            .field("concurrency", &self.concurrency)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("output_root", &self.output_root)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Uniform render scale applied to page width and height.
    pub fn scale(&self) -> f32 {
        self.dpi as f32 / BASE_DPI
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.config.format = format;
        self
    }

    /// JPEG quality, clamped to 1–100.
    pub fn quality(mut self, quality: u8) -> Self {
        self.config.quality = quality.clamp(1, 100);
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = Some(selection);
        self
    }

    /// A ceiling of 0 means "no ceiling".
    pub fn image_count_constraint(mut self, max_images: usize) -> Self {
        self.config.image_count_constraint = (max_images > 0).then_some(max_images);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn output_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_root = Some(dir.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2ImgError> {
        let c = &self.config;
        if c.dpi == 0 || c.dpi > MAX_DPI {
            return Err(Pdf2ImgError::InvalidConfig(format!(
                "DPI must be 1–{MAX_DPI}, got {}",
                c.dpi
            )));
        }
        if c.concurrency == 0 {
            return Err(Pdf2ImgError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Output format ────────────────────────────────────────────────────────

/// Image codec for written files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
}

impl OutputFormat {
    /// File extension used in artifact names.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
        }
    }

    /// Whether `quality` has any effect.
    pub fn is_lossy(self) -> bool {
        matches!(self, OutputFormat::Jpeg)
    }

    /// Largest width or height the codec can write.
    pub fn max_dimension(self) -> u32 {
        match self {
            OutputFormat::Jpeg => u32::from(u16::MAX),
            OutputFormat::Png => u32::MAX,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Pdf2ImgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            _ => Err(Pdf2ImgError::UnsupportedFormat {
                format: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

// ── Page selection ───────────────────────────────────────────────────────

/// A parsed `pages` expression such as `1,3-4,10`.
///
/// Page numbers are 1-based and ranges inclusive. Order and overlap in the
/// expression do not matter: [`PageSelection::to_indices`] always yields a
/// sorted set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSelection {
    spans: Vec<(usize, usize)>,
}

impl PageSelection {
    /// Inclusive `(start, end)` spans, in the order they were written.
    pub fn spans(&self) -> &[(usize, usize)] {
        &self.spans
    }

    /// Expand the selection into sorted, deduplicated 0-based page indices,
    /// dropping anything past `total_pages`.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .spans
            .iter()
            .filter(|(start, _)| *start >= 1 && *start <= total_pages)
            .flat_map(|&(start, end)| (start - 1)..end.min(total_pages))
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

impl FromStr for PageSelection {
    type Err = Pdf2ImgError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| Pdf2ImgError::InvalidPageSelection {
            input: input.to_string(),
            reason,
        };
        let page_number = |token: &str| -> Result<usize, Pdf2ImgError> {
            let token = token.trim();
            match token.parse::<usize>() {
                Ok(0) => Err(invalid("pages are numbered from 1".into())),
                Ok(n) => Ok(n),
                Err(_) => Err(invalid(format!("'{token}' is not a page number"))),
            }
        };

        let mut spans = Vec::new();
        for token in input.split(',') {
            let token = token.trim();
            if token.is_empty() {
                return Err(invalid("empty entry".into()));
            }
            let span = match token.split_once('-') {
                Some((start, end)) => {
                    let (start, end) = (page_number(start)?, page_number(end)?);
                    if start > end {
                        return Err(invalid(format!("range {start}-{end} runs backwards")));
                    }
                    (start, end)
                }
                None => {
                    let page = page_number(token)?;
                    (page, page)
                }
            };
            spans.push(span);
        }
        Ok(Self { spans })
    }
}

impl fmt::Display for PageSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (start, end)) in self.spans.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            if start == end {
                write!(f, "{start}")?;
            } else {
                write!(f, "{start}-{end}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_loader_contract() {
        let c = ConversionConfig::default();
        assert_eq!(c.dpi, 300);
        assert_eq!(c.format, OutputFormat::Jpeg);
        assert_eq!(c.quality, 30);
        assert!(c.pages.is_none());
        assert!(c.image_count_constraint.is_none());
        assert!(c.concurrency >= 1);
    }

    #[test]
    fn scale_is_dpi_over_72() {
        let c = ConversionConfig::builder().dpi(144).build().unwrap();
        assert_eq!(c.scale(), 2.0);
    }

    #[test]
    fn zero_dpi_rejected() {
        let err = ConversionConfig::builder().dpi(0).build().unwrap_err();
        assert!(matches!(err, Pdf2ImgError::InvalidConfig(_)));
    }

    #[test]
    fn huge_dpi_rejected() {
        assert!(ConversionConfig::builder().dpi(MAX_DPI + 1).build().is_err());
    }

    #[test]
    fn quality_is_clamped() {
        let c = ConversionConfig::builder().quality(0).build().unwrap();
        assert_eq!(c.quality, 1);
        let c = ConversionConfig::builder().quality(250).build().unwrap();
        assert_eq!(c.quality, 100);
    }

    #[test]
    fn zero_image_ceiling_means_unbounded() {
        let c = ConversionConfig::builder()
            .image_count_constraint(0)
            .build()
            .unwrap();
        assert_eq!(c.image_count_constraint, None);
    }

    #[test]
    fn format_parsing() {
        assert_eq!("jpg".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
        assert_eq!("JPEG".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
        assert_eq!("png".parse::<OutputFormat>().unwrap(), OutputFormat::Png);
        assert!(matches!(
            "webp".parse::<OutputFormat>(),
            Err(Pdf2ImgError::UnsupportedFormat { .. })
        ));
        assert_eq!(OutputFormat::Jpeg.extension(), "jpg");
    }

    #[test]
    fn only_jpeg_is_lossy_and_size_capped() {
        assert!(OutputFormat::Jpeg.is_lossy());
        assert!(!OutputFormat::Png.is_lossy());
        assert_eq!(OutputFormat::Jpeg.max_dimension(), 65_535);
        assert!(OutputFormat::Png.max_dimension() > 65_535);
    }

    #[test]
    fn selection_parses_lists_and_ranges() {
        let sel: PageSelection = "1,3-4".parse().unwrap();
        assert_eq!(sel.spans(), &[(1, 1), (3, 4)]);
        assert_eq!(sel.to_indices(10), vec![0, 2, 3]);
    }

    #[test]
    fn selection_sorts_and_dedups() {
        let sel: PageSelection = " 5, 2-4 ,3 ".parse().unwrap();
        assert_eq!(sel.to_indices(10), vec![1, 2, 3, 4]);
    }

    #[test]
    fn selection_clips_to_document() {
        let sel: PageSelection = "3-10,40".parse().unwrap();
        assert_eq!(sel.to_indices(4), vec![2, 3]);
        let sel: PageSelection = "12".parse().unwrap();
        assert!(sel.to_indices(4).is_empty());
    }

    #[test]
    fn malformed_selections_rejected() {
        for bad in ["", "a", "1,,2", "0", "4-2", "1-x", "-3"] {
            assert!(
                matches!(
                    bad.parse::<PageSelection>(),
                    Err(Pdf2ImgError::InvalidPageSelection { .. })
                ),
                "expected {bad:?} to be rejected"
            );
        }
    }

    #[test]
    fn selection_display_round_trips_text() {
        let sel: PageSelection = "1,3-4".parse().unwrap();
        assert_eq!(sel.to_string(), "1,3-4");
    }
}
