//! Conversion entry points.
//!
//! [`convert`] runs the whole pipeline: validate the source, count its
//! pages, plan the output groups, then render/compose/encode/write every group
//! on a bounded pool of blocking workers. Artifacts come back in ascending
//! page order regardless of which worker finished first.
//!
//! Any group failure aborts the call. The output directory is only kept once
//! every group has been written; on error it is removed together with
//! whatever images had already landed in it.

use crate::config::{ConversionConfig, OutputFormat};
use crate::error::Pdf2ImgError;
use crate::output::{ConversionOutput, ConversionStats, DocumentInfo, OutputArtifact};
use crate::pipeline::compose::compose;
use crate::pipeline::encode::encode_image;
use crate::pipeline::group::{group_pages, group_size, single_page_groups, PageGroup};
use crate::pipeline::input;
use crate::pipeline::render::{PageRenderer, PdfiumRenderer};
use crate::pipeline::write::write_artifact;
use futures::stream::{self, StreamExt};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tempfile::TempDir;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{debug, info, warn};

/// Prefix of the per-call output directory.
pub const OUTPUT_DIR_PREFIX: &str = "pdf_to_images_";

/// Convert a PDF file into image files using pdfium.
///
/// # Errors
/// - [`Pdf2ImgError::NotFound`] / [`Pdf2ImgError::PermissionDenied`] for a bad path
/// - [`Pdf2ImgError::UnreadableDocument`] (or a password error) when pdfium
///   cannot open the file
/// - any per-group rasterisation, encoding or write failure
pub async fn convert(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2ImgError> {
    let renderer: Arc<dyn PageRenderer> = Arc::new(PdfiumRenderer::new(config.password.clone()));
    convert_with_renderer(input, config, renderer).await
}

/// [`convert`] with a caller-supplied [`PageRenderer`].
pub async fn convert_with_renderer(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
    renderer: Arc<dyn PageRenderer>,
) -> Result<ConversionOutput, Pdf2ImgError> {
    let total_start = Instant::now();

    // ── Step 1: Validate input ───────────────────────────────────────────
    let pdf_path = input::resolve_local(input)?;
    info!("Starting conversion: {}", pdf_path.display());

    // ── Step 2: Open the document for its page count ─────────────────────
    let info = {
        let renderer = Arc::clone(&renderer);
        let path = pdf_path.clone();
        run_blocking("inspect", move || renderer.inspect(&path)).await?
    };
    let total_pages = info.page_count;
    info!("PDF has {} pages", total_pages);

    // ── Step 3: Plan output groups ───────────────────────────────────────
    let groups = plan_groups(total_pages, config);
    let size = match config.pages {
        Some(_) => 1,
        None => group_size(total_pages, config.image_count_constraint),
    };
    if groups.is_empty() {
        warn!("No pages selected; nothing to render");
    }
    debug!("Planned {} images of up to {} pages", groups.len(), size);

    // ── Step 4: Fresh output directory ───────────────────────────────────
    let out_dir = create_output_dir(config)?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(groups.len());
    }

    // ── Step 5: Render, compose, encode, write ───────────────────────────
    let render_start = Instant::now();
    let artifacts = process_groups(&renderer, &pdf_path, out_dir.path(), &groups, config).await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(artifacts.len());
    }

    // ── Step 6: Hand the directory over to the caller ────────────────────
    let output_dir = out_dir.keep();

    let stats = ConversionStats {
        total_pages,
        selected_pages: groups.iter().map(PageGroup::page_count).sum(),
        output_count: artifacts.len(),
        group_size: size,
        bytes_written: artifacts.iter().map(|a| a.bytes).sum(),
        render_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {} images from {} pages in {}ms → {}",
        stats.output_count,
        stats.selected_pages,
        stats.total_duration_ms,
        output_dir.display()
    );

    Ok(ConversionOutput {
        artifacts,
        output_dir,
        stats,
    })
}

/// Synchronous wrapper around [`convert`].
///
/// Outside a tokio runtime a temporary one is created. Inside a
/// multi-threaded runtime the current worker is handed over with
/// [`tokio::task::block_in_place`]. A current-thread runtime cannot block,
/// so the conversion runs on a helper thread with its own runtime.
pub fn convert_sync(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2ImgError> {
    let input = input.as_ref().to_path_buf();
    match Handle::try_current() {
        Err(_) => block_on_new_runtime(convert(&input, config)),
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(|| handle.block_on(convert(&input, config)))
        }
        Ok(_) => std::thread::scope(|scope| {
            scope
                .spawn(|| block_on_new_runtime(convert(&input, config)))
                .join()
                .unwrap_or_else(|_| Err(Pdf2ImgError::Internal("conversion thread panicked".into())))
        }),
    }
}

fn block_on_new_runtime<T>(
    future: impl std::future::Future<Output = Result<T, Pdf2ImgError>>,
) -> Result<T, Pdf2ImgError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2ImgError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(future)
}

/// Convert PDF bytes held in memory.
///
/// The bytes are written to a managed [`tempfile`] that is removed when this
/// call returns. The images themselves land in a regular output directory.
pub async fn convert_from_bytes(
    bytes: &[u8],
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2ImgError> {
    let mut tmp = tempfile::Builder::new()
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| Pdf2ImgError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| Pdf2ImgError::Internal(format!("tempfile write: {e}")))?;
    convert(tmp.path(), config).await
}

/// Read page count and metadata without rendering anything.
pub async fn inspect(
    input: impl AsRef<Path>,
    password: Option<&str>,
) -> Result<DocumentInfo, Pdf2ImgError> {
    let pdf_path = input::resolve_local(input)?;
    let renderer = PdfiumRenderer::new(password.map(str::to_string));
    run_blocking("inspect", move || renderer.inspect(&pdf_path)).await
}

/// The groups a request produces for a document of `total_pages` pages.
///
/// With a page selection every selected page is its own group and the image
/// ceiling is ignored; otherwise the ceiling drives [`group_pages`].
pub fn plan_groups(total_pages: usize, config: &ConversionConfig) -> Vec<PageGroup> {
    match &config.pages {
        Some(selection) => {
            if selection.spans().iter().any(|&(_, end)| end > total_pages) {
                warn!(
                    "Page selection '{}' reaches past the last page ({}); extra pages ignored",
                    selection, total_pages
                );
            }
            single_page_groups(&selection.to_indices(total_pages))
        }
        None => group_pages(total_pages, config.image_count_constraint),
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn create_output_dir(config: &ConversionConfig) -> Result<TempDir, Pdf2ImgError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(OUTPUT_DIR_PREFIX);
    let created = match config.output_root {
        Some(ref root) => builder.tempdir_in(root),
        None => builder.tempdir(),
    };
    created.map_err(|source| Pdf2ImgError::OutputWriteFailed {
        path: config
            .output_root
            .clone()
            .unwrap_or_else(std::env::temp_dir),
        source,
    })
}

async fn run_blocking<T, F>(what: &str, f: F) -> Result<T, Pdf2ImgError>
where
    F: FnOnce() -> Result<T, Pdf2ImgError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Pdf2ImgError::Internal(format!("{what} task panicked: {e}")))?
}

/// Run every group through the blocking pipeline, at most
/// `config.concurrency` at a time, and return artifacts in group order.
///
/// After the first failure no new group is started, but groups already on a
/// worker are awaited so nothing is still writing into `out_dir` when the
/// caller removes it. The reported error is the one with the lowest index.
async fn process_groups(
    renderer: &Arc<dyn PageRenderer>,
    pdf_path: &Path,
    out_dir: &Path,
    groups: &[PageGroup],
    config: &ConversionConfig,
) -> Result<Vec<OutputArtifact>, Pdf2ImgError> {
    let total = groups.len();
    let scale = config.scale();
    let (format, quality) = (config.format, config.quality);
    let abort = Arc::new(AtomicBool::new(false));

    let mut outcomes: Vec<(usize, Result<OutputArtifact, Pdf2ImgError>)> =
        stream::iter(groups.iter().copied().enumerate().map(|(index, group)| {
            let renderer = Arc::clone(renderer);
            let pdf_path = pdf_path.to_path_buf();
            let out_dir = out_dir.to_path_buf();
            let callback = config.progress_callback.clone();
            let abort = Arc::clone(&abort);
            async move {
                if abort.load(Ordering::SeqCst) {
                    return None;
                }
                if let Some(ref cb) = callback {
                    cb.on_group_start(index, total, &group);
                }
                let result = run_blocking("render", move || {
                    render_group_to_file(
                        renderer.as_ref(),
                        &pdf_path,
                        &out_dir,
                        &group,
                        scale,
                        format,
                        quality,
                    )
                })
                .await;

                match &result {
                    Ok(artifact) => {
                        if let Some(ref cb) = callback {
                            cb.on_group_complete(index, total, artifact);
                        }
                    }
                    Err(e) => {
                        abort.store(true, Ordering::SeqCst);
                        warn!("Group {} (pages {}-{}) failed: {}", index, group.start, group.end, e);
                        if let Some(ref cb) = callback {
                            cb.on_group_error(index, total, &e.to_string());
                        }
                    }
                }
                Some((index, result))
            }
        }))
        .buffer_unordered(config.concurrency)
        .filter_map(|outcome| async move { outcome })
        .collect()
        .await;

    outcomes.sort_by_key(|(index, _)| *index);
    outcomes.into_iter().map(|(_, result)| result).collect()
}

/// Render, compose, encode and write a single group. Runs on a blocking
/// worker.
fn render_group_to_file(
    renderer: &dyn PageRenderer,
    pdf_path: &Path,
    out_dir: &Path,
    group: &PageGroup,
    scale: f32,
    format: OutputFormat,
    quality: u8,
) -> Result<OutputArtifact, Pdf2ImgError> {
    let pages = renderer.render_group(pdf_path, group, scale)?;
    if pages.len() != group.page_count() {
        return Err(Pdf2ImgError::RasterisationFailed {
            page: group.start,
            detail: format!(
                "renderer returned {} of {} pages",
                pages.len(),
                group.page_count()
            ),
        });
    }

    let image = compose(pages, format)?;
    let encoded =
        encode_image(&image, format, quality).map_err(|e| Pdf2ImgError::EncodeFailed {
            first_page: group.start,
            detail: e.to_string(),
        })?;
    write_artifact(
        out_dir,
        group,
        format,
        &encoded,
        (image.width(), image.height()),
    )
}
