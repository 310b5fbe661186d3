//! CLI binary for pdf2images.
//!
//! Maps flags to `ConversionConfig`, runs the conversion and prints one
//! image path per line (or the whole `ConversionOutput` as JSON).

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2images::pipeline::write::artifact_name;
use pdf2images::{
    convert, inspect, plan_groups, ConversionConfig, ConversionProgressCallback, OutputArtifact,
    OutputFormat, PageGroup, PageSelection, ProgressCallback,
};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Live progress bar plus one log line per written image. Groups finish out
/// of order when `--concurrency` > 1.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliProgressCallback {
    /// Spinner until `on_conversion_start` tells us how many images to expect.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} images  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Rendering");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self, index: usize) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut times| times.remove(&index))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_outputs: usize) {
        self.activate_bar(total_outputs);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Writing {total_outputs} images…"))
        ));
    }

    fn on_group_start(&self, index: usize, _total: usize, group: &PageGroup) {
        if let Ok(mut times) = self.start_times.lock() {
            times.insert(index, Instant::now());
        }
        if group.is_single() {
            self.bar.set_message(format!("page {}", group.start));
        } else {
            self.bar
                .set_message(format!("pages {}-{}", group.start, group.end));
        }
    }

    fn on_group_complete(&self, index: usize, total: usize, artifact: &OutputArtifact) {
        let secs = self.elapsed_secs(index);
        let name = artifact
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {:<14} {}  {}",
            green("✓"),
            index + 1,
            total,
            name,
            dim(&format!("{}x{} {:>8} B", artifact.width, artifact.height, artifact.bytes)),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_group_error(&self, index: usize, total: usize, error: &str) {
        let secs = self.elapsed_secs(index);

        let msg = match error.char_indices().nth(79) {
            Some((cut, _)) => format!("{}\u{2026}", &error[..cut]),
            None => error.to_string(),
        };

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            red("✗"),
            index + 1,
            total,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.abandon();
    }

    fn on_conversion_complete(&self, total_outputs: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} images written",
            green("✔"),
            bold(&total_outputs.to_string())
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # One JPEG per page at 300 DPI
  pdf2images document.pdf

  # At most 10 images; pages are stacked vertically to fit
  pdf2images --max-images 10 book.pdf

  # Specific pages as PNG
  pdf2images --pages 1,3-4 --format png paper.pdf

  # Plan only: list the files that would be written
  pdf2images --dry-run --max-images 40 book.pdf

  # Inspect PDF metadata
  pdf2images --inspect-only document.pdf

  # JSON output with per-image dimensions
  pdf2images --json document.pdf > output.json

OUTPUT:
  Images are written to a fresh directory named pdf_to_images_XXXXXX under
  --output-root (default: the system temp dir). Each file is named after the
  first page it contains: page_001.jpg, page_004.jpg, ...

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to an existing libpdfium; skips auto-download
  PDFIUM_AUTO_CACHE_DIR   Override the default pdfium cache directory
  RUST_LOG                Override the log filter (e.g. pdf2images=debug)

  PDFium (~30 MB) is downloaded automatically on first run and cached in
  ~/.cache/pdf2images/pdfium-7690/.
"#;

/// Rasterise PDF pages to JPEG or PNG files.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2images",
    version,
    about = "Rasterise PDF pages to JPEG or PNG files",
    long_about = "Render every page (or a selection) of a PDF to image files. With \
--max-images, consecutive pages are stacked into one tall image so that no more than that \
many files are produced.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path.
    input: PathBuf,

    /// Rendering DPI (1–2400).
    #[arg(long, env = "PDF2IMAGES_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(1..=2400))]
    dpi: u32,

    /// Image format.
    #[arg(long, env = "PDF2IMAGES_FORMAT", value_enum, default_value = "jpg")]
    format: FormatArg,

    /// JPEG quality (1–100) [default: 30]. Ignored for PNG.
    #[arg(long, env = "PDF2IMAGES_QUALITY",
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: Option<u8>,

    /// Page selection: 5, 3-15 or 1,3-4,7. Overrides --max-images.
    #[arg(long, env = "PDF2IMAGES_PAGES")]
    pages: Option<String>,

    /// Maximum number of images; pages are stitched when exceeded. 0 = no limit.
    #[arg(long = "max-images", env = "PDF2IMAGES_MAX_IMAGES")]
    max_images: Option<usize>,

    /// Number of images rendered at the same time.
    #[arg(short, long, env = "PDF2IMAGES_CONCURRENCY")]
    concurrency: Option<usize>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2IMAGES_PASSWORD")]
    password: Option<String>,

    /// Directory in which the output directory is created.
    #[arg(long, env = "PDF2IMAGES_OUTPUT_ROOT")]
    output_root: Option<PathBuf>,

    /// Output structured JSON (ConversionOutput) instead of paths.
    #[arg(long, env = "PDF2IMAGES_JSON")]
    json: bool,

    /// Print PDF metadata only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Print the planned file names without rendering.
    #[arg(long)]
    dry_run: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2IMAGES_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2IMAGES_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2IMAGES_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    #[value(alias = "jpeg")]
    Jpg,
    Png,
}

impl From<FormatArg> for OutputFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Jpg => OutputFormat::Jpeg,
            FormatArg::Png => OutputFormat::Png,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs unless --verbose is set.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.dry_run;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    ensure_pdfium(cli.quiet)?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let info = inspect(&cli.input, cli.password.as_deref())
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&info).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", cli.input.display());
            if let Some(ref t) = info.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = info.author {
                println!("Author:       {}", a);
            }
            println!("Pages:        {}", info.page_count);
            println!("PDF Version:  {}", info.pdf_version);
            if let Some(ref p) = info.producer {
                println!("Producer:     {}", p);
            }
        }
        return Ok(());
    }

    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Dry run ──────────────────────────────────────────────────────────
    if cli.dry_run {
        let info = inspect(&cli.input, cli.password.as_deref())
            .await
            .context("Failed to inspect PDF")?;
        let groups = plan_groups(info.page_count, &config);

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&groups).context("Failed to serialise plan")?
            );
        } else {
            for group in &groups {
                println!(
                    "{}  {}",
                    artifact_name(group.start, config.format),
                    dim(&format!("pages {}-{}", group.start, group.end))
                );
            }
            if !cli.quiet {
                eprintln!(
                    "{} images planned from {} pages",
                    bold(&groups.len().to_string()),
                    info.page_count
                );
            }
        }
        return Ok(());
    }

    // ── Run conversion ───────────────────────────────────────────────────
    let output = convert(&cli.input, &config)
        .await
        .context("Conversion failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        for path in output.paths() {
            println!("{}", path.display());
        }
        if !cli.quiet {
            eprintln!(
                "{}  {} images from {}/{} pages  {}ms  →  {}",
                green("✔"),
                output.stats.output_count,
                output.stats.selected_pages,
                output.stats.total_pages,
                output.stats.total_duration_ms,
                bold(&output.output_dir.display().to_string()),
            );
        }
    }

    Ok(())
}

/// Make sure a pdfium shared library is on disk, downloading it on the
/// first run. Later startups only do a path check.
fn ensure_pdfium(quiet: bool) -> Result<()> {
    if pdfium_auto::is_available_locally() {
        return Ok(());
    }

    if quiet {
        tokio::task::block_in_place(|| pdfium_auto::ensure_library(None))
            .context("Failed to download PDFium engine")?;
        return Ok(());
    }

    let dl_bar = ProgressBar::new(0);
    dl_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS),
    );
    dl_bar.set_prefix("PDF engine");
    dl_bar.set_message("Connecting…");
    dl_bar.enable_steady_tick(Duration::from_millis(80));

    let bar = dl_bar.clone();
    tokio::task::block_in_place(|| {
        pdfium_auto::ensure_library(Some(&|downloaded, total| {
            if let Some(t) = total {
                if bar.length().unwrap_or(0) != t {
                    bar.set_length(t);
                }
            }
            bar.set_position(downloaded);
        }))
    })
    .context("Failed to download PDFium engine")?;

    dl_bar.finish_with_message("ready ✓");
    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let format: OutputFormat = cli.format.into();
    let mut builder = ConversionConfig::builder().dpi(cli.dpi).format(format);

    if let Some(quality) = cli.quality {
        if !format.is_lossy() && !cli.quiet {
            eprintln!(
                "{} --quality has no effect on {} output",
                dim("note:"),
                format
            );
        }
        builder = builder.quality(quality);
    }

    if let Some(ref pages) = cli.pages {
        let selection: PageSelection = pages.parse().context("Invalid --pages")?;
        builder = builder.pages(selection);
    }
    if let Some(max) = cli.max_images {
        builder = builder.image_count_constraint(max);
    }
    if let Some(n) = cli.concurrency {
        builder = builder.concurrency(n);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(ref root) = cli.output_root {
        builder = builder.output_root(root.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
