//! # pdfium-auto
//!
//! Make a PDFium shared library available to `pdfium-render` without any
//! manual setup.
//!
//! Resolution order, first hit wins:
//!
//! 1. `PDFIUM_LIB_PATH` pointing at an existing library file.
//! 2. A previously downloaded copy in the per-release cache directory
//!    (see [`cache_dir`]).
//! 3. A fresh download of the platform archive from
//!    [bblanchon/pdfium-binaries](https://github.com/bblanchon/pdfium-binaries),
//!    from which only the shared library is extracted.
//!
//! ```rust,no_run
//! let pdfium = pdfium_auto::bind_pdfium().expect("PDFium unavailable");
//! let document = pdfium.load_pdf_from_file("input.pdf", None).unwrap();
//! println!("{} pages", document.pages().len());
//! ```
//!
//! The resolved path is memoised for the lifetime of the process, so only the
//! first call can touch the network.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use pdfium_render::prelude::Pdfium;
use thiserror::Error;

/// pdfium-binaries release tag (`chromium/<PDFIUM_RELEASE>`).
pub const PDFIUM_RELEASE: &str = "7690";

const RELEASE_BASE_URL: &str = "https://github.com/bblanchon/pdfium-binaries/releases/download";

/// Environment variable naming an existing pdfium library.
pub const LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Environment variable overriding the cache root.
pub const CACHE_DIR_ENV: &str = "PDFIUM_AUTO_CACHE_DIR";

/// Download progress hook: `(bytes_so_far, content_length)`.
pub type ProgressFn<'a> = &'a dyn Fn(u64, Option<u64>);

#[derive(Error, Debug)]
pub enum PdfiumAutoError {
    #[error("No prebuilt PDFium for {os}/{arch}; set {LIB_PATH_ENV} to a local build")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("Cannot prepare cache directory '{path}': {source}")]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Download of {url} failed: {reason}")]
    Download { url: String, reason: String },

    #[error("Could not extract '{member}' from the PDFium archive: {reason}")]
    Extract { member: String, reason: String },

    #[error("Failed to bind PDFium from '{path}': {reason}")]
    Bind { path: PathBuf, reason: String },
}

/// Where a platform's library lives inside the release archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub archive: &'static str,
    pub member: &'static str,
    pub file_name: &'static str,
}

impl Platform {
    const fn layout(archive: &'static str, file_name: &'static str, member: &'static str) -> Self {
        Self {
            archive,
            member,
            file_name,
        }
    }

    /// Look up the archive layout for an `(os, arch)` pair as reported by
    /// [`std::env::consts`].
    pub fn for_target(os: &str, arch: &str) -> Option<Self> {
        let platform = match (os, arch) {
            ("macos", "aarch64") => {
                Self::layout("pdfium-mac-arm64.tgz", "libpdfium.dylib", "lib/libpdfium.dylib")
            }
            ("macos", "x86_64") => {
                Self::layout("pdfium-mac-x64.tgz", "libpdfium.dylib", "lib/libpdfium.dylib")
            }
            ("linux", "x86_64") => {
                Self::layout("pdfium-linux-x64.tgz", "libpdfium.so", "lib/libpdfium.so")
            }
            ("linux", "aarch64") => {
                Self::layout("pdfium-linux-arm64.tgz", "libpdfium.so", "lib/libpdfium.so")
            }
            ("windows", "x86_64") => Self::layout("pdfium-win-x64.tgz", "pdfium.dll", "bin/pdfium.dll"),
            ("windows", "aarch64") => {
                Self::layout("pdfium-win-arm64.tgz", "pdfium.dll", "bin/pdfium.dll")
            }
            ("windows", "x86") => Self::layout("pdfium-win-x86.tgz", "pdfium.dll", "bin/pdfium.dll"),
            _ => return None,
        };
        Some(platform)
    }

    pub fn current() -> Result<Self, PdfiumAutoError> {
        let (os, arch) = (std::env::consts::OS, std::env::consts::ARCH);
        Self::for_target(os, arch).ok_or_else(|| PdfiumAutoError::UnsupportedPlatform {
            os: os.to_string(),
            arch: arch.to_string(),
        })
    }

    fn download_url(&self) -> String {
        format!("{RELEASE_BASE_URL}/chromium%2F{PDFIUM_RELEASE}/{}", self.archive)
    }
}

/// Per-release cache directory.
///
/// `$PDFIUM_AUTO_CACHE_DIR/pdfium-<release>` when the override is set,
/// otherwise `<user cache dir>/pdf2images/pdfium-<release>`.
pub fn cache_dir() -> PathBuf {
    let release_dir = format!("pdfium-{PDFIUM_RELEASE}");
    if let Some(root) = std::env::var_os(CACHE_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(root).join(release_dir);
    }
    dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".cache")))
        .unwrap_or_else(std::env::temp_dir)
        .join("pdf2images")
        .join(release_dir)
}

fn env_library() -> Option<PathBuf> {
    std::env::var_os(LIB_PATH_ENV)
        .map(PathBuf::from)
        .filter(|p| p.is_file())
}

/// Path of a usable library that is already on disk, if any.
pub fn local_library() -> Option<PathBuf> {
    env_library().or_else(|| {
        let platform = Platform::current().ok()?;
        let cached = cache_dir().join(platform.file_name);
        cached.is_file().then_some(cached)
    })
}

/// `true` when [`ensure_library`] will not need the network.
pub fn is_available_locally() -> bool {
    local_library().is_some()
}

static RESOLVED: OnceLock<PathBuf> = OnceLock::new();

/// Return the path of a pdfium library, downloading it on first use.
pub fn ensure_library(progress: Option<ProgressFn<'_>>) -> Result<PathBuf, PdfiumAutoError> {
    if let Some(path) = RESOLVED.get() {
        return Ok(path.clone());
    }
    let path = match local_library() {
        Some(path) => path,
        None => download_into_cache(&Platform::current()?, progress)?,
    };
    // Two threads racing here resolve to the same file.
    Ok(RESOLVED.get_or_init(|| path).clone())
}

/// Bind to pdfium, downloading the library first when needed.
pub fn bind_pdfium() -> Result<Pdfium, PdfiumAutoError> {
    let path = ensure_library(None)?;
    bind_pdfium_at(&path)
}

/// Bind to the library at `path` without consulting the cache.
pub fn bind_pdfium_at(path: &Path) -> Result<Pdfium, PdfiumAutoError> {
    let bindings = Pdfium::bind_to_library(path).map_err(|e| PdfiumAutoError::Bind {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(Pdfium::new(bindings))
}

fn download_into_cache(
    platform: &Platform,
    progress: Option<ProgressFn<'_>>,
) -> Result<PathBuf, PdfiumAutoError> {
    let archive = fetch(&platform.download_url(), progress)?;
    let library = extract_member(&archive, platform.member)?;
    store_library(&cache_dir(), platform.file_name, &library)
}

/// Write `library` to `dir/file_name`, creating `dir` if needed.
///
/// Bytes go to a `.part` file that is renamed into place, so an interrupted
/// run never leaves a truncated library that looks cached.
fn store_library(dir: &Path, file_name: &str, library: &[u8]) -> Result<PathBuf, PdfiumAutoError> {
    fs::create_dir_all(dir).map_err(|source| PdfiumAutoError::Cache {
        path: dir.to_path_buf(),
        source,
    })?;

    let target = dir.join(file_name);
    let partial = dir.join(format!("{file_name}.part"));
    let cache_err = |source| PdfiumAutoError::Cache {
        path: target.clone(),
        source,
    };
    fs::write(&partial, library).map_err(cache_err)?;
    fs::rename(&partial, &target).map_err(cache_err)?;
    Ok(target)
}

fn fetch(url: &str, progress: Option<ProgressFn<'_>>) -> Result<Vec<u8>, PdfiumAutoError> {
    let failed = |reason: String| PdfiumAutoError::Download {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("pdfium-auto/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let mut response = client.get(url).send().map_err(|e| failed(e.to_string()))?;
    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let total = response.content_length();
    let mut body = Vec::with_capacity(total.unwrap_or(0) as usize);
    let mut chunk = [0u8; 64 * 1024];
    loop {
        let n = match response.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(failed(e.to_string())),
        };
        body.extend_from_slice(&chunk[..n]);
        if let Some(report) = progress {
            report(body.len() as u64, total);
        }
    }
    Ok(body)
}

/// Pull a single file out of a gzipped tarball.
fn extract_member(tgz: &[u8], member: &str) -> Result<Vec<u8>, PdfiumAutoError> {
    let extract_err = |reason: String| PdfiumAutoError::Extract {
        member: member.to_string(),
        reason,
    };

    let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(tgz));
    let entries = archive.entries().map_err(|e| extract_err(e.to_string()))?;
    for entry in entries {
        let mut entry = entry.map_err(|e| extract_err(e.to_string()))?;
        let matches = entry
            .path()
            .map(|p| p.to_string_lossy().trim_start_matches("./") == member)
            .unwrap_or(false);
        if matches {
            let mut bytes = Vec::new();
            entry
                .read_to_end(&mut bytes)
                .map_err(|e| extract_err(e.to_string()))?;
            return Ok(bytes);
        }
    }
    Err(extract_err("not present in archive".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;

    fn tgz_with(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::fast()));
        for (name, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    #[test]
    fn known_targets_map_to_archives() {
        let linux = Platform::for_target("linux", "x86_64").unwrap();
        assert_eq!(linux.archive, "pdfium-linux-x64.tgz");
        assert_eq!(linux.member, "lib/libpdfium.so");

        let win = Platform::for_target("windows", "x86_64").unwrap();
        assert_eq!(win.member, "bin/pdfium.dll");
        assert_eq!(win.file_name, "pdfium.dll");
    }

    #[test]
    fn unknown_target_is_none() {
        assert!(Platform::for_target("haiku", "riscv64").is_none());
    }

    #[test]
    fn download_url_embeds_release() {
        let mac = Platform::for_target("macos", "aarch64").unwrap();
        let url = mac.download_url();
        assert!(url.ends_with("/chromium%2F7690/pdfium-mac-arm64.tgz"), "{url}");
    }

    #[test]
    fn cache_dir_honours_override() {
        std::env::set_var(CACHE_DIR_ENV, "/tmp/pdfium-auto-test-root");
        let dir = cache_dir();
        std::env::remove_var(CACHE_DIR_ENV);
        assert_eq!(
            dir,
            PathBuf::from("/tmp/pdfium-auto-test-root").join(format!("pdfium-{PDFIUM_RELEASE}"))
        );
    }

    #[test]
    fn extracts_requested_member_only() {
        let tgz = tgz_with(&[
            ("include/fpdfview.h", b"header"),
            ("lib/libpdfium.so", b"\x7fELF-not-really"),
        ]);
        let bytes = extract_member(&tgz, "lib/libpdfium.so").unwrap();
        assert_eq!(bytes, b"\x7fELF-not-really");
    }

    #[test]
    fn stored_library_replaces_partial_file() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join(format!("pdfium-{PDFIUM_RELEASE}"));

        let path = store_library(&dir, "libpdfium.so", b"\x7fELF").unwrap();

        assert_eq!(path, dir.join("libpdfium.so"));
        assert_eq!(fs::read(&path).unwrap(), b"\x7fELF");
        let names: Vec<_> = fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("libpdfium.so")]);
    }

    #[test]
    fn store_into_unwritable_location_is_cache_error() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("not-a-dir");
        fs::write(&file, b"").unwrap();

        let err = store_library(&file.join("sub"), "libpdfium.so", b"x").unwrap_err();
        assert!(matches!(err, PdfiumAutoError::Cache { .. }));
    }

    #[test]
    fn missing_member_is_an_extract_error() {
        let tgz = tgz_with(&[("README", b"nothing here")]);
        let err = extract_member(&tgz, "lib/libpdfium.so").unwrap_err();
        assert!(matches!(err, PdfiumAutoError::Extract { .. }));
    }
}
