//! Artifact naming and writing.
//!
//! Files are named after the first page they contain: `page_001.jpg`,
//! `page_004.png`, … Bytes go to a dot-prefixed `.part` file first and are
//! renamed into place once complete, so a file carrying a final name is
//! always a whole image.

use crate::config::OutputFormat;
use crate::error::Pdf2ImgError;
use crate::output::OutputArtifact;
use crate::pipeline::group::PageGroup;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// `page_<NNN>.<ext>`, with the first page number zero-padded to 3 digits.
pub fn artifact_name(first_page: usize, format: OutputFormat) -> String {
    format!("page_{first_page:03}.{}", format.extension())
}

/// Write one encoded image into `dir`.
pub fn write_artifact(
    dir: &Path,
    group: &PageGroup,
    format: OutputFormat,
    encoded: &[u8],
    (width, height): (u32, u32),
) -> Result<OutputArtifact, Pdf2ImgError> {
    let name = artifact_name(group.start, format);
    let path = dir.join(&name);
    let partial = dir.join(format!(".{name}.part"));

    let result = File::create(&partial)
        .and_then(|mut file| {
            file.write_all(encoded)?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&partial, &path));

    if let Err(source) = result {
        let _ = fs::remove_file(&partial);
        return Err(Pdf2ImgError::OutputWriteFailed { path, source });
    }

    debug!("Wrote {} ({} bytes)", path.display(), encoded.len());
    Ok(OutputArtifact {
        path,
        first_page: group.start,
        last_page: group.end,
        width,
        height,
        bytes: encoded.len() as u64,
    })
}
