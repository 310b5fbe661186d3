//! Result types returned by the conversion entry points.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One written image file.
///
/// Created once per group after its bytes are on disk, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputArtifact {
    /// Absolute path of the image file.
    pub path: PathBuf,
    /// 1-based number of the first source page in the image. The file name
    /// is derived from it.
    pub first_page: usize,
    /// 1-based number of the last source page in the image.
    pub last_page: usize,
    pub width: u32,
    pub height: u32,
    /// Size of the encoded file.
    pub bytes: u64,
}

impl OutputArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of source pages stitched into this image.
    pub fn page_count(&self) -> usize {
        self.last_page - self.first_page + 1
    }
}

/// Complete result of a conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Artifacts in ascending page order.
    pub artifacts: Vec<OutputArtifact>,
    /// Directory holding every artifact. Created fresh for this call; the
    /// caller owns its cleanup.
    pub output_dir: PathBuf,
    pub stats: ConversionStats,
}

impl ConversionOutput {
    /// Paths of the written images, in order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.artifacts.iter().map(OutputArtifact::path)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Pages in the source document.
    pub total_pages: usize,
    /// Pages that made it into some image.
    pub selected_pages: usize,
    /// Images written.
    pub output_count: usize,
    /// Pages per image (the last image may hold fewer).
    pub group_size: usize,
    pub bytes_written: u64,
    pub render_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Document facts available without rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub page_count: usize,
    pub title: Option<String>,
    pub author: Option<String>,
    pub producer: Option<String>,
    pub pdf_version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_spans_inclusive_range() {
        let a = OutputArtifact {
            path: PathBuf::from("/tmp/x/page_004.jpg"),
            first_page: 4,
            last_page: 6,
            width: 100,
            height: 300,
            bytes: 10,
        };
        assert_eq!(a.page_count(), 3);
    }

    #[test]
    fn paths_follow_artifact_order() {
        let artifact = |n: usize| OutputArtifact {
            path: PathBuf::from(format!("/tmp/x/page_{n:03}.png")),
            first_page: n,
            last_page: n,
            width: 1,
            height: 1,
            bytes: 1,
        };
        let out = ConversionOutput {
            artifacts: vec![artifact(1), artifact(2)],
            output_dir: PathBuf::from("/tmp/x"),
            stats: ConversionStats::default(),
        };
        let paths: Vec<_> = out.paths().collect();
        assert_eq!(
            paths,
            vec![Path::new("/tmp/x/page_001.png"), Path::new("/tmp/x/page_002.png")]
        );
    }

    #[test]
    fn output_serialises_to_json() {
        let out = ConversionOutput {
            artifacts: vec![],
            output_dir: PathBuf::from("/tmp/out"),
            stats: ConversionStats::default(),
        };
        let json = serde_json::to_string(&out).unwrap();
        assert!(json.contains("\"output_dir\":\"/tmp/out\""));
    }
}
