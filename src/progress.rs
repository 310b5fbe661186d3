//! Progress-callback trait for per-image conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to be told
//! when each output image starts and finishes.
//!
//! # Example
//!
//! ```rust
//! use pdf2images::{ConversionConfig, ConversionProgressCallback, OutputArtifact};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     written: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_group_complete(&self, _index: usize, _total: usize, artifact: &OutputArtifact) {
//!         self.written.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("wrote {}", artifact.path.display());
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { written: AtomicUsize::new(0) });
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::OutputArtifact;
use crate::pipeline::group::PageGroup;
use std::sync::Arc;

/// Called by the conversion pipeline as it processes each group.
///
/// Groups run concurrently, so the per-group methods may be called from
/// several threads at once and in any order. All methods default to no-ops.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before any page is rendered.
    ///
    /// `total_outputs` is the number of images that will be written.
    fn on_conversion_start(&self, total_outputs: usize) {
        let _ = total_outputs;
    }

    /// Called when a worker starts rendering `group` (0-based `index`).
    fn on_group_start(&self, index: usize, total_outputs: usize, group: &PageGroup) {
        let _ = (index, total_outputs, group);
    }

    /// Called after the group's image file is fully written.
    fn on_group_complete(&self, index: usize, total_outputs: usize, artifact: &OutputArtifact) {
        let _ = (index, total_outputs, artifact);
    }

    /// Called when a group fails. The conversion is aborted afterwards.
    fn on_group_error(&self, index: usize, total_outputs: usize, error: &str) {
        let _ = (index, total_outputs, error);
    }

    /// Called once after every image was written successfully.
    fn on_conversion_complete(&self, total_outputs: usize) {
        let _ = total_outputs;
    }
}

/// A callback that ignores every event.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
