//! Page grouping: decide which source pages share an output image.
//!
//! With a ceiling of `max_outputs` images and `total_pages` pages, every
//! image holds `ceil(total_pages / max_outputs)` consecutive pages and the
//! last one takes the remainder. Because the group size is rounded up first,
//! the resulting image count can land *below* the ceiling:
//!
//! ```text
//! 100 pages, ceiling 50 → size 2 → 50 images  [1-2] [3-4] … [99-100]
//! 100 pages, ceiling 40 → size 3 → 34 images  [1-3] [4-6] … [100-100]
//! ```
//!
//! Callers see this directly: 34 files, named after pages 1, 4, 7, …

use serde::{Deserialize, Serialize};
use std::ops::{Range, RangeInclusive};

/// A contiguous, inclusive run of 1-based page numbers rendered into one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageGroup {
    pub start: usize,
    pub end: usize,
}

impl PageGroup {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start >= 1 && start <= end, "bad page group {start}-{end}");
        Self { start, end }
    }

    pub fn single(page: usize) -> Self {
        Self::new(page, page)
    }

    /// Number of pages in the group.
    pub fn page_count(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn is_single(&self) -> bool {
        self.start == self.end
    }

    /// 1-based page numbers.
    pub fn pages(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }

    /// 0-based page indices, as pdfium wants them.
    pub fn indices(&self) -> Range<usize> {
        (self.start - 1)..self.end
    }
}

/// Pages per image for the given ceiling. `None` or `Some(0)` means no
/// ceiling, as does a ceiling at or above the page count.
pub fn group_size(total_pages: usize, max_outputs: Option<usize>) -> usize {
    match max_outputs {
        Some(max) if max > 0 && total_pages > max => total_pages.div_ceil(max),
        _ => 1,
    }
}

/// Partition pages `1..=total_pages` into consecutive groups.
pub fn group_pages(total_pages: usize, max_outputs: Option<usize>) -> Vec<PageGroup> {
    let size = group_size(total_pages, max_outputs);
    (1..=total_pages)
        .step_by(size)
        .map(|start| PageGroup::new(start, (start + size - 1).min(total_pages)))
        .collect()
}

/// One single-page group per 0-based index, preserving order. Used in
/// page-selection mode, where nothing is ever stitched.
pub fn single_page_groups(indices: &[usize]) -> Vec<PageGroup> {
    indices.iter().map(|&idx| PageGroup::single(idx + 1)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn no_ceiling_gives_singletons() {
        let groups = group_pages(5, None);
        assert_eq!(groups.len(), 5);
        assert!(groups.iter().all(PageGroup::is_single));
        assert_eq!(groups[4], PageGroup::single(5));
    }

    #[test]
    fn zero_ceiling_is_no_ceiling() {
        assert_eq!(group_pages(7, Some(0)), group_pages(7, None));
    }

    #[test]
    fn ceiling_at_or_above_page_count_gives_singletons() {
        assert_eq!(group_pages(10, Some(10)).len(), 10);
        assert_eq!(group_pages(3, Some(40)).len(), 3);
        assert_eq!(group_size(3, Some(40)), 1);
    }

    #[test]
    fn hundred_pages_ceiling_fifty() {
        let groups = group_pages(100, Some(50));
        assert_eq!(group_size(100, Some(50)), 2);
        assert_eq!(groups.len(), 50);
        assert_eq!(groups[0], PageGroup::new(1, 2));
        assert_eq!(groups[1], PageGroup::new(3, 4));
        assert_eq!(groups[49], PageGroup::new(99, 100));
    }

    #[test]
    fn hundred_pages_ceiling_forty_undershoots() {
        let groups = group_pages(100, Some(40));
        assert_eq!(group_size(100, Some(40)), 3);
        assert_eq!(groups.len(), 34);
        assert_eq!(groups[0], PageGroup::new(1, 3));
        assert_eq!(groups[1], PageGroup::new(4, 6));
        assert_eq!(groups[33], PageGroup::single(100));
    }

    #[test]
    fn empty_document_has_no_groups() {
        assert!(group_pages(0, Some(3)).is_empty());
        assert!(group_pages(0, None).is_empty());
    }

    #[test]
    fn indices_are_zero_based() {
        let g = PageGroup::new(4, 6);
        assert_eq!(g.indices().collect::<Vec<_>>(), vec![3, 4, 5]);
        assert_eq!(g.page_count(), 3);
    }

    #[test]
    fn selection_groups_are_singletons() {
        let groups = single_page_groups(&[0, 2, 3]);
        assert_eq!(
            groups,
            vec![PageGroup::single(1), PageGroup::single(3), PageGroup::single(4)]
        );
    }

    proptest! {
        #[test]
        fn groups_partition_every_page_once(total in 0usize..600, max in 0usize..120) {
            let groups = group_pages(total, Some(max));
            let flattened: Vec<usize> = groups.iter().flat_map(PageGroup::pages).collect();
            prop_assert_eq!(flattened, (1..=total).collect::<Vec<_>>());
        }

        #[test]
        fn group_count_never_exceeds_ceiling(total in 1usize..600, max in 1usize..120) {
            let groups = group_pages(total, Some(max));
            prop_assert!(groups.len() <= max);
            let size = group_size(total, Some(max));
            prop_assert_eq!(groups.len(), total.div_ceil(size));
            // Only the last group may be short.
            for g in &groups[..groups.len() - 1] {
                prop_assert_eq!(g.page_count(), size);
            }
        }
    }
}
