//! Counters collected while turning raw grid output into detections.

use serde::{Deserialize, Serialize};

/// Statistics collected during detection.
///
/// Per-image values are summed with [`DetectionStats::merge`], so workers can
/// keep private counters and combine them afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionStats {
    /// Images processed
    pub images: usize,

    /// Grid cells (row, col, anchor) inspected
    pub cells: usize,

    /// Cells that passed the confidence gate
    pub candidates: usize,

    /// Candidates removed by non-maximum suppression
    pub suppressed: usize,

    /// Detections emitted after suppression
    pub emitted: usize,

    /// Images that produced zero detections
    pub empty_images: usize,
}

impl DetectionStats {
    /// Create a new `DetectionStats` with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters for one image scored from detections made elsewhere.
    ///
    /// Only `images` is set; the grid-side counters are unknown on that path.
    pub fn scored_image() -> Self {
        Self {
            images: 1,
            ..Self::default()
        }
    }

    /// Record the outcome of one image.
    pub fn record_image(&mut self, cells: usize, candidates: usize, suppressed: usize, emitted: usize) {
        self.images += 1;
        self.cells += cells;
        self.candidates += candidates;
        self.suppressed += suppressed;
        self.emitted += emitted;
        if emitted == 0 {
            self.empty_images += 1;
        }
    }

    /// Combine two sets of counters.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        self.images += other.images;
        self.cells += other.cells;
        self.candidates += other.candidates;
        self.suppressed += other.suppressed;
        self.emitted += other.emitted;
        self.empty_images += other.empty_images;
        self
    }

    /// Fraction of candidates removed by suppression.
    pub fn suppression_rate(&self) -> f64 {
        if self.candidates == 0 {
            return 0.0;
        }
        self.suppressed as f64 / self.candidates as f64
    }

    /// Get a formatted string summary of the statistics
    pub fn summary_string(&self) -> String {
        format!(
            "DetectionStats {{ images: {}, candidates: {}, suppressed: {}, emitted: {}, empty: {} }}",
            self.images, self.candidates, self.suppressed, self.emitted, self.empty_images
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stats_are_zero() {
        let stats = DetectionStats::new();
        assert_eq!(stats.images, 0);
        assert_eq!(stats.suppression_rate(), 0.0);
    }

    #[test]
    fn test_record_image() {
        let mut stats = DetectionStats::new();
        stats.record_image(50, 4, 1, 3);
        stats.record_image(50, 0, 0, 0);

        assert_eq!(stats.images, 2);
        assert_eq!(stats.cells, 100);
        assert_eq!(stats.candidates, 4);
        assert_eq!(stats.emitted, 3);
        assert_eq!(stats.empty_images, 1);
        assert!((stats.suppression_rate() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_scored_image_counts_only_the_image() {
        let stats = DetectionStats::scored_image().merge(DetectionStats::scored_image());
        assert_eq!(stats.images, 2);
        assert_eq!(stats.cells, 0);
        assert_eq!(stats.candidates, 0);
        assert_eq!(stats.empty_images, 0);
    }

    #[test]
    fn test_merge() {
        let mut a = DetectionStats::new();
        a.record_image(10, 2, 1, 1);
        let mut b = DetectionStats::new();
        b.record_image(10, 3, 0, 3);

        let merged = a.merge(b);
        assert_eq!(merged.images, 2);
        assert_eq!(merged.candidates, 5);
        assert_eq!(merged.emitted, 4);
    }

    #[test]
    fn test_summary_string() {
        let mut stats = DetectionStats::new();
        stats.record_image(10, 5, 2, 3);

        let summary = stats.summary_string();
        assert!(summary.contains("images: 1"));
        assert!(summary.contains("suppressed: 2"));
    }
}
