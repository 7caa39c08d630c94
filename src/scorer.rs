//! Run-scoped accumulation of match results across the IoU ladder.
//!
//! An [`EvaluationAccumulator`] lives for exactly one evaluation run. Images
//! are recorded into it (or into per-worker accumulators that are merged
//! afterwards) and [`EvaluationAccumulator::finalize`] derives the metrics.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::metrics::{calculate_f1_score, calculate_precision_recall};
use crate::stats::DetectionStats;
use crate::threshold::{bucket_index, buckets_reached, N_BUCKETS};
use crate::types::{EvaluationMetrics, MatchPair};

/// Running counters for one evaluation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationAccumulator {
    /// Matched pairs per bucket, cumulative across cutoffs
    pub right: [usize; N_BUCKETS],
    pub total_predictions: usize,
    pub total_truths: usize,
    /// Sum of IoU over all matched pairs
    pub iou_sum: f64,
    /// Number of matched pairs
    pub matched: usize,
    /// Detector counters for the same images
    pub detection: DetectionStats,
}

impl EvaluationAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one image.
    pub fn record_image(&mut self, n_predictions: usize, n_truths: usize, pairs: &[MatchPair]) {
        self.total_predictions += n_predictions;
        self.total_truths += n_truths;
        for pair in pairs {
            self.record_match(pair.iou);
        }
    }

    /// Count one matched pair into every bucket its IoU reaches.
    pub fn record_match(&mut self, iou: f64) {
        for bucket in buckets_reached(iou) {
            self.right[bucket] += 1;
        }
        self.iou_sum += iou;
        self.matched += 1;
    }

    /// Add detector counters for images recorded into this accumulator.
    pub fn record_detection_stats(&mut self, stats: DetectionStats) {
        self.detection = self.detection.merge(stats);
    }

    /// Combine two partial accumulators.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        for (mine, theirs) in self.right.iter_mut().zip(other.right.iter()) {
            *mine += theirs;
        }
        self.total_predictions += other.total_predictions;
        self.total_truths += other.total_truths;
        self.iou_sum += other.iou_sum;
        self.matched += other.matched;
        self.detection = self.detection.merge(other.detection);
        self
    }

    /// Clear every counter for a new run.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Mean IoU over matched pairs, `0.0` when nothing matched.
    pub fn overlap(&self) -> f64 {
        if self.matched == 0 {
            return 0.0;
        }
        self.iou_sum / self.matched as f64
    }

    /// Derive precision, recall and F1 for every bucket.
    pub fn finalize(&self) -> EvaluationMetrics {
        let mut metrics = EvaluationMetrics {
            right: self.right,
            overlap: self.overlap(),
            total_predictions: self.total_predictions,
            total_truths: self.total_truths,
            ..Default::default()
        };

        for (b, &right) in self.right.iter().enumerate() {
            let pr = calculate_precision_recall(right, self.total_predictions, self.total_truths);
            metrics.precision[b] = pr.precision;
            metrics.recall[b] = pr.recall;
            metrics.f1[b] = calculate_f1_score(pr.precision, pr.recall);
        }

        if let Some(b) = bucket_index(0.5) {
            info!(
                images = self.detection.images,
                predictions = self.total_predictions,
                truths = self.total_truths,
                precision = metrics.precision[b],
                recall = metrics.recall[b],
                f1 = metrics.f1[b],
                overlap = metrics.overlap,
                "evaluation finished (IoU >= 0.5)"
            );
        }

        metrics
    }
}
