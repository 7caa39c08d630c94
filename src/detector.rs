//! Prediction extraction: confidence gate, non-maximum suppression and pixel emission.

use ndarray::{s, ArrayView1, ArrayView3, ArrayView4, ArrayView5, Axis};
use rayon::prelude::*;
use tracing::debug;

use crate::config::DetectionConfig;
use crate::decode::{split_raw, BoxDecoder};
use crate::error::{Result, TableEvalError};
use crate::nms::{sort_by_confidence, suppress_overlaps};
use crate::stats::DetectionStats;
use crate::types::{Candidate, CenterBox, Detection, GridCell};

/// Index of the highest class score; the first maximum wins ties.
///
/// An empty score vector (or one made only of NaN) maps to class 0.
pub fn argmax_class(scores: ArrayView1<f32>) -> usize {
    let mut best_idx = 0;
    let mut best_score = f32::NEG_INFINITY;
    for (idx, &score) in scores.iter().enumerate() {
        if score > best_score {
            best_idx = idx;
            best_score = score;
        }
    }
    best_idx
}

/// Turns decoded per-cell predictions into final detections for one image.
#[derive(Debug, Clone)]
pub struct Detector {
    config: DetectionConfig,
    decoder: BoxDecoder,
}

impl Detector {
    /// Build a detector, validating the configuration.
    pub fn new(config: DetectionConfig) -> Result<Self> {
        config.validate()?;
        let decoder = BoxDecoder::new(config.grid_rows, config.grid_cols);
        Ok(Self { config, decoder })
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn decoder(&self) -> &BoxDecoder {
        &self.decoder
    }

    /// Collect every cell whose confidence reaches `pred_thresh`.
    ///
    /// Cells are enumerated column first, then row, then anchor; the order
    /// is the tie-break for equal confidences later on.
    ///
    /// * `confidences` - `(rows, cols, anchors)`
    /// * `boxes` - decoded `(rows, cols, anchors, 4)` center boxes
    /// * `class_scores` - `(rows, cols, anchors, n_classes)`
    pub fn extract_candidates(
        &self,
        confidences: ArrayView3<f32>,
        boxes: ArrayView4<f32>,
        class_scores: ArrayView4<f32>,
    ) -> Vec<Candidate> {
        let (rows, cols, anchors) = confidences.dim();
        let mut candidates = Vec::new();

        for col in 0..cols {
            for row in 0..rows {
                for anchor in 0..anchors {
                    let confidence = f64::from(confidences[[row, col, anchor]]);
                    // NaN fails the gate
                    if !(confidence >= self.config.pred_thresh) {
                        continue;
                    }

                    let b = boxes.slice(s![row, col, anchor, ..]);
                    candidates.push(Candidate {
                        bbox: CenterBox::new(
                            f64::from(b[0]),
                            f64::from(b[1]),
                            f64::from(b[2]),
                            f64::from(b[3]),
                        ),
                        confidence,
                        class_id: argmax_class(class_scores.slice(s![row, col, anchor, ..])),
                        cell: GridCell { row, col, anchor },
                    });
                }
            }
        }

        candidates
    }

    /// Run the full per-image cycle on already-decoded boxes.
    pub fn detect_image(
        &self,
        confidences: ArrayView3<f32>,
        boxes: ArrayView4<f32>,
        class_scores: ArrayView4<f32>,
    ) -> Vec<Detection> {
        self.detect_image_with_stats(confidences, boxes, class_scores).0
    }

    /// Same as [`Detector::detect_image`], also returning the image's counters.
    pub fn detect_image_with_stats(
        &self,
        confidences: ArrayView3<f32>,
        boxes: ArrayView4<f32>,
        class_scores: ArrayView4<f32>,
    ) -> (Vec<Detection>, DetectionStats) {
        let cells = confidences.len();
        let mut candidates = self.extract_candidates(confidences, boxes, class_scores);
        let n_candidates = candidates.len();

        let (detections, suppressed) = self.suppress_and_emit(&mut candidates);

        let mut stats = DetectionStats::new();
        stats.record_image(cells, n_candidates, suppressed, detections.len());
        debug!(
            candidates = n_candidates,
            suppressed,
            emitted = detections.len(),
            "detected image"
        );

        (detections, stats)
    }

    /// Sort, suppress and emit an arbitrary candidate list.
    ///
    /// Returns the detections in scan order and the number of suppressed candidates.
    pub fn suppress_and_emit(&self, candidates: &mut [Candidate]) -> (Vec<Detection>, usize) {
        sort_by_confidence(candidates);
        // thresholds were validated when the detector was built
        let suppressed =
            suppress_overlaps(candidates, self.config.pred_thresh, self.config.nms_thresh);

        let detections = candidates
            .iter()
            .filter(|c| c.confidence >= self.config.pred_thresh)
            .map(|c| {
                Detection::new(
                    c.bbox.to_pixels(self.config.image_width, self.config.image_height),
                    c.confidence,
                    c.class_id,
                )
            })
            .collect();

        (detections, suppressed)
    }

    /// Check a raw batch tensor against the configured grid.
    pub fn validate_raw_shape(&self, raw: &ArrayView5<f32>) -> Result<()> {
        let shape = raw.shape();
        let expected = self.config.raw_shape(shape[0]);
        if shape != expected {
            return Err(TableEvalError::InvalidShape(format!(
                "expected raw tensor shape {expected:?}, got {shape:?}"
            )));
        }
        Ok(())
    }

    /// Detect on a raw `(batch, rows, cols, anchors, 5 + n_classes)` tensor.
    ///
    /// Images are processed in parallel; the result keeps batch order.
    ///
    /// # Errors
    ///
    /// Returns `InvalidShape` if the tensor does not match the configuration.
    pub fn detect_batch(&self, raw: ArrayView5<f32>) -> Result<Vec<Vec<Detection>>> {
        Ok(self
            .detect_batch_with_stats(raw)?
            .into_iter()
            .map(|(detections, _)| detections)
            .collect())
    }

    /// Same as [`Detector::detect_batch`], also returning per-image counters.
    pub fn detect_batch_with_stats(
        &self,
        raw: ArrayView5<f32>,
    ) -> Result<Vec<(Vec<Detection>, DetectionStats)>> {
        self.validate_raw_shape(&raw)?;
        let channels = split_raw(raw, self.config.n_classes)?;
        let decoded = self.decoder.decode(channels.boxes);
        let batch = decoded.len_of(Axis(0));

        Ok((0..batch)
            .into_par_iter()
            .map(|b| {
                self.detect_image_with_stats(
                    channels.confidences.index_axis(Axis(0), b),
                    decoded.index_axis(Axis(0), b),
                    channels.class_scores.index_axis(Axis(0), b),
                )
            })
            .collect())
    }
}
