//! Evaluation orchestrator: detect, match and score whole batches.

use ndarray::ArrayView5;
use rayon::prelude::*;
use tracing::debug;

use crate::config::DetectionConfig;
use crate::detector::Detector;
use crate::error::{Result, TableEvalError};
use crate::labels::truth_boxes;
use crate::matching::match_detections;
use crate::scorer::EvaluationAccumulator;
use crate::stats::DetectionStats;
use crate::types::{Detection, EvaluationMetrics, GroundTruth, GroundTruthBox, MatchPair};

/// Everything known about one evaluated image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageEvaluation {
    pub detections: Vec<Detection>,
    pub truths: Vec<GroundTruthBox>,
    pub pairs: Vec<MatchPair>,
}

impl ImageEvaluation {
    /// Detections that matched no truth.
    pub fn false_positives(&self) -> usize {
        self.detections.len() - self.pairs.len()
    }

    /// Truths that no detection matched.
    pub fn missed(&self) -> usize {
        self.truths.len() - self.pairs.len()
    }

    fn accumulate(&self, stats: DetectionStats) -> EvaluationAccumulator {
        let mut acc = EvaluationAccumulator::new();
        acc.record_image(self.detections.len(), self.truths.len(), &self.pairs);
        acc.record_detection_stats(stats);
        acc
    }
}

/// Runs the decode → detect → match → score cycle.
#[derive(Debug, Clone)]
pub struct Evaluator {
    detector: Detector,
}

impl Evaluator {
    /// Build an evaluator, validating the configuration.
    pub fn new(config: DetectionConfig) -> Result<Self> {
        Ok(Self { detector: Detector::new(config)? })
    }

    pub fn config(&self) -> &DetectionConfig {
        self.detector.config()
    }

    pub fn detector(&self) -> &Detector {
        &self.detector
    }

    /// Match one image's detections against its labels.
    pub fn evaluate_image(&self, detections: Vec<Detection>, labels: &[GroundTruth]) -> ImageEvaluation {
        let config = self.config();
        let truths = truth_boxes(labels, config.image_width, config.image_height);
        let pairs = match_detections(&truths, &detections, config.match_iou_floor);

        debug!(
            detections = detections.len(),
            truths = truths.len(),
            pairs = pairs.len(),
            "matched image"
        );

        ImageEvaluation { detections, truths, pairs }
    }

    /// Score already-emitted detections, one entry per image.
    ///
    /// # Errors
    ///
    /// Returns `InvalidShape` if `detections` and `labels` cover a different
    /// number of images.
    pub fn evaluate_detections(
        &self,
        detections: &[Vec<Detection>],
        labels: &[Vec<GroundTruth>],
    ) -> Result<EvaluationAccumulator> {
        check_label_count(detections.len(), labels.len())?;

        Ok(detections
            .par_iter()
            .zip(labels.par_iter())
            .map(|(dets, labels)| {
                self.evaluate_image(dets.clone(), labels)
                    .accumulate(DetectionStats::scored_image())
            })
            .reduce(EvaluationAccumulator::new, EvaluationAccumulator::merge))
    }

    /// Detect and score one raw batch.
    ///
    /// Images run in parallel; each worker produces a private accumulator and
    /// the partial results are merged in a reduction.
    ///
    /// # Errors
    ///
    /// Returns `InvalidShape` if the tensor does not match the configuration
    /// or `labels` does not hold one entry per image.
    pub fn evaluate_batch(
        &self,
        raw: ArrayView5<f32>,
        labels: &[Vec<GroundTruth>],
    ) -> Result<EvaluationAccumulator> {
        check_label_count(raw.shape()[0], labels.len())?;
        let detected = self.detector.detect_batch_with_stats(raw)?;

        Ok(detected
            .into_par_iter()
            .zip(labels.par_iter())
            .map(|((detections, stats), labels)| self.evaluate_image(detections, labels).accumulate(stats))
            .reduce(EvaluationAccumulator::new, EvaluationAccumulator::merge))
    }

    /// Evaluate a full run made of several batches.
    pub fn evaluate<'a, I>(&self, batches: I) -> Result<EvaluationMetrics>
    where
        I: IntoIterator<Item = (ArrayView5<'a, f32>, &'a [Vec<GroundTruth>])>,
    {
        let mut acc = EvaluationAccumulator::new();
        for (raw, labels) in batches {
            acc = acc.merge(self.evaluate_batch(raw, labels)?);
        }
        Ok(acc.finalize())
    }
}

fn check_label_count(images: usize, labels: usize) -> Result<()> {
    if images != labels {
        return Err(TableEvalError::InvalidShape(format!(
            "batch holds {images} images but {labels} label lists were given"
        )));
    }
    Ok(())
}

/// Evaluate a single raw batch with a fresh evaluator.
///
/// # Example
///
/// ```
/// use ndarray::Array5;
/// use table_detect_eval::config::DetectionConfig;
/// use table_detect_eval::evaluator::evaluate;
///
/// let config = DetectionConfig::new(100, 100, 1, 1, 1, 1);
/// let raw = Array5::<f32>::zeros((1, 1, 1, 1, 6));
/// let metrics = evaluate(&config, raw.view(), &[vec![]]).unwrap();
/// assert_eq!(metrics.precision[0], 0.0);
/// ```
pub fn evaluate(
    config: &DetectionConfig,
    raw: ArrayView5<f32>,
    labels: &[Vec<GroundTruth>],
) -> Result<EvaluationMetrics> {
    let evaluator = Evaluator::new(config.clone())?;
    Ok(evaluator.evaluate_batch(raw, labels)?.finalize())
}
