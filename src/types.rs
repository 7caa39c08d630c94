//! Core geometric and result types shared by the detection pipeline.

use serde::{Deserialize, Serialize};

use crate::threshold::N_BUCKETS;

/// Upper clamp applied to normalized coordinates before scaling to pixels.
///
/// Keeps the far image edge one sub-pixel inside the bitmap.
pub const EDGE_CLAMP: f64 = 0.9999;

/// Interpretation of a raw `[f64; 4]` box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoxForm {
    /// `[center_x, center_y, width, height]`
    CenterSize,
    /// `[left, top, right, bottom]`
    Corner,
}

/// Box in center-size form, normalized to the image extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CenterBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl CenterBox {
    /// Create a new center-size box.
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Corner coordinates in the same (normalized) space, without clamping.
    pub fn to_corners(&self) -> CornerBox {
        CornerBox::new(
            self.x - self.w / 2.0,
            self.y - self.h / 2.0,
            self.x + self.w / 2.0,
            self.y + self.h / 2.0,
        )
    }

    /// Denormalize into pixel corners.
    ///
    /// Every side is clamped to `[0, EDGE_CLAMP]` before scaling and then
    /// rounded to the nearest pixel.
    ///
    /// # Example
    ///
    /// ```
    /// use table_detect_eval::types::CenterBox;
    ///
    /// let bbox = CenterBox::new(0.5, 0.5, 0.5, 0.25).to_pixels(200, 100);
    /// assert_eq!([bbox.left, bbox.top, bbox.right, bbox.bottom], [50.0, 38.0, 150.0, 63.0]);
    /// ```
    pub fn to_pixels(&self, image_width: u32, image_height: u32) -> CornerBox {
        let corners = self.to_corners();
        let width = f64::from(image_width);
        let height = f64::from(image_height);
        let scale = |v: f64, extent: f64| (v.clamp(0.0, EDGE_CLAMP) * extent).round();

        CornerBox::new(
            scale(corners.left, width),
            scale(corners.top, height),
            scale(corners.right, width),
            scale(corners.bottom, height),
        )
    }

    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    /// Check if the box has positive extent.
    pub fn is_valid(&self) -> bool {
        self.w > 0.0 && self.h > 0.0
    }
}

impl From<[f64; 4]> for CenterBox {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

/// Box in corner form: `(left, top, right, bottom)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct CornerBox {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl CornerBox {
    /// Create a new corner box.
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Check if the box has positive extent.
    pub fn is_valid(&self) -> bool {
        self.right > self.left && self.bottom > self.top
    }

    pub fn to_center(&self) -> CenterBox {
        CenterBox::new(
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
            self.width(),
            self.height(),
        )
    }
}

impl From<[f64; 4]> for CornerBox {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<CornerBox> for [f64; 4] {
    fn from(b: CornerBox) -> Self {
        [b.left, b.top, b.right, b.bottom]
    }
}

/// Position of a prediction inside the output grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
    pub anchor: usize,
}

/// Thresholded prediction awaiting non-maximum suppression.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Decoded box, normalized center form
    pub bbox: CenterBox,
    /// Objectness; forced to `0.0` once suppressed
    pub confidence: f64,
    pub class_id: usize,
    pub cell: GridCell,
}

/// Final detection in pixel corner form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "box")]
    pub bbox: CornerBox,
    #[serde(rename = "prob")]
    pub confidence: f64,
    #[serde(rename = "class")]
    pub class_id: usize,
}

impl Detection {
    pub fn new(bbox: CornerBox, confidence: f64, class_id: usize) -> Self {
        Self { bbox, confidence, class_id }
    }
}

/// Ground-truth label as delivered by the dataset: normalized center form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundTruth {
    pub class_id: usize,
    pub bbox: CenterBox,
}

impl GroundTruth {
    pub fn new(class_id: usize, bbox: CenterBox) -> Self {
        Self { class_id, bbox }
    }
}

impl From<(usize, f64, f64, f64, f64)> for GroundTruth {
    fn from((class_id, x, y, w, h): (usize, f64, f64, f64, f64)) -> Self {
        Self::new(class_id, CenterBox::new(x, y, w, h))
    }
}

/// Ground-truth box in pixel corner form, ready for matching.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundTruthBox {
    pub class_id: usize,
    pub bbox: CornerBox,
}

impl GroundTruthBox {
    pub fn new(class_id: usize, bbox: CornerBox) -> Self {
        Self { class_id, bbox }
    }
}

/// One resolved prediction/truth pairing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchPair {
    pub prediction_index: usize,
    pub truth_index: usize,
    pub iou: f64,
}

/// Metrics for a single IoU bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BucketMetrics {
    pub cutoff: f64,
    pub right: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Evaluation metrics for one run, derived from an accumulator.
///
/// All arrays are indexed by bucket: index 0 is IoU ≥ 0.9, index 9 is IoU ≥ 0.0.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvaluationMetrics {
    pub precision: [f64; N_BUCKETS],
    pub recall: [f64; N_BUCKETS],
    pub f1: [f64; N_BUCKETS],
    /// Matched pairs per bucket
    pub right: [usize; N_BUCKETS],
    /// Mean IoU over all matched pairs
    pub overlap: f64,
    pub total_predictions: usize,
    pub total_truths: usize,
}

impl EvaluationMetrics {
    /// Metrics for bucket `index`, or `None` when out of range.
    pub fn bucket(&self, index: usize) -> Option<BucketMetrics> {
        let cutoff = *crate::threshold::IOU_CUTOFFS.get(index)?;
        Some(BucketMetrics {
            cutoff,
            right: self.right[index],
            precision: self.precision[index],
            recall: self.recall[index],
            f1: self.f1[index],
        })
    }

    /// Metrics for the bucket whose cutoff equals `cutoff`.
    pub fn at_cutoff(&self, cutoff: f64) -> Option<BucketMetrics> {
        crate::threshold::bucket_index(cutoff).and_then(|i| self.bucket(i))
    }

    pub fn buckets(&self) -> impl Iterator<Item = BucketMetrics> + '_ {
        (0..N_BUCKETS).filter_map(move |i| self.bucket(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_to_corners() {
        let bbox = CenterBox::new(0.5, 0.5, 0.2, 0.4);
        let corners = bbox.to_corners();
        assert!((corners.left - 0.4).abs() < 1e-12);
        assert!((corners.top - 0.3).abs() < 1e-12);
        assert!((corners.right - 0.6).abs() < 1e-12);
        assert!((corners.bottom - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_to_pixels_clamps_far_edge() {
        let bbox = CenterBox::new(0.9, 0.9, 0.4, 0.4).to_pixels(1000, 1000);
        assert_eq!(bbox.right, 1000.0); // 0.9999 * 1000 rounds up
        assert_eq!(bbox.bottom, 1000.0);

        let bbox = CenterBox::new(0.9, 0.9, 0.4, 0.4).to_pixels(100000, 100000);
        assert_eq!(bbox.right, 99990.0);
    }

    #[test]
    fn test_to_pixels_clamps_negative_side() {
        let bbox = CenterBox::new(0.05, 0.05, 0.2, 0.2).to_pixels(100, 100);
        assert_eq!(bbox.left, 0.0);
        assert_eq!(bbox.top, 0.0);
        assert_eq!(bbox.right, 15.0);
    }

    #[test]
    fn test_corner_box_serializes_as_array() {
        let detection = Detection::new(CornerBox::new(1.0, 2.0, 3.0, 4.0), 0.5, 1);
        let json = serde_json::to_string(&detection).unwrap();
        assert_eq!(json, r#"{"box":[1.0,2.0,3.0,4.0],"prob":0.5,"class":1}"#);
    }

    #[test]
    fn test_ground_truth_from_tuple() {
        let truth = GroundTruth::from((2, 0.5, 0.5, 0.1, 0.1));
        assert_eq!(truth.class_id, 2);
        assert!(truth.bbox.is_valid());
    }
}
