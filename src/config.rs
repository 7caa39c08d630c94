//! Detection and evaluation configuration.
//!
//! A single immutable [`DetectionConfig`] carries every size and threshold the
//! pipeline needs. It is validated once, when a [`Detector`](crate::detector::Detector)
//! or [`Evaluator`](crate::evaluator::Evaluator) is built or when it is loaded from JSON.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TableEvalError};
use crate::threshold::validate_threshold;

/// Default confidence floor for keeping a candidate.
pub const DEFAULT_PRED_THRESH: f64 = 0.5;
/// Default IoU ceiling above which a lower-confidence candidate is suppressed.
pub const DEFAULT_NMS_THRESH: f64 = 0.5;
/// Default minimum IoU for a prediction/truth pairing.
pub const DEFAULT_MATCH_IOU_FLOOR: f64 = 0.4;

fn default_pred_thresh() -> f64 {
    DEFAULT_PRED_THRESH
}

fn default_nms_thresh() -> f64 {
    DEFAULT_NMS_THRESH
}

fn default_match_iou_floor() -> f64 {
    DEFAULT_MATCH_IOU_FLOOR
}

/// Sizes and thresholds of the detection pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Confidence floor for candidate retention
    #[serde(default = "default_pred_thresh")]
    pub pred_thresh: f64,
    /// IoU above which NMS suppresses the later candidate
    #[serde(default = "default_nms_thresh")]
    pub nms_thresh: f64,
    /// Minimum IoU to accept a match
    #[serde(default = "default_match_iou_floor")]
    pub match_iou_floor: f64,
    pub image_width: u32,
    pub image_height: u32,
    pub grid_rows: usize,
    pub grid_cols: usize,
    /// Boxes predicted per grid cell
    pub anchors: usize,
    /// Number of class-score channels per anchor
    pub n_classes: usize,
}

impl DetectionConfig {
    /// Create a configuration with default thresholds.
    ///
    /// # Example
    ///
    /// ```
    /// use table_detect_eval::config::DetectionConfig;
    ///
    /// let config = DetectionConfig::new(448, 448, 14, 14, 5, 1).with_pred_thresh(0.3);
    /// assert!(config.validate().is_ok());
    /// assert_eq!(config.channels_per_anchor(), 6);
    /// ```
    pub fn new(
        image_width: u32,
        image_height: u32,
        grid_rows: usize,
        grid_cols: usize,
        anchors: usize,
        n_classes: usize,
    ) -> Self {
        Self {
            pred_thresh: DEFAULT_PRED_THRESH,
            nms_thresh: DEFAULT_NMS_THRESH,
            match_iou_floor: DEFAULT_MATCH_IOU_FLOOR,
            image_width,
            image_height,
            grid_rows,
            grid_cols,
            anchors,
            n_classes,
        }
    }

    #[must_use]
    pub fn with_pred_thresh(mut self, pred_thresh: f64) -> Self {
        self.pred_thresh = pred_thresh;
        self
    }

    #[must_use]
    pub fn with_nms_thresh(mut self, nms_thresh: f64) -> Self {
        self.nms_thresh = nms_thresh;
        self
    }

    #[must_use]
    pub fn with_match_iou_floor(mut self, match_iou_floor: f64) -> Self {
        self.match_iou_floor = match_iou_floor;
        self
    }

    /// Channels per anchor in the raw score tensor: confidence, 4 box offsets, class scores.
    pub fn channels_per_anchor(&self) -> usize {
        5 + self.n_classes
    }

    /// Expected raw tensor shape for a batch of `batch` images.
    pub fn raw_shape(&self, batch: usize) -> [usize; 5] {
        [
            batch,
            self.grid_rows,
            self.grid_cols,
            self.anchors,
            self.channels_per_anchor(),
        ]
    }

    /// Check every threshold and dimension.
    ///
    /// # Errors
    ///
    /// Returns `InvalidThreshold` for thresholds outside `[0, 1]` (or a zero
    /// `pred_thresh`, which cannot tell suppressed candidates from live ones)
    /// and `InvalidConfig` for zero dimensions.
    pub fn validate(&self) -> Result<()> {
        validate_threshold(self.pred_thresh, "pred_thresh")?;
        validate_threshold(self.nms_thresh, "nms_thresh")?;
        validate_threshold(self.match_iou_floor, "match_iou_floor")?;

        if self.pred_thresh == 0.0 {
            return Err(TableEvalError::InvalidThreshold(
                "pred_thresh must be greater than 0.0".to_string(),
            ));
        }

        let dims = [
            ("image_width", self.image_width as usize),
            ("image_height", self.image_height as usize),
            ("grid_rows", self.grid_rows),
            ("grid_cols", self.grid_cols),
            ("anchors", self.anchors),
            ("n_classes", self.n_classes),
        ];
        for (name, value) in dims {
            if value == 0 {
                return Err(TableEvalError::InvalidConfig(format!(
                    "{name} must be positive"
                )));
            }
        }

        Ok(())
    }

    /// Parse and validate a configuration from a JSON string.
    pub fn from_json_str(json_str: &str) -> Result<Self> {
        let config: DetectionConfig = serde_json::from_str(json_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let config: DetectionConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }
}
