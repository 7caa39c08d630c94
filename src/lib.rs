//! # table-detect-eval
//!
//! Post-processing and evaluation for a grid-based (YOLO-style) table detector.
//!
//! The crate turns raw per-cell network output into final table detections and
//! scores them against ground truth:
//! - **Decoding** of cell-relative box offsets into normalized image coordinates
//! - **IoU** between boxes in center-size or corner form
//! - **Detection**: confidence gate, greedy Non-Maximum Suppression, pixel emission
//! - **Matching** of detections to ground-truth boxes, one-to-one
//! - **Scoring**: precision, recall and F1 over a ladder of IoU cutoffs
//!
//! ## Quick Start
//!
//! ```rust
//! use ndarray::Array5;
//! use table_detect_eval::{DetectionConfig, Evaluator, GroundTruth};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // 1 image, 2x2 grid, 1 anchor, 1 class
//! let config = DetectionConfig::new(100, 100, 2, 2, 1, 1);
//! let mut raw = Array5::<f32>::zeros(config.raw_shape(1));
//! raw[[0, 0, 0, 0, 0]] = 0.9; // confidence
//! raw[[0, 0, 0, 0, 1]] = 0.5; // tx
//! raw[[0, 0, 0, 0, 2]] = 0.5; // ty
//! raw[[0, 0, 0, 0, 3]] = 0.2; // w
//! raw[[0, 0, 0, 0, 4]] = 0.2; // h
//!
//! let labels = vec![vec![GroundTruth::from((0, 0.25, 0.25, 0.2, 0.2))]];
//!
//! let evaluator = Evaluator::new(config)?;
//! let metrics = evaluator.evaluate_batch(raw.view(), &labels)?.finalize();
//! println!("F1 @ IoU>=0.5: {:.4}", metrics.f1[4]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Tensor layout
//!
//! Raw output has shape `(batch, grid_rows, grid_cols, anchors, 5 + n_classes)`;
//! channel 0 is the confidence, channels 1-4 are `(tx, ty, w, h)` and the rest
//! are class scores.

pub mod config;
pub mod decode;
pub mod detector;
pub mod error;
pub mod evaluator;
pub mod labels;
pub mod loader;
pub mod matching;
pub mod metrics;
pub mod nms;
pub mod scorer;
pub mod stats;
pub mod threshold;
pub mod types;

// Re-export commonly used types and functions
pub use config::DetectionConfig;
pub use decode::BoxDecoder;
pub use detector::Detector;
pub use error::{Result, TableEvalError};
pub use evaluator::{evaluate, Evaluator, ImageEvaluation};
pub use loader::{load_layouts_from_file, load_layouts_from_str, LayoutDataset, PageLayout};
pub use matching::match_detections;
pub use metrics::calculate_iou;
pub use scorer::EvaluationAccumulator;
pub use stats::DetectionStats;
pub use threshold::{IOU_CUTOFFS, N_BUCKETS};
pub use types::{
    BoxForm, CenterBox, CornerBox, Detection, EvaluationMetrics, GroundTruth, GroundTruthBox,
    MatchPair,
};
