//! Metrics calculation modules for detection evaluation.

pub mod iou;
pub mod precision_recall;
pub mod f1_score;

pub use iou::{calculate_iou, calculate_iou_matrix, center_iou, corner_iou};
pub use precision_recall::{calculate_precision, calculate_precision_recall, calculate_recall, PrecisionRecall};
pub use f1_score::{calculate_f1_from_pr, calculate_f1_score};
