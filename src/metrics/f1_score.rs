//! F1 Score calculation.

use crate::metrics::precision_recall::PrecisionRecall;

/// Calculate F1 score from precision and recall.
///
/// F1 = 2 × (Precision × Recall) / (Precision + Recall), or 0.0 when both are 0.
///
/// # Example
///
/// ```
/// use table_detect_eval::metrics::f1_score::calculate_f1_score;
///
/// let f1 = calculate_f1_score(0.8, 0.6);
/// assert!((f1 - 0.6857).abs() < 0.001);
/// ```
pub fn calculate_f1_score(precision: f64, recall: f64) -> f64 {
    if precision + recall <= 0.0 {
        return 0.0;
    }

    2.0 * (precision * recall) / (precision + recall)
}

/// Calculate F1 score from a PrecisionRecall struct.
pub fn calculate_f1_from_pr(pr: &PrecisionRecall) -> f64 {
    calculate_f1_score(pr.precision, pr.recall)
}
