//! Precision and Recall calculation.

/// Container for precision and recall values at one IoU bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrecisionRecall {
    pub precision: f64,
    pub recall: f64,
    pub right: usize,
    pub total_predictions: usize,
    pub total_truths: usize,
}

/// Precision as matched pairs over emitted predictions.
///
/// Returns `0.0` when there were no predictions.
///
/// # Example
///
/// ```
/// use table_detect_eval::metrics::precision_recall::calculate_precision;
///
/// assert_eq!(calculate_precision(8, 10), 0.8);
/// assert_eq!(calculate_precision(0, 0), 0.0);
/// ```
#[must_use]
pub fn calculate_precision(right: usize, total_predictions: usize) -> f64 {
    if total_predictions == 0 {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let precision = right as f64 / total_predictions as f64;
    precision
}

/// Recall as matched pairs over ground-truth boxes.
///
/// Returns `0.0` when there were no ground-truth boxes.
#[must_use]
pub fn calculate_recall(right: usize, total_truths: usize) -> f64 {
    if total_truths == 0 {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let recall = right as f64 / total_truths as f64;
    recall
}

/// Calculate precision and recall from match and population counts.
///
/// # Example
///
/// ```
/// use table_detect_eval::metrics::precision_recall::calculate_precision_recall;
///
/// let pr = calculate_precision_recall(8, 10, 11);
/// assert_eq!(pr.precision, 0.8);
/// assert!((pr.recall - 0.7272).abs() < 0.001);
/// ```
pub fn calculate_precision_recall(
    right: usize,
    total_predictions: usize,
    total_truths: usize,
) -> PrecisionRecall {
    PrecisionRecall {
        precision: calculate_precision(right, total_predictions),
        recall: calculate_recall(right, total_truths),
        right,
        total_predictions,
        total_truths,
    }
}
