//! IoU threshold ladder and threshold validation.

use crate::error::{Result, TableEvalError};

/// Number of IoU buckets in the evaluation ladder.
pub const N_BUCKETS: usize = 10;

/// IoU cut points, strongest first. Bucket `i` counts matches with `iou >= IOU_CUTOFFS[i]`.
pub const IOU_CUTOFFS: [f64; N_BUCKETS] = [0.9, 0.8, 0.7, 0.6, 0.5, 0.4, 0.3, 0.2, 0.1, 0.0];

/// Indices of every bucket a match with the given IoU falls into.
///
/// Buckets are cumulative, so a single match usually lands in several.
///
/// # Example
///
/// ```
/// use table_detect_eval::threshold::buckets_reached;
///
/// let reached: Vec<usize> = buckets_reached(0.81).collect();
/// assert_eq!(reached, vec![1, 2, 3, 4, 5, 6, 7, 8, 9]);
/// ```
pub fn buckets_reached(iou: f64) -> impl Iterator<Item = usize> {
    IOU_CUTOFFS
        .iter()
        .enumerate()
        .filter(move |&(_, &cutoff)| iou >= cutoff)
        .map(|(i, _)| i)
}

/// Position of `cutoff` in the ladder, tolerant of float noise.
pub fn bucket_index(cutoff: f64) -> Option<usize> {
    IOU_CUTOFFS.iter().position(|&c| (c - cutoff).abs() < 1e-6)
}

/// Validate that a threshold is finite and in the range [0.0, 1.0].
pub fn validate_threshold(threshold: f64, name: &str) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(TableEvalError::InvalidThreshold(format!(
            "{name} must be between 0.0 and 1.0, got {threshold}"
        )));
    }
    Ok(())
}
