//! Greedy Non-Maximum Suppression (`NMS`) over thresholded candidates
//!
//! Suppression is a tombstone: a suppressed candidate keeps its slot and has
//! its confidence forced to `0.0`, so indices stay stable during the sweep.
//! Suppression is class-agnostic.

use std::cmp::Ordering;

use crate::error::Result;
use crate::metrics::iou::center_iou;
use crate::threshold::validate_threshold;
use crate::types::Candidate;

/// Confidence written into a suppressed candidate.
pub const SUPPRESSED: f64 = 0.0;

/// Sort candidates by confidence, highest first.
///
/// The sort is stable: equal confidences keep their enumeration order.
pub fn sort_by_confidence(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });
}

/// Apply greedy Non-Maximum Suppression in place.
///
/// `candidates` must already be sorted by [`sort_by_confidence`]. Every
/// candidate still at or above `pred_thresh` suppresses each later candidate
/// whose center-form IoU with it exceeds `nms_thresh`.
///
/// # Arguments
///
/// * `candidates` - Confidence-sorted candidates
/// * `pred_thresh` - Confidence a candidate needs to act as a suppressor
/// * `nms_thresh` - `IoU` above which the later candidate is suppressed
///
/// # Returns
///
/// Number of candidates that went from live to suppressed
///
/// # Errors
///
/// Returns error if either threshold is not in range [0.0, 1.0]
///
/// # Examples
///
/// ```
/// # use table_detect_eval::nms::non_maximum_suppression;
/// # use table_detect_eval::types::{Candidate, CenterBox, GridCell};
/// let cell = GridCell { row: 0, col: 0, anchor: 0 };
/// let mut candidates = vec![
///     Candidate { bbox: CenterBox::new(0.30, 0.30, 0.2, 0.2), confidence: 0.95, class_id: 0, cell },
///     Candidate { bbox: CenterBox::new(0.32, 0.30, 0.2, 0.2), confidence: 0.85, class_id: 0, cell },
///     Candidate { bbox: CenterBox::new(0.80, 0.80, 0.1, 0.1), confidence: 0.70, class_id: 0, cell },
/// ];
///
/// let suppressed = non_maximum_suppression(&mut candidates, 0.5, 0.5).unwrap();
/// assert_eq!(suppressed, 1);
/// assert_eq!(candidates[1].confidence, 0.0);
/// assert_eq!(candidates[2].confidence, 0.70);
/// ```
pub fn non_maximum_suppression(
    candidates: &mut [Candidate],
    pred_thresh: f64,
    nms_thresh: f64,
) -> Result<usize> {
    validate_threshold(pred_thresh, "pred_thresh")?;
    validate_threshold(nms_thresh, "nms_thresh")?;

    Ok(suppress_overlaps(candidates, pred_thresh, nms_thresh))
}

/// The suppression sweep behind [`non_maximum_suppression`], without
/// threshold validation.
///
/// Callers holding a validated [`DetectionConfig`](crate::config::DetectionConfig)
/// use this directly. Returns the number of candidates suppressed.
pub fn suppress_overlaps(candidates: &mut [Candidate], pred_thresh: f64, nms_thresh: f64) -> usize {
    let mut suppressed = 0;

    for i in 0..candidates.len() {
        if candidates[i].confidence < pred_thresh {
            continue;
        }

        let (head, tail) = candidates.split_at_mut(i + 1);
        let keeper = &head[i];

        for other in tail.iter_mut() {
            if center_iou(&keeper.bbox, &other.bbox) > nms_thresh {
                if other.confidence >= pred_thresh {
                    suppressed += 1;
                }
                other.confidence = SUPPRESSED;
            }
        }
    }

    suppressed
}
