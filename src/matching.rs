//! Greedy pairing of predicted detections with ground-truth boxes.

use std::collections::BTreeMap;

use crate::metrics::iou::corner_iou;
use crate::types::{Detection, GroundTruthBox, MatchPair};

/// Find the prediction a single truth box claims.
///
/// Only predictions of the same class are considered. The running best starts
/// at `match_iou_floor`, so a prediction qualifies with `iou >= match_iou_floor`;
/// among equal overlaps the later prediction wins.
///
/// # Returns
///
/// `(prediction_index, iou)` of the claimed prediction, or `None`.
pub fn best_prediction_for(
    truth: &GroundTruthBox,
    predictions: &[Detection],
    match_iou_floor: f64,
) -> Option<(usize, f64)> {
    let mut best_iou = match_iou_floor;
    let mut best = None;

    for (idx, prediction) in predictions.iter().enumerate() {
        if prediction.class_id != truth.class_id {
            continue;
        }

        let iou = corner_iou(&truth.bbox, &prediction.bbox);
        if iou >= best_iou {
            best_iou = iou;
            best = Some((idx, iou));
        }
    }

    best
}

/// Match predictions to ground-truth boxes for a single image.
///
/// Every truth first claims its best prediction (see [`best_prediction_for`]).
/// A prediction claimed by several truths keeps only the claimant with the
/// highest IoU; the first such claimant wins ties and the others stay
/// unmatched. The result is injective on both sides.
///
/// # Arguments
///
/// * `truths` - Ground-truth boxes in pixel corner form
/// * `predictions` - Emitted detections in pixel corner form
/// * `match_iou_floor` - Minimum IoU to accept a pair
///
/// # Returns
///
/// Matched pairs ordered by prediction index.
///
/// # Example
///
/// ```
/// use table_detect_eval::matching::match_detections;
/// use table_detect_eval::types::{CornerBox, Detection, GroundTruthBox};
///
/// let truths = vec![GroundTruthBox::new(0, CornerBox::new(10.0, 10.0, 50.0, 50.0))];
/// let predictions = vec![Detection::new(CornerBox::new(12.0, 12.0, 48.0, 48.0), 0.9, 0)];
///
/// let pairs = match_detections(&truths, &predictions, 0.4);
/// assert_eq!(pairs.len(), 1);
/// assert!((pairs[0].iou - 0.81).abs() < 1e-4);
/// ```
pub fn match_detections(
    truths: &[GroundTruthBox],
    predictions: &[Detection],
    match_iou_floor: f64,
) -> Vec<MatchPair> {
    let mut by_prediction: BTreeMap<usize, MatchPair> = BTreeMap::new();

    for (truth_index, truth) in truths.iter().enumerate() {
        let Some((prediction_index, iou)) = best_prediction_for(truth, predictions, match_iou_floor)
        else {
            continue;
        };

        let claim = MatchPair { prediction_index, truth_index, iou };
        by_prediction
            .entry(prediction_index)
            .and_modify(|held| {
                if claim.iou > held.iou {
                    *held = claim;
                }
            })
            .or_insert(claim);
    }

    by_prediction.into_values().collect()
}
