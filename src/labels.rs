//! Ground-truth conversion from normalized labels to pixel boxes.

use crate::types::{GroundTruth, GroundTruthBox};

/// Convert one image's labels to pixel corner boxes.
///
/// Uses the same clamp-and-round policy as emitted detections so both sides
/// of a match live on the same pixel lattice.
///
/// # Example
///
/// ```
/// use table_detect_eval::labels::truth_boxes;
/// use table_detect_eval::types::GroundTruth;
///
/// let labels = vec![GroundTruth::from((0, 0.3, 0.3, 0.4, 0.4))];
/// let boxes = truth_boxes(&labels, 100, 100);
/// assert_eq!(boxes[0].bbox.left, 10.0);
/// assert_eq!(boxes[0].bbox.right, 50.0);
/// ```
pub fn truth_boxes(labels: &[GroundTruth], image_width: u32, image_height: u32) -> Vec<GroundTruthBox> {
    labels
        .iter()
        .map(|label| GroundTruthBox::new(label.class_id, label.bbox.to_pixels(image_width, image_height)))
        .collect()
}
