//! Intersection over Union (IoU) calculation.

use crate::types::{BoxForm, CenterBox, CornerBox};

/// Added to the union so two zero-area boxes never divide by zero.
pub const IOU_EPSILON: f64 = 1e-6;

/// Calculate the IoU between two corner-form boxes.
///
/// Boxes that only touch along an edge have zero overlap. Malformed boxes
/// (`right < left`) never raise; they simply produce `0.0`.
///
/// # Example
///
/// ```
/// use table_detect_eval::metrics::iou::corner_iou;
/// use table_detect_eval::types::CornerBox;
///
/// let a = CornerBox::new(0.0, 0.0, 10.0, 10.0);
/// let b = CornerBox::new(5.0, 5.0, 15.0, 15.0);
/// let iou = corner_iou(&a, &b);
/// assert!((iou - 25.0 / 175.0).abs() < 1e-6);
/// ```
pub fn corner_iou(a: &CornerBox, b: &CornerBox) -> f64 {
    let left = a.left.max(b.left);
    let top = a.top.max(b.top);
    let right = a.right.min(b.right);
    let bottom = a.bottom.min(b.bottom);

    // `!(x > y)` rather than `x <= y` so NaN coordinates also land here
    if !(right > left) || !(bottom > top) {
        return 0.0;
    }

    let intersection_area = (right - left) * (bottom - top);
    let union_area = a.area() + b.area() - intersection_area + IOU_EPSILON;

    let iou = intersection_area / union_area;
    if iou.is_nan() {
        return 0.0;
    }
    iou.clamp(0.0, 1.0)
}

/// Calculate the IoU between two center-size boxes.
pub fn center_iou(a: &CenterBox, b: &CenterBox) -> f64 {
    corner_iou(&a.to_corners(), &b.to_corners())
}

/// Calculate the IoU between two raw boxes interpreted according to `form`.
///
/// # Example
///
/// ```
/// use table_detect_eval::metrics::iou::calculate_iou;
/// use table_detect_eval::types::BoxForm;
///
/// let disjoint = calculate_iou([0.0, 0.0, 1.0, 1.0], [2.0, 2.0, 3.0, 3.0], BoxForm::Corner);
/// assert_eq!(disjoint, 0.0);
///
/// let same = calculate_iou([0.5, 0.5, 0.2, 0.2], [0.5, 0.5, 0.2, 0.2], BoxForm::CenterSize);
/// assert!(same > 0.999);
/// ```
pub fn calculate_iou(a: [f64; 4], b: [f64; 4], form: BoxForm) -> f64 {
    match form {
        BoxForm::CenterSize => center_iou(&CenterBox::from(a), &CenterBox::from(b)),
        BoxForm::Corner => corner_iou(&CornerBox::from(a), &CornerBox::from(b)),
    }
}

/// Calculate the IoU matrix between two sets of corner boxes.
///
/// `result[i][j]` is the IoU between `boxes1[i]` and `boxes2[j]`.
pub fn calculate_iou_matrix(boxes1: &[CornerBox], boxes2: &[CornerBox]) -> Vec<Vec<f64>> {
    boxes1
        .iter()
        .map(|a| boxes2.iter().map(|b| corner_iou(a, b)).collect())
        .collect()
}
