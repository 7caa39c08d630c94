//! Property-based tests using proptest
//!
//! These tests verify geometric and counting invariants that should
//! always hold regardless of the input values.

use std::collections::HashSet;

use proptest::prelude::*;
use table_detect_eval::matching::match_detections;
use table_detect_eval::metrics::{
    calculate_f1_score, calculate_iou, calculate_precision, calculate_recall, center_iou,
    corner_iou,
};
use table_detect_eval::nms::{non_maximum_suppression, sort_by_confidence};
use table_detect_eval::scorer::EvaluationAccumulator;
use table_detect_eval::types::{
    BoxForm, Candidate, CenterBox, CornerBox, Detection, GridCell, GroundTruthBox, MatchPair,
};

fn corner_box() -> impl Strategy<Value = CornerBox> {
    (0.0f64..500.0, 0.0f64..500.0, 1.0f64..200.0, 1.0f64..200.0)
        .prop_map(|(x, y, w, h)| CornerBox::new(x, y, x + w, y + h))
}

fn center_box() -> impl Strategy<Value = CenterBox> {
    (0.0f64..1.0, 0.0f64..1.0, 0.01f64..0.5, 0.01f64..0.5)
        .prop_map(|(x, y, w, h)| CenterBox::new(x, y, w, h))
}

fn candidates() -> impl Strategy<Value = Vec<Candidate>> {
    prop::collection::vec((center_box(), 0.5f64..1.0, 0usize..3), 1..30).prop_map(|items| {
        items
            .into_iter()
            .map(|(bbox, confidence, class_id)| Candidate {
                bbox,
                confidence,
                class_id,
                cell: GridCell { row: 0, col: 0, anchor: 0 },
            })
            .collect()
    })
}

// Property: IoU is in [0, 1] and symmetric
proptest! {
    #[test]
    fn prop_iou_range_and_symmetry(a in corner_box(), b in corner_box()) {
        let ab = corner_iou(&a, &b);
        let ba = corner_iou(&b, &a);
        prop_assert!((0.0..=1.0).contains(&ab), "IoU should be in [0,1], got {}", ab);
        prop_assert!((ab - ba).abs() < 1e-12, "IoU should be symmetric: {} vs {}", ab, ba);
    }

    #[test]
    fn prop_self_iou_is_one(a in corner_box()) {
        let iou = corner_iou(&a, &a);
        prop_assert!((iou - 1.0).abs() < 1e-6, "Self IoU should be ~1.0, got {}", iou);
    }

    #[test]
    fn prop_forms_agree(a in center_box(), b in center_box()) {
        let from_center = center_iou(&a, &b);
        let from_corners = corner_iou(&a.to_corners(), &b.to_corners());
        prop_assert!((from_center - from_corners).abs() < 1e-12);

        let raw = calculate_iou([a.x, a.y, a.w, a.h], [b.x, b.y, b.w, b.h], BoxForm::CenterSize);
        prop_assert!((raw - from_center).abs() < 1e-12);
    }

    #[test]
    fn prop_disjoint_boxes_have_zero_iou(a in corner_box(), gap in 1.0f64..50.0) {
        let shift = a.width() + gap;
        let b = CornerBox::new(a.left + shift, a.top, a.right + shift, a.bottom);
        prop_assert_eq!(corner_iou(&a, &b), 0.0);
    }
}

// Property: NMS keeps the strongest candidate and never revives one
proptest! {
    #[test]
    fn prop_nms_keeps_highest_confidence(
        mut cands in candidates(),
        nms_thresh in 0.0f64..1.0,
    ) {
        sort_by_confidence(&mut cands);
        let best = cands[0].confidence;
        let before: Vec<f64> = cands.iter().map(|c| c.confidence).collect();

        non_maximum_suppression(&mut cands, 0.5, nms_thresh).unwrap();

        prop_assert_eq!(cands[0].confidence, best);
        for (after, before) in cands.iter().zip(before.iter()) {
            prop_assert!(after.confidence == *before || after.confidence == 0.0);
        }
    }

    #[test]
    fn prop_nms_survivors_do_not_overlap(
        mut cands in candidates(),
        nms_thresh in 0.1f64..0.9,
    ) {
        sort_by_confidence(&mut cands);
        non_maximum_suppression(&mut cands, 0.5, nms_thresh).unwrap();

        let survivors: Vec<&Candidate> = cands.iter().filter(|c| c.confidence >= 0.5).collect();
        for i in 0..survivors.len() {
            for j in (i + 1)..survivors.len() {
                let iou = center_iou(&survivors[i].bbox, &survivors[j].bbox);
                prop_assert!(iou <= nms_thresh, "survivors overlap with IoU {}", iou);
            }
        }
    }
}

// Property: matching is injective and respects the floor and classes
proptest! {
    #[test]
    fn prop_matcher_injective(
        truths in prop::collection::vec((corner_box(), 0usize..2), 0..15),
        preds in prop::collection::vec((corner_box(), 0usize..2), 0..15),
        floor in 0.0f64..1.0,
    ) {
        let truths: Vec<GroundTruthBox> =
            truths.into_iter().map(|(b, c)| GroundTruthBox::new(c, b)).collect();
        let preds: Vec<Detection> =
            preds.into_iter().map(|(b, c)| Detection::new(b, 0.9, c)).collect();

        let pairs = match_detections(&truths, &preds, floor);

        let p: HashSet<usize> = pairs.iter().map(|m| m.prediction_index).collect();
        let t: HashSet<usize> = pairs.iter().map(|m| m.truth_index).collect();
        prop_assert_eq!(p.len(), pairs.len());
        prop_assert_eq!(t.len(), pairs.len());

        for pair in &pairs {
            prop_assert!(pair.iou >= floor);
            prop_assert_eq!(truths[pair.truth_index].class_id, preds[pair.prediction_index].class_id);
        }
        for w in pairs.windows(2) {
            prop_assert!(w[0].prediction_index < w[1].prediction_index);
        }
    }
}

// Property: bucket counts and derived scores
proptest! {
    #[test]
    fn prop_bucket_counts_monotonic(ious in prop::collection::vec(0.0f64..=1.0, 0..50)) {
        let mut acc = EvaluationAccumulator::new();
        for iou in &ious {
            acc.record_match(*iou);
        }
        for b in 1..acc.right.len() {
            prop_assert!(acc.right[b - 1] <= acc.right[b]);
        }
        prop_assert_eq!(acc.right[9], ious.len());
    }

    #[test]
    fn prop_merge_equals_sequential(
        first in prop::collection::vec(0.0f64..=1.0, 0..20),
        second in prop::collection::vec(0.0f64..=1.0, 0..20),
        counts in (0usize..50, 0usize..50, 0usize..50, 0usize..50),
    ) {
        let to_pairs = |ious: &[f64]| -> Vec<MatchPair> {
            ious.iter()
                .map(|&iou| MatchPair { prediction_index: 0, truth_index: 0, iou })
                .collect()
        };

        let mut sequential = EvaluationAccumulator::new();
        sequential.record_image(counts.0, counts.1, &to_pairs(first.as_slice()));
        sequential.record_image(counts.2, counts.3, &to_pairs(second.as_slice()));

        let mut a = EvaluationAccumulator::new();
        a.record_image(counts.0, counts.1, &to_pairs(first.as_slice()));
        let mut b = EvaluationAccumulator::new();
        b.record_image(counts.2, counts.3, &to_pairs(second.as_slice()));
        let merged = a.merge(b);

        prop_assert_eq!(merged.right, sequential.right);
        prop_assert_eq!(merged.matched, sequential.matched);
        prop_assert_eq!(merged.total_predictions, sequential.total_predictions);
        prop_assert_eq!(merged.total_truths, sequential.total_truths);
        prop_assert!((merged.iou_sum - sequential.iou_sum).abs() < 1e-9);
    }

    #[test]
    fn prop_scores_in_range(right in 0usize..100, extra_p in 0usize..100, extra_t in 0usize..100) {
        let p = calculate_precision(right, right + extra_p);
        let r = calculate_recall(right, right + extra_t);
        let f1 = calculate_f1_score(p, r);
        prop_assert!((0.0..=1.0).contains(&p));
        prop_assert!((0.0..=1.0).contains(&r));
        prop_assert!((0.0..=1.0).contains(&f1));
        prop_assert!(f1 <= p.max(r) + 1e-12);
    }
}
