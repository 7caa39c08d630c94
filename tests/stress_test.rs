//! Stress tests with large grids, batches and crowded pages.

use ndarray::{Array5, Axis};
use table_detect_eval::config::DetectionConfig;
use table_detect_eval::detector::Detector;
use table_detect_eval::evaluator::Evaluator;
use table_detect_eval::matching::match_detections;
use table_detect_eval::nms::{non_maximum_suppression, sort_by_confidence};
use table_detect_eval::types::{
    Candidate, CenterBox, CornerBox, Detection, GridCell, GroundTruth, GroundTruthBox,
};

/// Deterministic pseudo-random fill in [0, 1).
fn pseudo_random_raw(config: &DetectionConfig, batch: usize) -> Array5<f32> {
    let mut state: u32 = 0x2545_f491;
    Array5::from_shape_fn(config.raw_shape(batch), |_| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        (state % 10_000) as f32 / 10_000.0
    })
}

#[test]
fn test_parallel_batch_matches_per_image_detection() {
    let config = DetectionConfig::new(448, 448, 14, 14, 5, 2).with_pred_thresh(0.9);
    let detector = Detector::new(config.clone()).unwrap();
    let raw = pseudo_random_raw(&config, 16);

    let batch = detector.detect_batch(raw.view()).unwrap();
    assert_eq!(batch.len(), 16);

    let channels = table_detect_eval::decode::split_raw(raw.view(), config.n_classes).unwrap();
    let decoded = detector.decoder().decode(channels.boxes);
    for (b, detections) in batch.iter().enumerate() {
        let expected = detector.detect_image(
            channels.confidences.index_axis(Axis(0), b),
            decoded.index_axis(Axis(0), b),
            channels.class_scores.index_axis(Axis(0), b),
        );
        assert_eq!(detections, &expected, "image {b} differs");
    }
}

#[test]
fn test_random_batch_survivors_respect_thresholds() {
    let config = DetectionConfig::new(448, 448, 14, 14, 5, 2).with_pred_thresh(0.6);
    let detector = Detector::new(config.clone()).unwrap();
    let raw = pseudo_random_raw(&config, 8);

    let (detections, stats): (Vec<_>, Vec<_>) =
        detector.detect_batch_with_stats(raw.view()).unwrap().into_iter().unzip();

    for (dets, stats) in detections.iter().zip(stats.iter()) {
        assert_eq!(dets.len(), stats.emitted);
        assert_eq!(stats.candidates, stats.suppressed + stats.emitted);
        assert!(dets.iter().all(|d| d.confidence >= 0.6));
        assert!(dets.windows(2).all(|w| w[0].confidence >= w[1].confidence));
        for d in dets {
            assert!(d.bbox.left >= 0.0 && d.bbox.right <= 448.0);
            assert!(d.bbox.top >= 0.0 && d.bbox.bottom <= 448.0);
        }
    }
}

#[test]
fn test_crowded_cluster_collapses_to_one() {
    let mut candidates: Vec<Candidate> = (0..500)
        .map(|i| Candidate {
            bbox: CenterBox::new(0.5 + (i % 7) as f64 * 0.001, 0.5, 0.3, 0.3),
            confidence: 0.5 + (i as f64) / 1000.0,
            class_id: i % 2,
            cell: GridCell { row: 0, col: 0, anchor: 0 },
        })
        .collect();

    sort_by_confidence(&mut candidates);
    let suppressed = non_maximum_suppression(&mut candidates, 0.5, 0.5).unwrap();

    assert_eq!(suppressed, 499);
    assert!((candidates[0].confidence - 0.999).abs() < 1e-12);
    assert!(candidates[1..].iter().all(|c| c.confidence == 0.0));
}

#[test]
fn test_1000_tables_single_page() {
    let truths: Vec<GroundTruthBox> = (0..1000)
        .map(|i| {
            let x = (i % 40) as f64 * 25.0;
            let y = (i / 40) as f64 * 25.0;
            GroundTruthBox::new(0, CornerBox::new(x, y, x + 20.0, y + 20.0))
        })
        .collect();
    let predictions: Vec<Detection> = truths
        .iter()
        .rev()
        .map(|t| Detection::new(t.bbox, 0.9, 0))
        .collect();

    let pairs = match_detections(&truths, &predictions, 0.4);
    assert_eq!(pairs.len(), 1000);
    for pair in &pairs {
        assert_eq!(pair.truth_index, 999 - pair.prediction_index);
    }
}

#[test]
fn test_many_batches_accumulate() {
    let config = DetectionConfig::new(100, 100, 2, 2, 1, 1);
    let evaluator = Evaluator::new(config.clone()).unwrap();

    let mut raw = Array5::<f32>::zeros(config.raw_shape(4));
    for b in 0..4 {
        raw[[b, 0, 0, 0, 0]] = 0.9;
        raw[[b, 0, 0, 0, 1]] = 0.5;
        raw[[b, 0, 0, 0, 2]] = 0.5;
        raw[[b, 0, 0, 0, 3]] = 0.2;
        raw[[b, 0, 0, 0, 4]] = 0.2;
    }
    let labels: Vec<Vec<GroundTruth>> =
        (0..4).map(|_| vec![GroundTruth::from((0, 0.25, 0.25, 0.2, 0.2))]).collect();

    let batches: Vec<_> = (0..100).map(|_| (raw.view(), labels.as_slice())).collect();
    let metrics = evaluator.evaluate(batches).unwrap();

    assert_eq!(metrics.total_predictions, 400);
    assert_eq!(metrics.total_truths, 400);
    assert_eq!(metrics.right[0], 400);
    assert!((metrics.f1[0] - 1.0).abs() < 1e-12);
}
