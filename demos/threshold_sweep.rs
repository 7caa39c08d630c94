//! Sweep the confidence gate and report precision, recall and F1 at IoU >= 0.5.

use ndarray::Array5;
use table_detect_eval::{DetectionConfig, Evaluator, GroundTruth};

fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // 4 pages on a 4x4 grid, one table each plus decoys of rising confidence
    let base = DetectionConfig::new(400, 400, 4, 4, 2, 1);
    let mut raw = Array5::<f32>::zeros(base.raw_shape(4));
    let mut labels = Vec::new();

    for b in 0..4 {
        let col = b;
        let x = (col as f64 + 0.5) / 4.0;
        labels.push(vec![GroundTruth::from((0, x, 0.375, 0.2, 0.3))]);

        // true table, confidence falls page by page
        let confidence = 0.9 - 0.15 * b as f32;
        for (c, v) in [confidence, 0.5, 0.5, 0.2, 0.28].iter().enumerate() {
            raw[[b, 1, col, 0, c]] = *v;
        }
        raw[[b, 1, col, 0, 5]] = 1.0;

        // decoy far from the table
        for (c, v) in [0.3 + 0.1 * b as f32, 0.5, 0.5, 0.15, 0.15].iter().enumerate() {
            raw[[b, 3, (col + 2) % 4, 1, c]] = *v;
        }
        raw[[b, 3, (col + 2) % 4, 1, 5]] = 1.0;
    }

    println!("pred_thresh | Predictions | Precision | Recall |   F1");
    println!("------------|-------------|-----------|--------|-------");

    let mut best = (0.0, 0.0);
    for step in 1..10 {
        let pred_thresh = step as f64 / 10.0;
        let evaluator = Evaluator::new(base.clone().with_pred_thresh(pred_thresh))?;
        let metrics = evaluator.evaluate_batch(raw.view(), &labels)?.finalize();

        let Some(at_half) = metrics.at_cutoff(0.5) else {
            continue;
        };
        println!(
            "{:>11.1} | {:>11} | {:>9.4} | {:>6.4} | {:>6.4}",
            pred_thresh, metrics.total_predictions, at_half.precision, at_half.recall, at_half.f1
        );

        if at_half.f1 > best.1 {
            best = (pred_thresh, at_half.f1);
        }
    }

    println!("\nBest F1 {:.4} at pred_thresh {:.1}", best.1, best.0);
    Ok(())
}
