//! Evaluate synthetic detector output against table labels from a layout file.
//!
//! Run with `RUST_LOG=debug cargo run --example evaluate_pages [texts.json]`.

use ndarray::Array5;
use table_detect_eval::{
    load_layouts_from_file, load_layouts_from_str, loader::detections_to_json, DetectionConfig,
    Evaluator, GroundTruth, LayoutDataset, IOU_CUTOFFS,
};

const SAMPLE_LAYOUTS: &str = r#"{
    "169": {
        "3": {
            "size": [612.0, 792.0],
            "tables": [{"position": [72.0, 540.0, 120.0, 380.0]}],
            "texts": [{"position": [72.0, 300.0, 80.0, 94.0], "type": 1, "sentence": "Table 2. Results"}]
        },
        "4": {
            "size": [612.0, 792.0],
            "tables": [
                {"position": [72.0, 290.0, 100.0, 300.0]},
                {"position": [320.0, 540.0, 420.0, 700.0]}
            ]
        }
    }
}"#;

fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Fake network output: every label lands in the cell holding its center,
/// slightly shrunk, plus one weak stray prediction per image.
fn synthesize_raw(config: &DetectionConfig, labels: &[Vec<GroundTruth>]) -> Array5<f32> {
    let mut raw = Array5::<f32>::zeros(config.raw_shape(labels.len()));
    let (rows, cols) = (config.grid_rows as f64, config.grid_cols as f64);

    for (b, image_labels) in labels.iter().enumerate() {
        for (i, label) in image_labels.iter().enumerate() {
            let col = ((label.bbox.x * cols) as usize).min(config.grid_cols - 1);
            let row = ((label.bbox.y * rows) as usize).min(config.grid_rows - 1);
            let anchor = i % config.anchors;
            let channels = [
                0.95 - 0.1 * i as f64,
                label.bbox.x * cols - col as f64,
                label.bbox.y * rows - row as f64,
                label.bbox.w * 0.92,
                label.bbox.h * 0.95,
            ];
            for (c, v) in channels.iter().enumerate() {
                raw[[b, row, col, anchor, c]] = *v as f32;
            }
            raw[[b, row, col, anchor, 5 + label.class_id]] = 1.0;
        }

        raw[[b, 0, 0, 0, 0]] = raw[[b, 0, 0, 0, 0]].max(0.35);
    }

    raw
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let layouts: LayoutDataset = match std::env::args().nth(1) {
        Some(path) => load_layouts_from_file(path)?,
        None => load_layouts_from_str(SAMPLE_LAYOUTS)?,
    };
    println!("Loaded {} pages", layouts.page_count());

    let config = DetectionConfig::new(448, 448, 14, 14, 2, 1).with_pred_thresh(0.5);
    let evaluator = Evaluator::new(config.clone())?;

    let labels = layouts
        .pages()
        .map(|(_, _, page)| page.table_labels(0))
        .collect::<Result<Vec<_>, _>>()?;

    let raw = synthesize_raw(&config, &labels);
    let detections = evaluator.detector().detect_batch(raw.view())?;
    let metrics = evaluator.evaluate_batch(raw.view(), &labels)?.finalize();

    println!("\n  IoU >= | Precision | Recall |   F1");
    println!("  -------|-----------|--------|-------");
    for (i, cutoff) in IOU_CUTOFFS.iter().enumerate() {
        println!(
            "  {:>6.1} | {:>9.4} | {:>6.4} | {:>6.4}",
            cutoff, metrics.precision[i], metrics.recall[i], metrics.f1[i]
        );
    }
    println!("\nMean matched IoU: {:.4}", metrics.overlap);

    println!("\nDetections:\n{}", detections_to_json(&detections)?);
    Ok(())
}
