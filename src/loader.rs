//! JSON loading of page layouts and export of detection results.
//!
//! The layout file is keyed by document id then page id:
//!
//! ```json
//! {
//!   "169": {
//!     "3": {
//!       "size": [612.0, 792.0],
//!       "tables": [{"position": [70.0, 540.0, 100.0, 380.0], "texts": [], "lines": [], "cells": [], "curves": []}],
//!       "texts": [{"position": [70.0, 200.0, 60.0, 72.0], "type": 1, "sentence": "Results"}],
//!       "others": [],
//!       "curves": []
//!     }
//!   }
//! }
//! ```
//!
//! Every `position` is `[left, right, top, bottom]` in page units with the
//! origin at the top-left corner.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, TableEvalError};
use crate::types::{CenterBox, Detection, GroundTruth};

/// `[left, right, top, bottom]`
pub type Position = [f64; 4];

/// Text run on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBox {
    pub position: Position,
    #[serde(rename = "type", default)]
    pub kind: i64,
    #[serde(default)]
    pub sentence: String,
}

/// Line, curve or other graphic element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutBox {
    pub position: Position,
    #[serde(rename = "type", default)]
    pub kind: i64,
}

/// Table region together with the elements that fall inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableBox {
    pub position: Position,
    #[serde(default)]
    pub texts: Vec<TextBox>,
    #[serde(default)]
    pub lines: Vec<LayoutBox>,
    #[serde(default)]
    pub cells: Vec<LayoutBox>,
    #[serde(default)]
    pub curves: Vec<LayoutBox>,
}

impl TableBox {
    pub fn left(&self) -> f64 {
        self.position[0]
    }

    pub fn right(&self) -> f64 {
        self.position[1]
    }

    pub fn top(&self) -> f64 {
        self.position[2]
    }

    pub fn bottom(&self) -> f64 {
        self.position[3]
    }

    /// Check if the table has positive extent.
    pub fn is_valid(&self) -> bool {
        self.right() > self.left() && self.bottom() > self.top()
    }
}

/// One preprocessed page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    /// `[width, height]`
    pub size: [f64; 2],
    #[serde(default)]
    pub texts: Vec<TextBox>,
    #[serde(default)]
    pub tables: Vec<TableBox>,
    #[serde(default)]
    pub others: Vec<LayoutBox>,
    #[serde(default)]
    pub curves: Vec<LayoutBox>,
}

impl PageLayout {
    pub fn width(&self) -> f64 {
        self.size[0]
    }

    pub fn height(&self) -> f64 {
        self.size[1]
    }

    /// Tables of this page as normalized center-form labels.
    ///
    /// Tables without positive extent are skipped.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLayout` if the page size is not positive.
    pub fn table_labels(&self, class_id: usize) -> Result<Vec<GroundTruth>> {
        validate_size(self.size)?;

        let (width, height) = (self.width(), self.height());
        let mut labels = Vec::with_capacity(self.tables.len());
        for table in &self.tables {
            if !table.is_valid() {
                warn!(position = ?table.position, "skipping degenerate table");
                continue;
            }
            labels.push(GroundTruth::new(
                class_id,
                CenterBox::new(
                    (table.left() + table.right()) / 2.0 / width,
                    (table.top() + table.bottom()) / 2.0 / height,
                    (table.right() - table.left()) / width,
                    (table.bottom() - table.top()) / height,
                ),
            ));
        }
        Ok(labels)
    }
}

/// Layouts for a whole corpus: document id → page id → page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayoutDataset {
    pub documents: BTreeMap<String, BTreeMap<String, PageLayout>>,
}

impl LayoutDataset {
    /// Iterate `(doc_id, page_id, page)` in key order.
    pub fn pages(&self) -> impl Iterator<Item = (&str, &str, &PageLayout)> + '_ {
        self.documents.iter().flat_map(|(doc, pages)| {
            pages
                .iter()
                .map(move |(page, layout)| (doc.as_str(), page.as_str(), layout))
        })
    }

    pub fn page_count(&self) -> usize {
        self.documents.values().map(BTreeMap::len).sum()
    }

    pub fn get(&self, doc_id: &str, page_id: &str) -> Option<&PageLayout> {
        self.documents.get(doc_id)?.get(page_id)
    }
}

fn validate_size(size: [f64; 2]) -> Result<()> {
    if !(size[0] > 0.0 && size[1] > 0.0) || !size[0].is_finite() || !size[1].is_finite() {
        return Err(TableEvalError::InvalidLayout(format!(
            "page size must be positive, got {size:?}"
        )));
    }
    Ok(())
}

/// Check page sizes and table coordinates of a dataset.
pub fn validate_dataset(dataset: &LayoutDataset) -> Result<()> {
    for (doc, page, layout) in dataset.pages() {
        validate_size(layout.size).map_err(|_| {
            TableEvalError::InvalidLayout(format!(
                "document {doc} page {page} has invalid size {:?}",
                layout.size
            ))
        })?;

        for table in &layout.tables {
            if table.position.iter().any(|v| !v.is_finite()) {
                return Err(TableEvalError::InvalidBoundingBox(format!(
                    "document {doc} page {page} has a table at {:?}",
                    table.position
                )));
            }
        }
    }
    Ok(())
}

/// Load page layouts from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed or has a page with a
/// non-positive size.
///
/// # Example
///
/// ```no_run
/// use table_detect_eval::loader::load_layouts_from_file;
///
/// let layouts = load_layouts_from_file("texts.json").unwrap();
/// println!("Loaded {} pages", layouts.page_count());
/// ```
pub fn load_layouts_from_file<P: AsRef<Path>>(path: P) -> Result<LayoutDataset> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let dataset: LayoutDataset = serde_json::from_reader(reader)?;

    validate_dataset(&dataset)?;

    Ok(dataset)
}

/// Load page layouts from a JSON string.
///
/// # Example
///
/// ```
/// use table_detect_eval::loader::load_layouts_from_str;
///
/// let json = r#"{"1": {"0": {"size": [100.0, 200.0], "tables": [{"position": [10.0, 50.0, 20.0, 60.0]}]}}}"#;
/// let layouts = load_layouts_from_str(json).unwrap();
/// let labels = layouts.get("1", "0").unwrap().table_labels(0).unwrap();
/// assert_eq!(labels[0].bbox.w, 0.4);
/// ```
pub fn load_layouts_from_str(json_str: &str) -> Result<LayoutDataset> {
    let dataset: LayoutDataset = serde_json::from_str(json_str)?;
    validate_dataset(&dataset)?;
    Ok(dataset)
}

/// Serialize per-image detections as a JSON array of arrays.
pub fn detections_to_json(detections: &[Vec<Detection>]) -> Result<String> {
    Ok(serde_json::to_string_pretty(detections)?)
}

/// Write per-image detections to a JSON file.
pub fn write_detections_to_file<P: AsRef<Path>>(path: P, detections: &[Vec<Detection>]) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, detections)?;
    writer.flush()?;
    Ok(())
}
