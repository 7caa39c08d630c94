//! Grid-relative box decoding and raw tensor channel layout.
//!
//! The detector network emits, per `(row, col, anchor)`, a vector laid out as
//! `[confidence, tx, ty, w, h, class_0, class_1, ...]`. `tx`/`ty` are offsets
//! inside the cell; `w`/`h` are already normalized to the image.

use ndarray::{s, Array5, ArrayView4, ArrayView5};

use crate::error::{Result, TableEvalError};

/// Channel holding the objectness confidence.
pub const CONFIDENCE_CHANNEL: usize = 0;
/// First of the four box channels `(tx, ty, w, h)`.
pub const BOX_CHANNEL: usize = 1;
/// First class-score channel.
pub const CLASS_CHANNEL: usize = 5;

/// Decodes cell-relative `(tx, ty)` offsets into normalized image centers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxDecoder {
    grid_rows: usize,
    grid_cols: usize,
}

impl BoxDecoder {
    pub fn new(grid_rows: usize, grid_cols: usize) -> Self {
        Self { grid_rows, grid_cols }
    }

    pub fn grid_rows(&self) -> usize {
        self.grid_rows
    }

    pub fn grid_cols(&self) -> usize {
        self.grid_cols
    }

    /// Decode a `(batch, grid_rows, grid_cols, anchors, >=2)` coordinate tensor.
    ///
    /// Channel 0 becomes `(tx + col) / grid_cols` and channel 1 becomes
    /// `(ty + row) / grid_rows`; any further channels are copied through.
    /// The shape is a precondition, callers validate it at intake.
    ///
    /// # Example
    ///
    /// ```
    /// use ndarray::Array5;
    /// use table_detect_eval::decode::BoxDecoder;
    ///
    /// let coords = Array5::<f32>::from_elem((1, 2, 4, 1, 4), 0.5);
    /// let decoded = BoxDecoder::new(2, 4).decode(coords.view());
    /// assert_eq!(decoded[[0, 1, 3, 0, 0]], 3.5 / 4.0);
    /// assert_eq!(decoded[[0, 1, 3, 0, 1]], 1.5 / 2.0);
    /// assert_eq!(decoded[[0, 1, 3, 0, 2]], 0.5);
    /// ```
    pub fn decode(&self, coords: ArrayView5<f32>) -> Array5<f32> {
        debug_assert!(coords.shape()[1] == self.grid_rows && coords.shape()[2] == self.grid_cols);
        debug_assert!(coords.shape()[4] >= 2);

        let cols = self.grid_cols as f32;
        let rows = self.grid_rows as f32;
        let mut decoded = coords.to_owned();

        for ((_, _, col, _), x) in decoded.slice_mut(s![.., .., .., .., 0]).indexed_iter_mut() {
            *x = (*x + col as f32) / cols;
        }
        for ((_, row, _, _), y) in decoded.slice_mut(s![.., .., .., .., 1]).indexed_iter_mut() {
            *y = (*y + row as f32) / rows;
        }

        decoded
    }
}

/// Channel views into a raw score tensor.
#[derive(Debug, Clone)]
pub struct RawChannels<'a> {
    /// `(batch, rows, cols, anchors)`
    pub confidences: ArrayView4<'a, f32>,
    /// `(batch, rows, cols, anchors, 4)`, still cell-relative
    pub boxes: ArrayView5<'a, f32>,
    /// `(batch, rows, cols, anchors, n_classes)`
    pub class_scores: ArrayView5<'a, f32>,
}

/// Split a raw `(batch, rows, cols, anchors, 5 + n_classes)` tensor into its channels.
///
/// # Errors
///
/// Returns `InvalidShape` if the channel axis does not hold exactly
/// `5 + n_classes` values or if `n_classes` is zero.
pub fn split_raw(raw: ArrayView5<'_, f32>, n_classes: usize) -> Result<RawChannels<'_>> {
    let channels = raw.shape()[4];
    if n_classes == 0 || channels != CLASS_CHANNEL + n_classes {
        return Err(TableEvalError::InvalidShape(format!(
            "expected {} channels per anchor (5 + {n_classes} classes), got {channels}",
            CLASS_CHANNEL + n_classes
        )));
    }

    Ok(RawChannels {
        confidences: raw.clone().slice_move(s![.., .., .., .., CONFIDENCE_CHANNEL]),
        boxes: raw.clone().slice_move(s![.., .., .., .., BOX_CHANNEL..CLASS_CHANNEL]),
        class_scores: raw.slice_move(s![.., .., .., .., CLASS_CHANNEL..]),
    })
}
