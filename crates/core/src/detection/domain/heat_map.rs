use ndarray::{Array2, ArrayView4};

use crate::shared::frame::Frame;
use crate::shared::tracker_error::TrackerError;

/// Per-cell face probabilities produced by the localization network.
///
/// Indexed `[y, x]` over the downsampled grid
/// (`frame_height / factor` rows by `frame_width / factor` columns).
#[derive(Clone, Debug, PartialEq)]
pub struct HeatMap {
    values: Array2<f32>,
}

/// The strongest cell of a heat map.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Peak {
    pub x: usize,
    pub y: usize,
    pub value: f32,
}

/// A peak cell and its 4-neighborhood. Neighbors outside the grid read as 0.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighborhood {
    pub center: f32,
    pub left: f32,
    pub right: f32,
    pub up: f32,
    pub down: f32,
}

impl HeatMap {
    pub fn new(values: Array2<f32>) -> Self {
        Self { values }
    }

    /// Builds a heat map from a `[1, H, W, 1]` network output.
    pub fn from_tensor(tensor: ArrayView4<'_, f32>) -> Result<Self, TrackerError> {
        let shape = tensor.shape();
        if shape[0] != 1 || shape[3] != 1 {
            return Err(TrackerError::shape_mismatch(
                "scan output",
                &[1, shape[1], shape[2], 1],
                shape,
            ));
        }
        let values = tensor
            .index_axis(ndarray::Axis(0), 0)
            .index_axis(ndarray::Axis(2), 0)
            .to_owned();
        Ok(Self { values })
    }

    pub fn width(&self) -> usize {
        self.values.ncols()
    }

    pub fn height(&self) -> usize {
        self.values.nrows()
    }

    pub fn value(&self, x: usize, y: usize) -> f32 {
        self.values[[y, x]]
    }

    /// Finds the maximum cell, scanning rows top to bottom and each row left
    /// to right. Only a strictly greater value replaces the current best, so
    /// ties resolve to the first cell encountered. NaN cells never win.
    pub fn peak(&self) -> Option<Peak> {
        let mut best: Option<Peak> = None;
        for ((y, x), &value) in self.values.indexed_iter() {
            if value.is_nan() {
                continue;
            }
            if best.map_or(true, |b| value > b.value) {
                best = Some(Peak { x, y, value });
            }
        }
        best
    }

    pub fn neighborhood(&self, x: usize, y: usize) -> Neighborhood {
        let at = |cx: Option<usize>, cy: Option<usize>| match (cx, cy) {
            (Some(cx), Some(cy)) if cx < self.width() && cy < self.height() => {
                self.values[[cy, cx]]
            }
            _ => 0.0,
        };
        Neighborhood {
            center: self.values[[y, x]],
            left: at(x.checked_sub(1), Some(y)),
            right: at(Some(x + 1), Some(y)),
            up: at(Some(x), y.checked_sub(1)),
            down: at(Some(x), Some(y + 1)),
        }
    }

    /// Single-channel byte image of the heat map, `[0, 1]` scaled to `[0, 255]`.
    pub fn to_image(&self, index: usize) -> Frame {
        let data = self
            .values
            .iter()
            .map(|&v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect();
        Frame::new(data, self.width() as u32, self.height() as u32, 1, index)
    }
}
