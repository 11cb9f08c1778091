//! Conversions between heat-map grid space, frame pixel space and NDC.
//!
//! Grid cell `p` covers frame pixels `[p * factor, (p + 1) * factor)`; its
//! center sits at `(p + 0.5) * factor`.

use serde::{Deserialize, Serialize};

/// Normalized device coordinates: x right, y up, both in `[-1, 1]` on screen.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ndc {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Maps a (sub-cell adjusted) grid cell to the frame pixel at its center.
pub fn grid_to_frame(gx: f64, gy: f64, factor: u32) -> (f64, f64) {
    let f = factor as f64;
    ((gx + 0.5) * f, (gy + 0.5) * f)
}

/// Maps a frame pixel position to NDC x/y. Frame y grows downward, NDC y upward.
pub fn frame_to_ndc(px: f64, py: f64, frame_width: u32, frame_height: u32) -> (f64, f64) {
    (
        2.0 * px / frame_width as f64 - 1.0,
        1.0 - 2.0 * py / frame_height as f64,
    )
}

/// Inverse of [`frame_to_ndc`].
pub fn ndc_to_frame(nx: f64, ny: f64, frame_width: u32, frame_height: u32) -> (f64, f64) {
    (
        (nx + 1.0) * frame_width as f64 / 2.0,
        (1.0 - ny) * frame_height as f64 / 2.0,
    )
}
