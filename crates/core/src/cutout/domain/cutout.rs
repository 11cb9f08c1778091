use ndarray::Array4;

use crate::shared::frame::Frame;
use crate::shared::tracker_error::TrackerError;

/// A square window of a frame centered on a detection, with the same channel
/// depth as the frame. Pixels that fall outside the frame are zero.
#[derive(Clone, Debug, PartialEq)]
pub struct Cutout {
    data: Vec<u8>,
    size: usize,
    channels: u8,
    center_x: i32,
    center_y: i32,
}

impl Cutout {
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Frame pixel the cutout is centered on.
    pub fn center(&self) -> (i32, i32) {
        (self.center_x, self.center_y)
    }

    /// Normalized `[1, S, S, C]` tensor for the pose network.
    pub fn to_tensor(&self) -> Array4<f32> {
        let values: Vec<f32> = self.data.iter().map(|&v| v as f32 / 255.0).collect();
        Array4::from_shape_vec((1, self.size, self.size, self.channels as usize), values)
            .expect("Cutout data length must match dimensions")
    }

    pub fn to_image(&self, index: usize) -> Frame {
        Frame::new(
            self.data.clone(),
            self.size as u32,
            self.size as u32,
            self.channels,
            index,
        )
    }
}

/// Copies fixed-size, zero-padded windows out of frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CutoutExtractor {
    size: usize,
}

impl CutoutExtractor {
    /// `size` must be odd so the window has a center pixel.
    pub fn new(size: usize) -> Result<Self, TrackerError> {
        if size == 0 || size % 2 == 0 {
            return Err(TrackerError::InvalidConfig(format!(
                "cutout size must be odd and positive, got {size}"
            )));
        }
        Ok(Self { size })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn half(&self) -> usize {
        (self.size - 1) / 2
    }

    /// Copies the window centered on `(center_x, center_y)`. No interpolation
    /// and no edge clamping: anything outside the frame stays black.
    pub fn extract(&self, frame: &Frame, center_x: i32, center_y: i32) -> Cutout {
        let size = self.size;
        let channels = frame.channels() as usize;
        let half = self.half() as i64;
        let fw = frame.width() as i64;
        let fh = frame.height() as i64;
        let src = frame.data();
        let mut data = vec![0u8; size * size * channels];

        // Horizontal overlap is the same for every row.
        let left = center_x as i64 - half;
        let x0 = left.max(0);
        let x1 = (left + size as i64).min(fw);

        if x0 < x1 {
            let span = (x1 - x0) as usize * channels;
            let dst_col = (x0 - left) as usize;
            for row in 0..size {
                let sy = center_y as i64 - half + row as i64;
                if sy < 0 || sy >= fh {
                    continue;
                }
                let src_start = (sy as usize * fw as usize + x0 as usize) * channels;
                let dst_start = (row * size + dst_col) * channels;
                data[dst_start..dst_start + span]
                    .copy_from_slice(&src[src_start..src_start + span]);
            }
        }

        Cutout {
            data,
            size,
            channels: frame.channels(),
            center_x,
            center_y,
        }
    }
}
