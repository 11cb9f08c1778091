use ndarray::{Array4, ArrayView3, Axis};

/// A single captured frame: contiguous interleaved bytes in row-major order.
///
/// Color frames carry 3 channels (RGB), RGB-D frames carry a fourth channel
/// holding depth as intensity. Single-channel frames are used for heat-map
/// visualizations. Format conversion happens at the source adapters only.
///
/// Construction does not validate the buffer; frames from outside the crate
/// are checked with [`Frame::is_well_formed`] before any pixel is read.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of bytes the dimensions call for.
    pub fn expected_len(&self) -> usize {
        let (h, w, c) = self.shape();
        h * w * c
    }

    pub fn is_well_formed(&self) -> bool {
        self.data.len() == self.expected_len()
    }

    /// Panics if the frame is not well formed.
    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Normalized `[1, H, W, C]` float tensor with values in `[0, 1]`.
    pub fn to_tensor(&self) -> Array4<f32> {
        self.as_ndarray()
            .mapv(|v| v as f32 / 255.0)
            .insert_axis(Axis(0))
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
