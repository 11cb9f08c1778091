use ndarray::Array4;

use crate::shared::tracker_error::TrackerError;

/// Coarse face localization network.
///
/// Maps a normalized `[1, H, W, C]` frame tensor to a
/// `[1, H / factor, W / factor, 1]` tensor of face probabilities in `[0, 1]`.
/// Implementations may keep inference state, hence `&mut self`.
pub trait Localizer: Send {
    fn infer(&mut self, input: Array4<f32>) -> Result<Array4<f32>, TrackerError>;
}
