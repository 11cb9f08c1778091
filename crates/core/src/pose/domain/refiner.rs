use ndarray::Array4;

use crate::shared::tracker_error::TrackerError;

/// Pose regression network.
///
/// Maps a normalized `[1, S, S, C]` cutout tensor to a flat vector of
/// regressed parameters (see [`PoseEstimate`](super::pose_estimate::PoseEstimate)
/// for the layout).
pub trait Refiner: Send {
    fn infer(&mut self, input: Array4<f32>) -> Result<Vec<f32>, TrackerError>;
}
