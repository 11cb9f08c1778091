use serde::{Deserialize, Serialize};

use crate::detection::domain::detection::Detection;
use crate::geometry::domain::coordinates::{frame_to_ndc, Ndc};
use crate::geometry::domain::projection::{CameraPoint, Projection};
use crate::pose::domain::pose_estimate::PoseEstimate;
use crate::shared::tracker_error::TrackerError;

/// Head orientation in radians, as regressed by the pose network.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeadDirection {
    pub yaw: f64,
    pub pitch: f64,
}

/// The authoritative per-frame tracking output.
///
/// `head_pos` is `None` when the back-projection was degenerate; the screen
/// and NDC coordinates are still valid in that case.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaceResult {
    pub screen_x: f64,
    pub screen_y: f64,
    pub ndc: Ndc,
    pub head_pos: Option<CameraPoint>,
    pub head_dir: HeadDirection,
    pub skin_color: Option<[f32; 3]>,
}

impl FaceResult {
    /// Combines a detection with the pose estimated from its cutout.
    pub fn reconstruct(
        detection: &Detection,
        pose: &PoseEstimate,
        frame_width: u32,
        frame_height: u32,
        projection: &Projection,
    ) -> Self {
        let screen_x = detection.frame_x as f64 + pose.delta_x as f64;
        let screen_y = detection.frame_y as f64 + pose.delta_y as f64;
        let (x, y) = frame_to_ndc(screen_x, screen_y, frame_width, frame_height);
        let ndc = Ndc {
            x,
            y,
            z: pose.ndc_z as f64,
        };

        let head_pos = match projection.ndc_to_camera(ndc) {
            Ok(point) => Some(point),
            Err(err @ TrackerError::DegenerateProjection { .. }) => {
                log::debug!("Dropping head position: {err}");
                None
            }
            Err(err) => {
                log::warn!("Unexpected back-projection failure: {err}");
                None
            }
        };

        Self {
            screen_x,
            screen_y,
            ndc,
            head_pos,
            head_dir: HeadDirection {
                yaw: pose.head_yaw as f64,
                pitch: pose.head_pitch as f64,
            },
            skin_color: pose.skin_color,
        }
    }
}
