use serde::{Deserialize, Serialize};

use crate::geometry::domain::coordinates::Ndc;
use crate::geometry::domain::projection::CameraPoint;
use crate::pose::domain::face_result::HeadDirection;
use crate::shared::frame::Frame;

/// Known face parameters of an annotated frame, as rendered.
///
/// Screen coordinates are frame pixels at the tracker's frame size.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroundTruth {
    pub screen_x: f64,
    pub screen_y: f64,
    pub ndc: Ndc,
    pub head_pos: CameraPoint,
    pub head_dir: HeadDirection,
    pub skin_color: Option<[f32; 3]>,
}

#[derive(Clone, Debug)]
pub struct AnnotatedSample {
    pub frame: Frame,
    pub truth: GroundTruth,
}
