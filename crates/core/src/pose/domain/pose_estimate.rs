use serde::{Deserialize, Serialize};

use crate::shared::tracker_error::TrackerError;

/// Width of the pose network's output vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PoseOutputs {
    /// Offset, depth and orientation only.
    Five,
    /// Additionally regresses the skin color.
    #[default]
    Eight,
}

impl PoseOutputs {
    pub fn count(self) -> usize {
        match self {
            PoseOutputs::Five => 5,
            PoseOutputs::Eight => 8,
        }
    }

    pub fn has_skin_color(self) -> bool {
        self == PoseOutputs::Eight
    }
}

impl TryFrom<u8> for PoseOutputs {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            5 => Ok(PoseOutputs::Five),
            8 => Ok(PoseOutputs::Eight),
            other => Err(format!("pose_outputs must be 5 or 8, got {other}")),
        }
    }
}

impl From<PoseOutputs> for u8 {
    fn from(outputs: PoseOutputs) -> Self {
        outputs.count() as u8
    }
}

/// Decoded pose network output.
///
/// Layout of the raw vector: `[delta_x, delta_y, ndc_z, head_yaw,
/// head_pitch, skin_r, skin_g, skin_b]`, the last three only with
/// [`PoseOutputs::Eight`]. Deltas are in frame pixels relative to the
/// detection.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoseEstimate {
    pub delta_x: f32,
    pub delta_y: f32,
    pub ndc_z: f32,
    pub head_yaw: f32,
    pub head_pitch: f32,
    pub skin_color: Option<[f32; 3]>,
}

impl PoseEstimate {
    pub fn from_outputs(values: &[f32], outputs: PoseOutputs) -> Result<Self, TrackerError> {
        if values.len() != outputs.count() {
            return Err(TrackerError::shape_mismatch(
                "pose output",
                &[1, outputs.count()],
                &[1, values.len()],
            ));
        }
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(TrackerError::inference(
                "pose output",
                format!("non-finite value {} at index {i}", values[i]),
            ));
        }
        let skin_color = outputs
            .has_skin_color()
            .then(|| [values[5], values[6], values[7]]);
        Ok(Self {
            delta_x: values[0],
            delta_y: values[1],
            ndc_z: values[2],
            head_yaw: values[3],
            head_pitch: values[4],
            skin_color,
        })
    }
}
