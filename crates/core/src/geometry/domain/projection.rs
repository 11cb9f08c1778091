use serde::{Deserialize, Serialize};

use crate::geometry::domain::coordinates::Ndc;
use crate::shared::constants::{
    PROJECTION_MWW, PROJECTION_MWZ, PROJECTION_MXX, PROJECTION_MYY, PROJECTION_MZW,
    PROJECTION_MZZ,
};
use crate::shared::tracker_error::TrackerError;

/// Denominators smaller than this make the back-projection meaningless.
const DEGENERATE_EPSILON: f64 = 1e-9;

/// Camera-relative position of the head.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// The non-trivial entries of the perspective matrix that rendered the
/// training faces:
///
/// ```text
/// | mxx  0    0    0   |
/// | 0    myy  0    0   |
/// | 0    0    mzz  mzw |
/// | 0    0    mwz  mww |
/// ```
///
/// Must match the renderer exactly; these are configuration, never derived.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub mxx: f64,
    pub myy: f64,
    pub mzz: f64,
    pub mzw: f64,
    pub mwz: f64,
    pub mww: f64,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            mxx: PROJECTION_MXX,
            myy: PROJECTION_MYY,
            mzz: PROJECTION_MZZ,
            mzw: PROJECTION_MZW,
            mwz: PROJECTION_MWZ,
            mww: PROJECTION_MWW,
        }
    }
}

impl Projection {
    /// Back-projects an NDC position to camera space.
    ///
    /// Fails with [`TrackerError::DegenerateProjection`] when
    /// `mwz * ndc_z - mzz` vanishes or the result is not finite.
    pub fn ndc_to_camera(&self, ndc: Ndc) -> Result<CameraPoint, TrackerError> {
        let denominator = self.mwz * ndc.z - self.mzz;
        let degenerate = || TrackerError::DegenerateProjection {
            ndc_z: ndc.z,
            denominator,
        };
        if !denominator.is_finite() || denominator.abs() < DEGENERATE_EPSILON {
            return Err(degenerate());
        }

        let z = (self.mzw - self.mww * ndc.z) / denominator;
        let w = self.mwz * z + self.mww;
        let point = CameraPoint {
            x: w * ndc.x / self.mxx,
            y: w * ndc.y / self.myy,
            z,
        };
        if point.x.is_finite() && point.y.is_finite() && point.z.is_finite() {
            Ok(point)
        } else {
            Err(degenerate())
        }
    }

    /// Forward rendering transform. `None` when the point sits on the
    /// camera plane (`w == 0`).
    pub fn project(&self, point: CameraPoint) -> Option<Ndc> {
        let w = self.mwz * point.z + self.mww;
        if w.abs() < DEGENERATE_EPSILON {
            return None;
        }
        Some(Ndc {
            x: self.mxx * point.x / w,
            y: self.myy * point.y / w,
            z: (self.mzz * point.z + self.mzw) / w,
        })
    }

    pub fn is_finite(&self) -> bool {
        [self.mxx, self.myy, self.mzz, self.mzw, self.mwz, self.mww]
            .iter()
            .all(|v| v.is_finite())
    }
}
