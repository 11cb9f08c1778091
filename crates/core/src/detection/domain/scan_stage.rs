use ndarray::Array4;

use crate::detection::domain::detection::{locate, Detection};
use crate::detection::domain::heat_map::HeatMap;
use crate::detection::domain::localizer::Localizer;
use crate::detection::domain::subcell_refinement::Refinement;
use crate::shared::tracker_error::TrackerError;

/// Fixed geometry and decision parameters of the scan stage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScanSettings {
    pub frame_width: u32,
    pub frame_height: u32,
    pub channels: usize,
    pub factor: u32,
    pub threshold: f32,
    pub refinement: Refinement,
}

impl ScanSettings {
    pub fn grid_width(&self) -> usize {
        (self.frame_width / self.factor) as usize
    }

    pub fn grid_height(&self) -> usize {
        (self.frame_height / self.factor) as usize
    }

    pub fn input_shape(&self) -> [usize; 4] {
        [
            1,
            self.frame_height as usize,
            self.frame_width as usize,
            self.channels,
        ]
    }

    pub fn output_shape(&self) -> [usize; 4] {
        [1, self.grid_height(), self.grid_width(), 1]
    }
}

/// Result of scanning one frame. The heat map is kept even when no face was
/// found so it can still be displayed.
#[derive(Clone, Debug)]
pub struct ScanOutput {
    pub heat_map: HeatMap,
    pub detection: Option<Detection>,
}

/// Localization stage: runs the coarse network and turns its heat map into a
/// sub-cell refined detection.
pub struct ScanStage {
    localizer: Box<dyn Localizer>,
    settings: ScanSettings,
}

impl ScanStage {
    pub fn new(localizer: Box<dyn Localizer>, settings: ScanSettings) -> Self {
        Self {
            localizer,
            settings,
        }
    }

    /// Scans a normalized `[1, H, W, C]` frame tensor.
    pub fn scan(&mut self, input: Array4<f32>) -> Result<ScanOutput, TrackerError> {
        let expected = self.settings.input_shape();
        if input.shape() != expected {
            return Err(TrackerError::shape_mismatch(
                "scan input",
                &expected,
                input.shape(),
            ));
        }

        let output = self.localizer.infer(input)?;

        let expected = self.settings.output_shape();
        if output.shape() != expected {
            return Err(TrackerError::shape_mismatch(
                "scan output",
                &expected,
                output.shape(),
            ));
        }

        let heat_map = HeatMap::from_tensor(output.view())?;
        let detection = locate(
            &heat_map,
            self.settings.factor,
            self.settings.threshold,
            self.settings.refinement,
        );
        Ok(ScanOutput {
            heat_map,
            detection,
        })
    }
}
