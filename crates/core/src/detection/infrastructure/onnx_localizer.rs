/// Coarse face localizer backed by an ONNX Runtime session.
use std::path::Path;

use ndarray::Array4;

use crate::detection::domain::localizer::Localizer;
use crate::shared::onnx_session::{into_nhwc, load_session, run_single};
use crate::shared::tracker_error::TrackerError;

const STAGE: &str = "scan";

pub struct OnnxLocalizer {
    session: ort::session::Session,
}

impl OnnxLocalizer {
    /// Load the localization network from `model_path`.
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = load_session(model_path)?;
        log::info!("Loaded scan model from {}", model_path.display());
        Ok(Self { session })
    }
}

impl Localizer for OnnxLocalizer {
    fn infer(&mut self, input: Array4<f32>) -> Result<Array4<f32>, TrackerError> {
        let output = run_single(&mut self.session, STAGE, input)?;
        into_nhwc(STAGE, output)
    }
}
