/// Pose regressor backed by an ONNX Runtime session.
use std::path::Path;

use ndarray::Array4;

use crate::pose::domain::refiner::Refiner;
use crate::shared::onnx_session::{load_session, run_single};
use crate::shared::tracker_error::TrackerError;

const STAGE: &str = "pose";

pub struct OnnxRefiner {
    session: ort::session::Session,
}

impl OnnxRefiner {
    /// Load the pose network from `model_path`.
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = load_session(model_path)?;
        log::info!("Loaded pose model from {}", model_path.display());
        Ok(Self { session })
    }
}

impl Refiner for OnnxRefiner {
    /// The model emits `[1, K]`; the batch axis is dropped.
    fn infer(&mut self, input: Array4<f32>) -> Result<Vec<f32>, TrackerError> {
        let output = run_single(&mut self.session, STAGE, input)?;
        let shape = output.shape().to_vec();
        if shape.is_empty() || shape[0] != 1 {
            return Err(TrackerError::shape_mismatch(STAGE, &[1, 0], &shape));
        }
        Ok(output.iter().copied().collect())
    }
}
