use crate::cutout::domain::cutout::Cutout;
use crate::pose::domain::pose_estimate::{PoseEstimate, PoseOutputs};
use crate::pose::domain::refiner::Refiner;
use crate::shared::tracker_error::TrackerError;

/// Refinement stage: regresses offset, depth and orientation from a cutout.
pub struct PoseStage {
    refiner: Box<dyn Refiner>,
    cutout_size: usize,
    channels: usize,
    outputs: PoseOutputs,
}

impl PoseStage {
    pub fn new(
        refiner: Box<dyn Refiner>,
        cutout_size: usize,
        channels: usize,
        outputs: PoseOutputs,
    ) -> Self {
        Self {
            refiner,
            cutout_size,
            channels,
            outputs,
        }
    }

    pub fn input_shape(&self) -> [usize; 4] {
        [1, self.cutout_size, self.cutout_size, self.channels]
    }

    pub fn estimate(&mut self, cutout: &Cutout) -> Result<PoseEstimate, TrackerError> {
        let input = cutout.to_tensor();
        let expected = self.input_shape();
        if input.shape() != expected {
            return Err(TrackerError::shape_mismatch(
                "pose input",
                &expected,
                input.shape(),
            ));
        }
        let values = self.refiner.infer(input)?;
        PoseEstimate::from_outputs(&values, self.outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cutout::domain::cutout::CutoutExtractor;
    use crate::shared::frame::Frame;
    use ndarray::Array4;

    struct FixedRefiner(Vec<f32>);

    impl Refiner for FixedRefiner {
        fn infer(&mut self, input: Array4<f32>) -> Result<Vec<f32>, TrackerError> {
            assert_eq!(input.shape()[0], 1);
            Ok(self.0.clone())
        }
    }

    fn cutout(size: usize, channels: u8) -> Cutout {
        let frame = Frame::new(vec![128; 16 * 16 * channels as usize], 16, 16, channels, 0);
        CutoutExtractor::new(size).unwrap().extract(&frame, 8, 8)
    }

    #[test]
    fn test_estimate_decodes_outputs() {
        let refiner = FixedRefiner(vec![1.0, 2.0, 0.9, 0.1, 0.2]);
        let mut stage = PoseStage::new(Box::new(refiner), 5, 3, PoseOutputs::Five);
        let pose = stage.estimate(&cutout(5, 3)).unwrap();
        assert_eq!(pose.delta_x, 1.0);
        assert_eq!(pose.delta_y, 2.0);
        assert!(pose.skin_color.is_none());
    }

    #[test]
    fn test_estimate_rejects_wrong_channel_depth() {
        let refiner = FixedRefiner(vec![0.0; 8]);
        let mut stage = PoseStage::new(Box::new(refiner), 5, 4, PoseOutputs::Eight);
        let err = stage.estimate(&cutout(5, 3)).unwrap_err();
        assert_eq!(
            err,
            TrackerError::ShapeMismatch {
                stage: "pose input",
                expected: vec![1, 5, 5, 4],
                actual: vec![1, 5, 5, 3],
            }
        );
    }

    #[test]
    fn test_estimate_rejects_short_output() {
        let refiner = FixedRefiner(vec![0.0; 5]);
        let mut stage = PoseStage::new(Box::new(refiner), 5, 3, PoseOutputs::Eight);
        assert!(matches!(
            stage.estimate(&cutout(5, 3)),
            Err(TrackerError::ShapeMismatch {
                stage: "pose output",
                ..
            })
        ));
    }
}
