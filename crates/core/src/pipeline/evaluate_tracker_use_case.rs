use std::fmt;

use crate::evaluation::domain::annotation_source::AnnotationSource;
use crate::evaluation::domain::error_statistics::{ErrorStatistics, ParameterStats};
use crate::evaluation::domain::ground_truth::GroundTruth;
use crate::pipeline::frame_pipeline::FramePipeline;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pose::domain::face_result::FaceResult;

const POSE_PARAMETERS: &[&str] = &[
    "screen.x",
    "screen.y",
    "ndc.x",
    "ndc.y",
    "ndc.z",
    "pos.x",
    "pos.y",
    "pos.z",
    "head.yaw",
    "head.pitch",
];

const SKIN_PARAMETERS: &[&str] = &["skin.r", "skin.g", "skin.b"];

/// Measurement errors of the tracker over an annotated set.
#[derive(Clone, Debug)]
pub struct EvaluationReport {
    pub samples: usize,
    pub found: usize,
    pub not_found: usize,
    /// Samples that failed to load or to run through the pipeline.
    pub skipped: usize,
    pub frame_width: u32,
    pub frame_height: u32,
    pub parameters: Vec<ParameterStats>,
}

impl EvaluationReport {
    pub fn parameter(&self, name: &str) -> Option<&ParameterStats> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} samples: {} found, {} not found, {} skipped",
            self.samples, self.found, self.not_found, self.skipped
        )?;
        writeln!(
            f,
            "measurement errors (truth - estimate) @ {}x{}:",
            self.frame_width, self.frame_height
        )?;
        for p in &self.parameters {
            writeln!(f, "    {p}")?;
        }
        Ok(())
    }
}

/// Runs the synchronous frame pipeline over annotated samples and compares
/// every found face against its ground truth.
pub struct EvaluateTrackerUseCase {
    pipeline: FramePipeline,
    annotations: Box<dyn AnnotationSource>,
    logger: Box<dyn PipelineLogger>,
}

impl EvaluateTrackerUseCase {
    pub fn new(
        pipeline: FramePipeline,
        annotations: Box<dyn AnnotationSource>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            pipeline,
            annotations,
            logger,
        }
    }

    pub fn execute(&mut self) -> Result<EvaluationReport, Box<dyn std::error::Error>> {
        let config = self.pipeline.config().clone();
        let mut names: Vec<&'static str> = POSE_PARAMETERS.to_vec();
        if config.pose_outputs.has_skin_color() {
            names.extend_from_slice(SKIN_PARAMETERS);
        }
        let mut stats = ErrorStatistics::new(&names);

        let total = self.annotations.len();
        if total == 0 {
            return Err("No annotated samples to evaluate".into());
        }
        let mut found = 0;
        let mut not_found = 0;
        let mut skipped = 0;
        let mut processed = 0;

        while let Some(sample) = self.annotations.next_sample() {
            processed += 1;
            let sample = match sample {
                Ok(sample) => sample,
                Err(e) => {
                    log::warn!("Skipping sample {processed}: {e}");
                    skipped += 1;
                    continue;
                }
            };

            let truth = sample.truth;
            match self.pipeline.process(sample.frame, self.logger.as_mut()) {
                Ok(outcome) => match outcome.face {
                    Some(face) => {
                        record_errors(&mut stats, &truth, &face);
                        found += 1;
                    }
                    None => not_found += 1,
                },
                Err(e) => {
                    log::warn!("Skipping sample {processed}: {e}");
                    skipped += 1;
                }
            }
            self.logger.progress(processed, Some(total));
        }

        self.logger.summary();

        Ok(EvaluationReport {
            samples: processed,
            found,
            not_found,
            skipped,
            frame_width: config.frame_width,
            frame_height: config.frame_height,
            parameters: stats.parameters(),
        })
    }
}

fn record_errors(stats: &mut ErrorStatistics, truth: &GroundTruth, face: &FaceResult) {
    stats.record("screen.x", truth.screen_x - face.screen_x);
    stats.record("screen.y", truth.screen_y - face.screen_y);
    stats.record("ndc.x", truth.ndc.x - face.ndc.x);
    stats.record("ndc.y", truth.ndc.y - face.ndc.y);
    stats.record("ndc.z", truth.ndc.z - face.ndc.z);
    if let Some(pos) = face.head_pos {
        stats.record("pos.x", truth.head_pos.x - pos.x);
        stats.record("pos.y", truth.head_pos.y - pos.y);
        stats.record("pos.z", truth.head_pos.z - pos.z);
    }
    stats.record("head.yaw", truth.head_dir.yaw - face.head_dir.yaw);
    stats.record("head.pitch", truth.head_dir.pitch - face.head_dir.pitch);
    if let (Some(t), Some(e)) = (truth.skin_color, face.skin_color) {
        for (name, i) in SKIN_PARAMETERS.iter().zip(0..3) {
            stats.record(name, (t[i] - e[i]) as f64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::localizer::Localizer;
    use crate::evaluation::domain::ground_truth::AnnotatedSample;
    use crate::geometry::domain::coordinates::Ndc;
    use crate::geometry::domain::projection::{CameraPoint, Projection};
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::pose::domain::face_result::HeadDirection;
    use crate::pose::domain::pose_estimate::PoseOutputs;
    use crate::pose::domain::refiner::Refiner;
    use crate::shared::frame::Frame;
    use crate::shared::tracker_config::TrackerConfig;
    use crate::shared::tracker_error::TrackerError;
    use approx::assert_relative_eq;
    use ndarray::Array4;
    use std::collections::VecDeque;

    /// Hot cell at grid (4, 3) when the frame is bright, nothing otherwise.
    struct BrightnessLocalizer;

    impl Localizer for BrightnessLocalizer {
        fn infer(&mut self, input: Array4<f32>) -> Result<Array4<f32>, TrackerError> {
            let mut out = Array4::zeros((1, 6, 8, 1));
            if input[[0, 0, 0, 0]] > 0.5 {
                out[[0, 3, 4, 0]] = 0.9;
            }
            Ok(out)
        }
    }

    struct FixedRefiner(Vec<f32>);

    impl Refiner for FixedRefiner {
        fn infer(&mut self, _input: Array4<f32>) -> Result<Vec<f32>, TrackerError> {
            Ok(self.0.clone())
        }
    }

    struct VecAnnotations(VecDeque<Result<AnnotatedSample, String>>, usize);

    impl VecAnnotations {
        fn new(samples: Vec<Result<AnnotatedSample, String>>) -> Self {
            let len = samples.len();
            Self(samples.into(), len)
        }
    }

    impl AnnotationSource for VecAnnotations {
        fn len(&self) -> usize {
            self.1
        }

        fn next_sample(&mut self) -> Option<Result<AnnotatedSample, Box<dyn std::error::Error>>> {
            self.0.pop_front().map(|r| r.map_err(|e| e.into()))
        }
    }

    fn config(pose_outputs: PoseOutputs) -> TrackerConfig {
        TrackerConfig {
            frame_width: 64,
            frame_height: 48,
            cutout_size: 9,
            pose_outputs,
            ..TrackerConfig::default()
        }
    }

    fn truth(screen_x: f64) -> GroundTruth {
        GroundTruth {
            screen_x,
            screen_y: 28.0,
            ndc: Ndc {
                x: 0.0,
                y: 0.0,
                z: 0.9,
            },
            head_pos: CameraPoint {
                x: 0.0,
                y: 0.0,
                z: 0.0,
            },
            head_dir: HeadDirection {
                yaw: 0.5,
                pitch: 0.0,
            },
            skin_color: Some([1.0, 1.0, 1.0]),
        }
    }

    fn sample(index: usize, bright: bool, screen_x: f64) -> AnnotatedSample {
        let value = if bright { 255 } else { 0 };
        AnnotatedSample {
            frame: Frame::new(vec![value; 64 * 48 * 3], 64, 48, 3, index),
            truth: truth(screen_x),
        }
    }

    fn use_case(
        pose_outputs: PoseOutputs,
        refiner_out: Vec<f32>,
        samples: Vec<Result<AnnotatedSample, String>>,
    ) -> EvaluateTrackerUseCase {
        use_case_with(config(pose_outputs), refiner_out, samples)
    }

    fn use_case_with(
        config: TrackerConfig,
        refiner_out: Vec<f32>,
        samples: Vec<Result<AnnotatedSample, String>>,
    ) -> EvaluateTrackerUseCase {
        let pipeline = FramePipeline::new(
            config,
            Box::new(BrightnessLocalizer),
            Box::new(FixedRefiner(refiner_out)),
        )
        .unwrap();
        EvaluateTrackerUseCase::new(
            pipeline,
            Box::new(VecAnnotations::new(samples)),
            Box::new(NullPipelineLogger),
        )
    }

    #[test]
    fn test_counts_and_screen_errors() {
        // Detection lands on (36, 28); the refiner adds +1 in x.
        let mut uc = use_case(
            PoseOutputs::Eight,
            vec![1.0, 0.0, 0.9, 0.25, 0.0, 0.5, 0.5, 0.5],
            vec![
                Ok(sample(0, true, 38.0)),
                Ok(sample(1, true, 40.0)),
                Ok(sample(2, false, 0.0)),
                Err("unreadable".to_string()),
            ],
        );
        let report = uc.execute().unwrap();
        assert_eq!(report.samples, 4);
        assert_eq!(report.found, 2);
        assert_eq!(report.not_found, 1);
        assert_eq!(report.skipped, 1);

        let sx = report.parameter("screen.x").unwrap();
        assert_eq!(sx.count, 2);
        assert_relative_eq!(sx.mean, 2.0, epsilon = 1e-9);
        assert_relative_eq!(sx.stddev, 2.0f64.sqrt(), epsilon = 1e-9);

        let sy = report.parameter("screen.y").unwrap();
        assert_relative_eq!(sy.mean, 0.0, epsilon = 1e-9);
        assert_eq!(sy.stddev, 0.0);

        assert_relative_eq!(report.parameter("head.yaw").unwrap().mean, 0.25, epsilon = 1e-6);
        assert_relative_eq!(report.parameter("skin.g").unwrap().mean, 0.5, epsilon = 1e-6);
        assert_eq!(report.parameters.len(), 13);
    }

    #[test]
    fn test_five_outputs_has_no_skin_parameters() {
        let mut uc = use_case(
            PoseOutputs::Five,
            vec![0.0, 0.0, 0.9, 0.0, 0.0],
            vec![Ok(sample(0, true, 36.0))],
        );
        let report = uc.execute().unwrap();
        assert_eq!(report.parameters.len(), 10);
        assert!(report.parameter("skin.r").is_none());
    }

    #[test]
    fn test_degenerate_projection_skips_position_errors() {
        // mwz * 2.0 - mzz == 0, exactly representable in f32.
        let config = TrackerConfig {
            projection: Projection {
                mzz: -1.0,
                mwz: -0.5,
                ..Projection::default()
            },
            ..config(PoseOutputs::Five)
        };
        let mut uc = use_case_with(
            config,
            vec![0.0, 0.0, 2.0, 0.0, 0.0],
            vec![Ok(sample(0, true, 36.0))],
        );
        let report = uc.execute().unwrap();
        assert_eq!(report.found, 1);
        assert_eq!(report.parameter("pos.z").unwrap().count, 0);
        assert_eq!(report.parameter("screen.x").unwrap().count, 1);
    }

    #[test]
    fn test_empty_annotations_fail() {
        let mut uc = use_case(PoseOutputs::Five, vec![0.0; 5], vec![]);
        assert!(uc.execute().is_err());
    }

    #[test]
    fn test_report_display() {
        let mut uc = use_case(
            PoseOutputs::Five,
            vec![0.0, 0.0, 0.9, 0.0, 0.0],
            vec![Ok(sample(0, true, 36.0))],
        );
        let text = uc.execute().unwrap().to_string();
        assert!(text.contains("1 samples: 1 found, 0 not found, 0 skipped"));
        assert!(text.contains("@ 64x48"));
        assert!(text.contains("head.pitch:"));
    }
}
