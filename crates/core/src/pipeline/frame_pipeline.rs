use std::time::Instant;

use crate::cutout::domain::cutout::{Cutout, CutoutExtractor};
use crate::detection::domain::detection::Detection;
use crate::detection::domain::heat_map::HeatMap;
use crate::detection::domain::localizer::Localizer;
use crate::detection::domain::scan_stage::{ScanSettings, ScanStage};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pose::domain::face_result::FaceResult;
use crate::pose::domain::pose_estimate::PoseEstimate;
use crate::pose::domain::pose_stage::PoseStage;
use crate::pose::domain::refiner::Refiner;
use crate::shared::frame::Frame;
use crate::shared::tracker_config::TrackerConfig;
use crate::shared::tracker_error::TrackerError;

/// Everything one pipeline pass derived from a single frame.
///
/// The cutout, pose and face are present exactly when the detection is.
#[derive(Clone, Debug)]
pub struct FrameOutcome {
    pub frame: Frame,
    pub heat_map: HeatMap,
    pub detection: Option<Detection>,
    pub cutout: Option<Cutout>,
    pub pose: Option<PoseEstimate>,
    pub face: Option<FaceResult>,
}

/// Runs scan, cutout, pose and reconstruction for one frame at a time.
///
/// Holds no state between frames apart from the models themselves.
pub struct FramePipeline {
    config: TrackerConfig,
    scan: ScanStage,
    extractor: CutoutExtractor,
    pose: PoseStage,
}

impl FramePipeline {
    pub fn new(
        config: TrackerConfig,
        localizer: Box<dyn Localizer>,
        refiner: Box<dyn Refiner>,
    ) -> Result<Self, TrackerError> {
        config
            .validate()
            .map_err(|e| TrackerError::InvalidConfig(e.to_string()))?;

        let settings = ScanSettings {
            frame_width: config.frame_width,
            frame_height: config.frame_height,
            channels: config.channels.count(),
            factor: config.factor,
            threshold: config.threshold,
            refinement: config.refinement,
        };
        let extractor = CutoutExtractor::new(config.cutout_size)?;
        let pose = PoseStage::new(
            refiner,
            config.cutout_size,
            config.channels.count(),
            config.pose_outputs,
        );
        Ok(Self {
            scan: ScanStage::new(localizer, settings),
            extractor,
            pose,
            config,
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Processes one frame. An absent face is a normal outcome; errors only
    /// describe why this frame could not be processed.
    pub fn process(
        &mut self,
        frame: Frame,
        logger: &mut dyn PipelineLogger,
    ) -> Result<FrameOutcome, TrackerError> {
        self.check_frame(&frame)?;

        let t0 = Instant::now();
        let scanned = self.scan.scan(frame.to_tensor())?;
        logger.timing("scan", elapsed_ms(t0));
        if let Some(peak) = scanned.heat_map.peak() {
            logger.metric("heat_peak", peak.value as f64);
        }

        let Some(detection) = scanned.detection else {
            logger.metric("found", 0.0);
            log::debug!("Frame {}: no face above threshold", frame.index());
            return Ok(FrameOutcome {
                frame,
                heat_map: scanned.heat_map,
                detection: None,
                cutout: None,
                pose: None,
                face: None,
            });
        };

        let t0 = Instant::now();
        let cutout = self
            .extractor
            .extract(&frame, detection.frame_x, detection.frame_y);
        logger.timing("cutout", elapsed_ms(t0));

        let t0 = Instant::now();
        let pose = self.pose.estimate(&cutout)?;
        logger.timing("pose", elapsed_ms(t0));

        let face = FaceResult::reconstruct(
            &detection,
            &pose,
            self.config.frame_width,
            self.config.frame_height,
            &self.config.projection,
        );
        logger.metric("found", 1.0);
        log::debug!(
            "Frame {}: face at ({:.1}, {:.1}), confidence {:.3}",
            frame.index(),
            face.screen_x,
            face.screen_y,
            detection.confidence
        );

        Ok(FrameOutcome {
            frame,
            heat_map: scanned.heat_map,
            detection: Some(detection),
            cutout: Some(cutout),
            pose: Some(pose),
            face: Some(face),
        })
    }

    fn check_frame(&self, frame: &Frame) -> Result<(), TrackerError> {
        let expected = [
            self.config.frame_height as usize,
            self.config.frame_width as usize,
            self.config.channels.count(),
        ];
        let actual = [
            frame.height() as usize,
            frame.width() as usize,
            frame.channels() as usize,
        ];
        if expected != actual {
            return Err(TrackerError::shape_mismatch("frame", &expected, &actual));
        }
        if !frame.is_well_formed() {
            return Err(TrackerError::shape_mismatch(
                "frame",
                &[frame.expected_len()],
                &[frame.data().len()],
            ));
        }
        Ok(())
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
