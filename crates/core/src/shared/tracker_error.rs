use std::fmt::Display;

use thiserror::Error;

/// Failures that can occur during a single tracking pass.
///
/// Every variant is contained within the pass that produced it; the worker
/// loop logs it and moves on to the next frame. A missing face is not an
/// error and is represented as an absent detection instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackerError {
    #[error("{stage} shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        stage: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
    #[error("degenerate projection at ndc_z={ndc_z} (denominator {denominator})")]
    DegenerateProjection { ndc_z: f64, denominator: f64 },
    #[error("frame source unavailable: {0}")]
    FrameSourceUnavailable(String),
    #[error("{stage} inference failed: {message}")]
    Inference {
        stage: &'static str,
        message: String,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl TrackerError {
    pub fn shape_mismatch(stage: &'static str, expected: &[usize], actual: &[usize]) -> Self {
        TrackerError::ShapeMismatch {
            stage,
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    pub fn inference(stage: &'static str, err: impl Display) -> Self {
        TrackerError::Inference {
            stage,
            message: err.to_string(),
        }
    }

    pub fn source_unavailable(err: impl Display) -> Self {
        TrackerError::FrameSourceUnavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_message_names_stage_and_shapes() {
        let err = TrackerError::shape_mismatch("scan", &[1, 480, 640, 3], &[1, 240, 320, 3]);
        let msg = err.to_string();
        assert!(msg.contains("scan"));
        assert!(msg.contains("[1, 480, 640, 3]"));
        assert!(msg.contains("[1, 240, 320, 3]"));
    }

    #[test]
    fn test_inference_wraps_display() {
        let err = TrackerError::inference("pose", "session closed");
        assert_eq!(err.to_string(), "pose inference failed: session closed");
    }

    #[test]
    fn test_source_unavailable_message() {
        let err = TrackerError::source_unavailable("device busy");
        assert_eq!(err.to_string(), "frame source unavailable: device busy");
    }
}
