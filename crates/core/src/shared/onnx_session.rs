//! ONNX Runtime session helpers shared by the scan and pose adapters.
use std::path::Path;

use ndarray::{ArrayD, Ix4};

use crate::shared::tracker_error::TrackerError;

/// Return the preferred ONNX execution providers for the current platform.
///
/// Falls back to CPU if the platform-specific provider is unavailable.
pub fn preferred_execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

/// Load a model with the platform's preferred execution providers.
pub fn load_session(model_path: &Path) -> Result<ort::session::Session, Box<dyn std::error::Error>> {
    if !model_path.exists() {
        return Err(format!("Model file not found: {}", model_path.display()).into());
    }
    let session = ort::session::Session::builder()?
        .with_execution_providers(preferred_execution_providers())?
        .commit_from_file(model_path)?;
    Ok(session)
}

/// Runs `session` on a single float tensor and copies out its first output.
pub fn run_single(
    session: &mut ort::session::Session,
    stage: &'static str,
    input: ndarray::Array4<f32>,
) -> Result<ArrayD<f32>, TrackerError> {
    let input_value =
        ort::value::Tensor::from_array(input).map_err(|e| TrackerError::inference(stage, e))?;
    let outputs = session
        .run(ort::inputs![input_value])
        .map_err(|e| TrackerError::inference(stage, e))?;
    if outputs.len() == 0 {
        return Err(TrackerError::inference(stage, "model produced no outputs"));
    }
    let output = outputs[0]
        .try_extract_array::<f32>()
        .map_err(|e| TrackerError::inference(stage, e))?;
    Ok(output.to_owned())
}

/// Interprets a model output as a 4-D tensor, inserting a trailing channel
/// axis for `[N, H, W]` outputs.
pub fn into_nhwc(stage: &'static str, output: ArrayD<f32>) -> Result<ndarray::Array4<f32>, TrackerError> {
    let actual = output.shape().to_vec();
    let output = match output.ndim() {
        3 => output.insert_axis(ndarray::Axis(3)),
        4 => output,
        _ => return Err(TrackerError::shape_mismatch(stage, &[1, 0, 0, 1], &actual)),
    };
    output
        .into_dimensionality::<Ix4>()
        .map_err(|_| TrackerError::shape_mismatch(stage, &[1, 0, 0, 1], &actual))
}
