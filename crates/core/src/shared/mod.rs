pub mod channels;
pub mod constants;
pub mod frame;
pub mod onnx_session;
pub mod tracker_config;
pub mod tracker_error;
