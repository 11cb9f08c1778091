pub mod onnx_localizer;
