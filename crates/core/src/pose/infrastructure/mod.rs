pub mod onnx_refiner;
