pub mod face_result;
pub mod pose_estimate;
pub mod pose_stage;
pub mod refiner;
