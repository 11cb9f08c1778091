pub mod evaluate_tracker_use_case;
pub mod frame_pipeline;
pub mod infrastructure;
pub mod pipeline_logger;
pub mod snapshot;
