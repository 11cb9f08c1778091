pub mod annotation_source;
pub mod error_statistics;
pub mod ground_truth;
