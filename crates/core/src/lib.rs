pub mod capture;
pub mod cutout;
pub mod detection;
pub mod evaluation;
pub mod geometry;
pub mod pipeline;
pub mod pose;
pub mod shared;
