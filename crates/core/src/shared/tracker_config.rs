use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::domain::subcell_refinement::Refinement;
use crate::geometry::domain::projection::Projection;
use crate::pose::domain::pose_estimate::PoseOutputs;
use crate::shared::channels::Channels;
use crate::shared::constants::{
    DEFAULT_CUTOUT_SIZE, DEFAULT_FACTOR, DEFAULT_FRAME_HEIGHT, DEFAULT_FRAME_WIDTH,
    DEFAULT_THRESHOLD,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Startup parameters of the tracker. Read-only once the pipeline is built.
///
/// Fields missing from a config file take their default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub frame_width: u32,
    pub frame_height: u32,
    /// Heat-map downsampling ratio, a power of two.
    pub factor: u32,
    /// Heat-map peaks must strictly exceed this to count as a face.
    pub threshold: f32,
    /// Odd side length of the pose cutout.
    pub cutout_size: usize,
    pub channels: Channels,
    pub refinement: Refinement,
    pub pose_outputs: PoseOutputs,
    pub projection: Projection,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            frame_width: DEFAULT_FRAME_WIDTH,
            frame_height: DEFAULT_FRAME_HEIGHT,
            factor: DEFAULT_FACTOR,
            threshold: DEFAULT_THRESHOLD,
            cutout_size: DEFAULT_CUTOUT_SIZE,
            channels: Channels::Rgb,
            refinement: Refinement::default(),
            pose_outputs: PoseOutputs::default(),
            projection: Projection::default(),
        }
    }
}

impl TrackerConfig {
    /// Reads a JSON config file and validates it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.factor == 0 || !self.factor.is_power_of_two() {
            return Err(ConfigError::Invalid(format!(
                "factor must be a power of two, got {}",
                self.factor
            )));
        }
        if self.cutout_size == 0 || self.cutout_size % 2 == 0 {
            return Err(ConfigError::Invalid(format!(
                "cutout_size must be odd, got {}",
                self.cutout_size
            )));
        }
        if !(0.0..1.0).contains(&self.threshold) {
            return Err(ConfigError::Invalid(format!(
                "threshold must be in [0, 1), got {}",
                self.threshold
            )));
        }
        if self.grid_width() == 0 || self.grid_height() == 0 {
            return Err(ConfigError::Invalid(format!(
                "frame {}x{} is smaller than one {}-pixel grid cell",
                self.frame_width, self.frame_height, self.factor
            )));
        }
        if !self.projection.is_finite() {
            return Err(ConfigError::Invalid(
                "projection constants must be finite".to_string(),
            ));
        }
        Ok(())
    }

    pub fn grid_width(&self) -> u32 {
        self.frame_width / self.factor.max(1)
    }

    pub fn grid_height(&self) -> u32 {
        self.frame_height / self.factor.max(1)
    }

    pub fn cutout_half(&self) -> usize {
        self.cutout_size.saturating_sub(1) / 2
    }
}
