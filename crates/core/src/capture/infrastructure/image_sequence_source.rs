use std::path::{Path, PathBuf};

use crate::capture::domain::frame_source::FrameSource;
use crate::capture::infrastructure::image_loader::load_frame;
use crate::shared::channels::Channels;
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;
use crate::shared::tracker_error::TrackerError;

/// Plays back still images as a finite frame stream.
///
/// An unreadable image is reported once and skipped; the next call moves on
/// to the following file.
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    position: usize,
    width: u32,
    height: u32,
    channels: Channels,
}

impl ImageSequenceSource {
    pub fn new(paths: Vec<PathBuf>, width: u32, height: u32, channels: Channels) -> Self {
        Self {
            paths,
            position: 0,
            width,
            height,
            channels,
        }
    }

    /// A single image file, or every image in a directory sorted by name.
    pub fn from_path(
        path: &Path,
        width: u32,
        height: u32,
        channels: Channels,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let paths = if path.is_dir() {
            let mut paths: Vec<PathBuf> = std::fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_image_file(p))
                .collect();
            paths.sort();
            if paths.is_empty() {
                return Err(format!("No images found in {}", path.display()).into());
            }
            paths
        } else if path.is_file() {
            vec![path.to_path_buf()]
        } else {
            return Err(format!("Input not found: {}", path.display()).into());
        };
        log::info!("Image sequence: {} file(s) from {}", paths.len(), path.display());
        Ok(Self::new(paths, width, height, channels))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, TrackerError> {
        let Some(path) = self.paths.get(self.position) else {
            return Ok(None);
        };
        let index = self.position;
        self.position += 1;
        load_frame(path, self.width, self.height, self.channels, index)
            .map(Some)
            .map_err(TrackerError::source_unavailable)
    }
}
