use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::capture::infrastructure::image_loader::load_frame;
use crate::evaluation::domain::annotation_source::AnnotationSource;
use crate::evaluation::domain::ground_truth::{AnnotatedSample, GroundTruth};
use crate::geometry::domain::coordinates::Ndc;
use crate::geometry::domain::projection::CameraPoint;
use crate::pose::domain::face_result::HeadDirection;
use crate::shared::channels::Channels;

/// One manifest record. Image paths are relative to the manifest file.
#[derive(Debug, Clone, Deserialize)]
struct ManifestEntry {
    image: PathBuf,
    screen: [f64; 2],
    ndc: [f64; 3],
    head_pos: [f64; 3],
    head_dir: [f64; 2],
    #[serde(default)]
    skin_color: Option<[f32; 3]>,
}

impl ManifestEntry {
    fn truth(&self) -> GroundTruth {
        GroundTruth {
            screen_x: self.screen[0],
            screen_y: self.screen[1],
            ndc: Ndc {
                x: self.ndc[0],
                y: self.ndc[1],
                z: self.ndc[2],
            },
            head_pos: CameraPoint {
                x: self.head_pos[0],
                y: self.head_pos[1],
                z: self.head_pos[2],
            },
            head_dir: HeadDirection {
                yaw: self.head_dir[0],
                pitch: self.head_dir[1],
            },
            skin_color: self.skin_color,
        }
    }
}

/// Reads annotated images from a JSON manifest:
///
/// ```json
/// [{"image": "0001.png", "screen": [312.5, 240.0], "ndc": [-0.02, 0.0, 0.95],
///   "head_pos": [-0.1, 0.0, -2.5], "head_dir": [0.1, -0.05],
///   "skin_color": [0.8, 0.6, 0.5]}]
/// ```
pub struct JsonAnnotationSource {
    base_dir: PathBuf,
    entries: Vec<ManifestEntry>,
    position: usize,
    width: u32,
    height: u32,
    channels: Channels,
}

impl JsonAnnotationSource {
    pub fn open(
        manifest: &Path,
        width: u32,
        height: u32,
        channels: Channels,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let text = std::fs::read_to_string(manifest)
            .map_err(|e| format!("Failed to read manifest {}: {e}", manifest.display()))?;
        let entries: Vec<ManifestEntry> = serde_json::from_str(&text)
            .map_err(|e| format!("Failed to parse manifest {}: {e}", manifest.display()))?;
        let base_dir = manifest
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        log::info!(
            "Loaded {} annotated sample(s) from {}",
            entries.len(),
            manifest.display()
        );
        Ok(Self {
            base_dir,
            entries,
            position: 0,
            width,
            height,
            channels,
        })
    }
}

impl AnnotationSource for JsonAnnotationSource {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn next_sample(&mut self) -> Option<Result<AnnotatedSample, Box<dyn std::error::Error>>> {
        let entry = self.entries.get(self.position)?;
        let index = self.position;
        self.position += 1;
        let path = self.base_dir.join(&entry.image);
        Some(
            load_frame(&path, self.width, self.height, self.channels, index).map(|frame| {
                AnnotatedSample {
                    frame,
                    truth: entry.truth(),
                }
            }),
        )
    }
}
