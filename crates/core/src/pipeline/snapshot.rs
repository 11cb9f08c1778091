use std::sync::{Arc, Mutex};

use crate::detection::domain::detection::Detection;
use crate::pipeline::frame_pipeline::FrameOutcome;
use crate::pose::domain::face_result::FaceResult;
use crate::shared::frame::Frame;

/// One published tracker result. Every field comes from the same frame.
#[derive(Clone, Debug)]
pub struct TrackerSnapshot {
    /// Increases by one with every publication.
    pub sequence: u64,
    pub frame_index: usize,
    pub input: Frame,
    /// Single-channel heat map scaled to `[0, 255]`.
    pub heat_map_image: Frame,
    pub cutout_image: Option<Frame>,
    pub detection: Option<Detection>,
    pub face: Option<FaceResult>,
}

impl TrackerSnapshot {
    pub fn from_outcome(sequence: u64, outcome: FrameOutcome) -> Self {
        let frame_index = outcome.frame.index();
        Self {
            sequence,
            frame_index,
            heat_map_image: outcome.heat_map.to_image(frame_index),
            cutout_image: outcome.cutout.map(|c| c.to_image(frame_index)),
            detection: outcome.detection,
            face: outcome.face,
            input: outcome.frame,
        }
    }
}

/// Single-writer, many-reader holder of the latest snapshot.
///
/// Publication swaps the whole `Arc`, so a reader either sees the previous
/// snapshot or the new one, never a mix. The lock is held only for the swap.
#[derive(Default)]
pub struct SnapshotSlot {
    current: Mutex<Option<Arc<TrackerSnapshot>>>,
}

impl SnapshotSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, snapshot: TrackerSnapshot) -> Arc<TrackerSnapshot> {
        let snapshot = Arc::new(snapshot);
        let mut guard = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(Arc::clone(&snapshot));
        snapshot
    }

    pub fn latest(&self) -> Option<Arc<TrackerSnapshot>> {
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cutout::domain::cutout::CutoutExtractor;
    use crate::detection::domain::heat_map::HeatMap;
    use ndarray::Array2;

    fn outcome(index: usize, with_cutout: bool) -> FrameOutcome {
        let frame = Frame::new(vec![7; 4 * 4 * 3], 4, 4, 3, index);
        let cutout = with_cutout.then(|| CutoutExtractor::new(3).unwrap().extract(&frame, 1, 1));
        FrameOutcome {
            heat_map: HeatMap::new(Array2::from_elem((2, 2), 0.5)),
            frame,
            detection: None,
            cutout,
            pose: None,
            face: None,
        }
    }

    #[test]
    fn test_images_carry_the_frame_index() {
        let snapshot = TrackerSnapshot::from_outcome(1, outcome(9, true));
        assert_eq!(snapshot.frame_index, 9);
        assert_eq!(snapshot.input.index(), 9);
        assert_eq!(snapshot.heat_map_image.index(), 9);
        assert_eq!(snapshot.cutout_image.as_ref().unwrap().index(), 9);
        assert_eq!(snapshot.heat_map_image.data(), &[128, 128, 128, 128]);
    }

    #[test]
    fn test_no_cutout_image_without_cutout() {
        let snapshot = TrackerSnapshot::from_outcome(1, outcome(0, false));
        assert!(snapshot.cutout_image.is_none());
    }

    #[test]
    fn test_slot_starts_empty() {
        assert!(SnapshotSlot::new().latest().is_none());
    }

    #[test]
    fn test_publish_replaces_whole_snapshot() {
        let slot = SnapshotSlot::new();
        slot.publish(TrackerSnapshot::from_outcome(1, outcome(0, true)));
        let held = slot.latest().unwrap();
        slot.publish(TrackerSnapshot::from_outcome(2, outcome(1, false)));

        // The earlier reader keeps a consistent view of its snapshot.
        assert_eq!(held.sequence, 1);
        assert!(held.cutout_image.is_some());

        let latest = slot.latest().unwrap();
        assert_eq!(latest.sequence, 2);
        assert_eq!(latest.frame_index, 1);
        assert!(latest.cutout_image.is_none());
    }
}
