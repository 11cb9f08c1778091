use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::capture::domain::frame_source::FrameSource;
use crate::shared::frame::Frame;
use crate::shared::tracker_error::TrackerError;

/// Frame source fed by another thread (e.g. a camera callback).
///
/// Only the freshest frame is ever returned: everything queued behind it is
/// discarded, so a slow tracker drops frames instead of falling behind.
/// Dropping every sender exhausts the source.
pub struct LatestFrameSource {
    receiver: Receiver<Frame>,
    timeout: Duration,
}

/// Creates a bounded feed and the source reading from it. Producers should
/// use `try_send` so a full channel drops frames instead of blocking.
pub fn latest_frame_channel(capacity: usize, timeout: Duration) -> (Sender<Frame>, LatestFrameSource) {
    let (sender, receiver) = crossbeam_channel::bounded(capacity.max(1));
    (sender, LatestFrameSource { receiver, timeout })
}

impl FrameSource for LatestFrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, TrackerError> {
        let mut frame = match self.receiver.recv_timeout(self.timeout) {
            Ok(frame) => frame,
            Err(RecvTimeoutError::Timeout) => {
                return Err(TrackerError::source_unavailable(format!(
                    "no frame within {} ms",
                    self.timeout.as_millis()
                )));
            }
            Err(RecvTimeoutError::Disconnected) => return Ok(None),
        };

        let mut dropped = 0usize;
        while let Ok(newer) = self.receiver.try_recv() {
            frame = newer;
            dropped += 1;
        }
        if dropped > 0 {
            log::debug!("Dropped {dropped} stale frame(s) before frame {}", frame.index());
        }
        Ok(Some(frame))
    }
}
