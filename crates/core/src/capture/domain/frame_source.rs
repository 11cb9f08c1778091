use crate::shared::frame::Frame;
use crate::shared::tracker_error::TrackerError;

/// Supplies frames of a fixed size and channel depth to the tracker.
///
/// Implementations handle decoding, device access and format conversion so
/// the pipeline only sees [`Frame`]s with values in `[0, 255]`.
pub trait FrameSource: Send {
    /// Blocks until the next frame is available.
    ///
    /// `Ok(None)` means the source is exhausted and will never produce
    /// another frame. Errors are transient: the caller may call again.
    fn next_frame(&mut self) -> Result<Option<Frame>, TrackerError>;
}
