use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};

use crate::capture::domain::frame_source::FrameSource;
use crate::pipeline::frame_pipeline::FramePipeline;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::snapshot::{SnapshotSlot, TrackerSnapshot};
use crate::shared::tracker_error::TrackerError;

const DEFAULT_EVENT_CAPACITY: usize = 64;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Notifications from the worker. Delivery is best effort: when the
/// reader falls behind, new events are dropped rather than stalling the
/// worker.
#[derive(Clone, Debug, PartialEq)]
pub enum TrackerEvent {
    Published {
        sequence: u64,
        frame_index: usize,
        found: bool,
    },
    /// A pass could not run. `frame_index` is `None` when no frame was read.
    FrameSkipped {
        frame_index: Option<usize>,
        error: TrackerError,
    },
    SourceExhausted,
    Stopped,
}

/// Runs the frame pipeline on a dedicated thread.
///
/// Layout: `source → scan → cutout → pose → publish`, strictly sequential
/// per frame and across frames. Consumers read the latest snapshot through
/// the returned [`TrackerHandle`] and never block the worker.
pub struct ThreadedTracker {
    event_capacity: usize,
    retry_delay: Duration,
}

impl ThreadedTracker {
    pub fn new() -> Self {
        Self {
            event_capacity: DEFAULT_EVENT_CAPACITY,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Pause after a failed frame read before asking the source again.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn spawn(
        &self,
        source: Box<dyn FrameSource>,
        pipeline: FramePipeline,
        logger: Box<dyn PipelineLogger>,
    ) -> TrackerHandle {
        let slot = Arc::new(SnapshotSlot::new());
        let stop = Arc::new(AtomicBool::new(false));
        let (event_tx, event_rx) = crossbeam_channel::bounded(self.event_capacity);

        let worker = Worker {
            source,
            pipeline,
            logger,
            slot: Arc::clone(&slot),
            stop: Arc::clone(&stop),
            events: event_tx,
            retry_delay: self.retry_delay,
        };
        let handle = std::thread::spawn(move || worker.run());

        TrackerHandle {
            slot,
            events: event_rx,
            stop,
            worker: Some(handle),
        }
    }
}

impl Default for ThreadedTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Consumer side of a running tracker. Dropping it stops the worker.
pub struct TrackerHandle {
    slot: Arc<SnapshotSlot>,
    events: Receiver<TrackerEvent>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl TrackerHandle {
    /// The most recently published snapshot, if any.
    pub fn latest(&self) -> Option<Arc<TrackerSnapshot>> {
        self.slot.latest()
    }

    pub fn events(&self) -> &Receiver<TrackerEvent> {
        &self.events
    }

    /// True once the worker thread has exited.
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().map_or(true, |w| w.is_finished())
    }

    /// Signals the worker, lets the in-flight pass finish and joins it.
    pub fn stop(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.stop.store(true, Ordering::Relaxed);
        match self.worker.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| "Tracker worker thread panicked".into()),
            None => Ok(()),
        }
    }
}

impl Drop for TrackerHandle {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::error!("{e}");
        }
    }
}

struct Worker {
    source: Box<dyn FrameSource>,
    pipeline: FramePipeline,
    logger: Box<dyn PipelineLogger>,
    slot: Arc<SnapshotSlot>,
    stop: Arc<AtomicBool>,
    events: Sender<TrackerEvent>,
    retry_delay: Duration,
}

impl Worker {
    fn run(mut self) {
        log::info!("Tracker worker started");
        let mut sequence: u64 = 0;
        let mut failed_reads: usize = 0;

        while !self.stop.load(Ordering::Relaxed) {
            let frame = match self.source.next_frame() {
                Ok(Some(frame)) => {
                    if failed_reads > 0 {
                        log::info!("Frame source recovered after {failed_reads} failed read(s)");
                    }
                    failed_reads = 0;
                    frame
                }
                Ok(None) => {
                    log::info!("Frame source exhausted after {sequence} published frame(s)");
                    self.emit(TrackerEvent::SourceExhausted);
                    break;
                }
                Err(error) => {
                    failed_reads += 1;
                    if failed_reads == 1 {
                        log::warn!("Skipping pass: {error}");
                    } else {
                        log::debug!("Skipping pass ({failed_reads} in a row): {error}");
                    }
                    self.emit(TrackerEvent::FrameSkipped {
                        frame_index: None,
                        error,
                    });
                    std::thread::sleep(self.retry_delay);
                    continue;
                }
            };

            let frame_index = frame.index();
            match self.pipeline.process(frame, self.logger.as_mut()) {
                Ok(outcome) => {
                    let t0 = Instant::now();
                    sequence += 1;
                    let found = outcome.face.is_some();
                    self.slot
                        .publish(TrackerSnapshot::from_outcome(sequence, outcome));
                    self.logger
                        .timing("publish", t0.elapsed().as_secs_f64() * 1000.0);
                    self.logger.progress(sequence as usize, None);
                    self.emit(TrackerEvent::Published {
                        sequence,
                        frame_index,
                        found,
                    });
                }
                Err(error) => {
                    log::warn!("Skipping frame {frame_index}: {error}");
                    self.emit(TrackerEvent::FrameSkipped {
                        frame_index: Some(frame_index),
                        error,
                    });
                }
            }
        }

        self.logger.summary();
        self.emit(TrackerEvent::Stopped);
        log::info!("Tracker worker stopped");
    }

    fn emit(&self, event: TrackerEvent) {
        if self.events.try_send(event).is_err() {
            log::trace!("Tracker event dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::localizer::Localizer;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::pose::domain::refiner::Refiner;
    use crate::shared::frame::Frame;
    use crate::shared::tracker_config::TrackerConfig;
    use ndarray::Array4;
    use std::collections::VecDeque;

    const WAIT: Duration = Duration::from_secs(5);

    /// Replays scripted reads, then reports exhaustion.
    struct ScriptedSource(VecDeque<Result<Option<Frame>, TrackerError>>);

    impl FrameSource for ScriptedSource {
        fn next_frame(&mut self) -> Result<Option<Frame>, TrackerError> {
            self.0.pop_front().unwrap_or(Ok(None))
        }
    }

    /// Never runs out of frames.
    struct EndlessSource {
        next: usize,
    }

    impl FrameSource for EndlessSource {
        fn next_frame(&mut self) -> Result<Option<Frame>, TrackerError> {
            self.next += 1;
            std::thread::sleep(Duration::from_millis(1));
            Ok(Some(frame(self.next - 1)))
        }
    }

    /// Hot cell in the center of the grid when the first pixel is bright.
    struct BrightnessLocalizer;

    impl Localizer for BrightnessLocalizer {
        fn infer(&mut self, input: Array4<f32>) -> Result<Array4<f32>, TrackerError> {
            let mut out = Array4::zeros((1, 6, 8, 1));
            if input[[0, 0, 0, 0]] > 0.5 {
                out[[0, 3, 4, 0]] = 0.9;
            }
            Ok(out)
        }
    }

    struct ZeroRefiner;

    impl Refiner for ZeroRefiner {
        fn infer(&mut self, _input: Array4<f32>) -> Result<Vec<f32>, TrackerError> {
            Ok(vec![0.0, 0.0, 0.9, 0.0, 0.0, 0.0, 0.0, 0.0])
        }
    }

    fn frame(index: usize) -> Frame {
        Frame::new(vec![255; 64 * 48 * 3], 64, 48, 3, index)
    }

    fn dark_frame(index: usize) -> Frame {
        Frame::new(vec![0; 64 * 48 * 3], 64, 48, 3, index)
    }

    fn pipeline() -> FramePipeline {
        let config = TrackerConfig {
            frame_width: 64,
            frame_height: 48,
            cutout_size: 9,
            ..TrackerConfig::default()
        };
        FramePipeline::new(config, Box::new(BrightnessLocalizer), Box::new(ZeroRefiner)).unwrap()
    }

    fn spawn(source: impl FrameSource + 'static) -> TrackerHandle {
        ThreadedTracker::new()
            .with_retry_delay(Duration::from_millis(1))
            .spawn(Box::new(source), pipeline(), Box::new(NullPipelineLogger))
    }

    fn collect_until_stopped(handle: &TrackerHandle) -> Vec<TrackerEvent> {
        let mut events = Vec::new();
        loop {
            let event = handle.events().recv_timeout(WAIT).unwrap();
            let done = event == TrackerEvent::Stopped;
            events.push(event);
            if done {
                return events;
            }
        }
    }

    #[test]
    fn test_publishes_every_frame_then_exhausts() {
        let source = ScriptedSource(VecDeque::from(vec![
            Ok(Some(frame(0))),
            Ok(Some(dark_frame(1))),
        ]));
        let mut handle = spawn(source);
        let events = collect_until_stopped(&handle);

        assert_eq!(
            events,
            vec![
                TrackerEvent::Published {
                    sequence: 1,
                    frame_index: 0,
                    found: true
                },
                TrackerEvent::Published {
                    sequence: 2,
                    frame_index: 1,
                    found: false
                },
                TrackerEvent::SourceExhausted,
                TrackerEvent::Stopped,
            ]
        );

        let latest = handle.latest().unwrap();
        assert_eq!(latest.sequence, 2);
        assert_eq!(latest.frame_index, 1);
        assert!(latest.face.is_none());
        assert!(latest.cutout_image.is_none());
        assert_eq!(latest.heat_map_image.index(), 1);
        handle.stop().unwrap();
    }

    #[test]
    fn test_source_errors_are_retried() {
        let source = ScriptedSource(VecDeque::from(vec![
            Err(TrackerError::source_unavailable("device busy")),
            Err(TrackerError::source_unavailable("device busy")),
            Ok(Some(frame(7))),
        ]));
        let handle = spawn(source);
        let events = collect_until_stopped(&handle);

        let skipped = events
            .iter()
            .filter(|e| matches!(e, TrackerEvent::FrameSkipped { frame_index: None, .. }))
            .count();
        assert_eq!(skipped, 2);
        assert!(events.contains(&TrackerEvent::Published {
            sequence: 1,
            frame_index: 7,
            found: true
        }));
    }

    #[test]
    fn test_bad_frame_is_skipped_and_worker_continues() {
        let wrong_size = Frame::new(vec![0; 3], 1, 1, 3, 0);
        let source = ScriptedSource(VecDeque::from(vec![
            Ok(Some(wrong_size)),
            Ok(Some(frame(1))),
        ]));
        let handle = spawn(source);
        let events = collect_until_stopped(&handle);

        assert!(matches!(
            &events[0],
            TrackerEvent::FrameSkipped {
                frame_index: Some(0),
                error: TrackerError::ShapeMismatch { stage: "frame", .. }
            }
        ));
        assert_eq!(handle.latest().unwrap().frame_index, 1);
    }

    #[test]
    fn test_short_buffer_frame_is_skipped_and_worker_continues() {
        let short = Frame::new(vec![0; 10], 64, 48, 3, 0);
        let source = ScriptedSource(VecDeque::from(vec![
            Ok(Some(short)),
            Ok(Some(frame(1))),
        ]));
        let mut handle = spawn(source);
        let events = collect_until_stopped(&handle);

        assert!(matches!(
            &events[0],
            TrackerEvent::FrameSkipped {
                frame_index: Some(0),
                error: TrackerError::ShapeMismatch { stage: "frame", .. }
            }
        ));
        assert!(events.contains(&TrackerEvent::Published {
            sequence: 1,
            frame_index: 1,
            found: true
        }));
        assert_eq!(events.last(), Some(&TrackerEvent::Stopped));
        handle.stop().unwrap();
    }

    #[test]
    fn test_stop_ends_endless_source() {
        let mut handle = spawn(EndlessSource { next: 0 });
        let first = handle.events().recv_timeout(WAIT).unwrap();
        assert!(matches!(first, TrackerEvent::Published { .. }));

        handle.stop().unwrap();
        assert!(handle.is_finished());
        let published = handle.latest().unwrap();

        // Nothing is published after the worker has been joined.
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(handle.latest().unwrap().sequence, published.sequence);
    }

    #[test]
    fn test_full_event_channel_does_not_stall_worker() {
        let frames = (0..20).map(|i| Ok(Some(frame(i)))).collect();
        let mut handle = ThreadedTracker::new()
            .with_event_capacity(1)
            .spawn(
                Box::new(ScriptedSource(frames)),
                pipeline(),
                Box::new(NullPipelineLogger),
            );

        let deadline = Instant::now() + WAIT;
        while !handle.is_finished() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        handle.stop().unwrap();
        assert_eq!(handle.latest().unwrap().sequence, 20);
    }

    #[test]
    fn test_drop_stops_worker() {
        let handle = spawn(EndlessSource { next: 0 });
        handle.events().recv_timeout(WAIT).unwrap();
        drop(handle);
    }
}
