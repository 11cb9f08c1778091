use std::collections::BTreeMap;
use std::time::Instant;

/// Sink for what the tracker does per frame: stage timings, scalar metrics,
/// progress and status lines. The frame pipeline and the worker report here
/// and never print directly.
pub trait PipelineLogger: Send {
    /// `processed` frames are done; `total` is only known for finite inputs
    /// such as evaluation manifests.
    fn progress(&mut self, processed: usize, total: Option<usize>);

    /// Wall time of one stage (`scan`, `cutout`, `pose`, `publish`).
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// One sample of a named metric such as `heat_peak` or `found`.
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// Called once when the run ends.
    fn summary(&self) {}
}

/// Drops everything.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _: usize, _: Option<usize>) {}
    fn timing(&mut self, _: &str, _: f64) {}
    fn metric(&mut self, _: &str, _: f64) {}
    fn info(&mut self, _: &str) {}
}

/// Running aggregate of one named series of samples.
///
/// Holds a fixed amount of state however many samples are pushed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunningStat {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
}

impl RunningStat {
    fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

impl Default for RunningStat {
    fn default() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

/// Keeps a [`RunningStat`] per stage and per metric and logs a report when
/// the tracker shuts down. Memory use does not grow with the number of
/// frames, so it can stay attached to a live source indefinitely.
///
/// Progress lines are logged once every `throttle_frames` frames.
pub struct SummaryPipelineLogger {
    throttle_frames: usize,
    stages: BTreeMap<String, RunningStat>,
    metrics: BTreeMap<String, RunningStat>,
    started: Instant,
    frames: usize,
    last_message: Option<String>,
}

impl SummaryPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            stages: BTreeMap::new(),
            metrics: BTreeMap::new(),
            started: Instant::now(),
            frames: 0,
            last_message: None,
        }
    }

    pub fn timings_for(&self, stage: &str) -> Option<&RunningStat> {
        self.stages.get(stage)
    }

    pub fn metrics_for(&self, name: &str) -> Option<&RunningStat> {
        self.metrics.get(name)
    }

    /// Report text, or `None` before anything has been recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.stages.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed = self.started.elapsed().as_secs_f64();
        let mut report = format!(
            "Tracker summary ({} frames in {elapsed:.1}s)",
            self.frames
        );
        for (stage, stat) in &self.stages {
            report.push_str(&format!(
                "\n  {stage:8} {:6.1}ms avg  {:6.1}ms max  {:8.0}ms over {} calls",
                stat.mean(),
                stat.max(),
                stat.sum(),
                stat.count()
            ));
        }
        for (name, stat) in &self.metrics {
            report.push_str(&format!(
                "\n  {name:8} {:.2} avg  [{:.2}, {:.2}]",
                stat.mean(),
                stat.min(),
                stat.max()
            ));
        }
        if self.frames > 0 && elapsed > 0.0 {
            report.push_str(&format!("\n  {:.1} fps", self.frames as f64 / elapsed));
        }
        if let Some(message) = &self.last_message {
            report.push_str(&format!("\n  last status: {message}"));
        }
        Some(report)
    }
}

impl Default for SummaryPipelineLogger {
    fn default() -> Self {
        Self::new(100)
    }
}

impl PipelineLogger for SummaryPipelineLogger {
    fn progress(&mut self, processed: usize, total: Option<usize>) {
        self.frames = processed;
        let finished = total == Some(processed);
        if processed % self.throttle_frames != 0 && !finished {
            return;
        }
        match total.filter(|&t| t > 0) {
            Some(total) => log::info!(
                "Processed {processed}/{total} frames ({:.1}%)",
                processed as f64 / total as f64 * 100.0
            ),
            None => log::info!("Processed {processed} frames"),
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        record(&mut self.stages, stage, duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        record(&mut self.metrics, name, value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
        self.last_message = Some(message.to_string());
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("{text}");
        }
    }
}

fn record(series: &mut BTreeMap<String, RunningStat>, name: &str, value: f64) {
    match series.get_mut(name) {
        Some(stat) => stat.push(value),
        None => {
            let mut stat = RunningStat::default();
            stat.push(value);
            series.insert(name.to_string(), stat);
        }
    }
}
