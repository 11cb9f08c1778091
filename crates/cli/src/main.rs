use std::path::{Path, PathBuf};
use std::process;
use std::time::{Duration, Instant};

use clap::Parser;

use facescan_core::capture::domain::frame_source::FrameSource;
use facescan_core::capture::infrastructure::ffmpeg_frame_source::FfmpegFrameSource;
use facescan_core::capture::infrastructure::image_sequence_source::{
    is_image_file, ImageSequenceSource,
};
use facescan_core::detection::domain::subcell_refinement::Refinement;
use facescan_core::detection::infrastructure::onnx_localizer::OnnxLocalizer;
use facescan_core::evaluation::infrastructure::json_annotation_source::JsonAnnotationSource;
use facescan_core::pipeline::evaluate_tracker_use_case::EvaluateTrackerUseCase;
use facescan_core::pipeline::frame_pipeline::FramePipeline;
use facescan_core::pipeline::infrastructure::threaded_tracker::{
    ThreadedTracker, TrackerEvent, TrackerHandle,
};
use facescan_core::pipeline::pipeline_logger::SummaryPipelineLogger;
use facescan_core::pipeline::snapshot::TrackerSnapshot;
use facescan_core::pose::infrastructure::onnx_refiner::OnnxRefiner;
use facescan_core::shared::frame::Frame;
use facescan_core::shared::tracker_config::TrackerConfig;

/// Face position and head pose tracking on videos and image sequences.
#[derive(Parser)]
#[command(name = "facescan")]
struct Cli {
    /// Input video, image, or directory of images. With --evaluate, a JSON
    /// annotation manifest.
    input: PathBuf,

    /// ONNX model of the coarse localization network.
    #[arg(long)]
    scan_model: PathBuf,

    /// ONNX model of the pose regression network.
    #[arg(long)]
    pose_model: PathBuf,

    /// JSON tracker configuration (defaults apply to missing fields).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Heat-map detection threshold (0.0-1.0), overrides the config file.
    #[arg(long)]
    threshold: Option<f32>,

    /// Sub-cell refinement: linear or quadratic, overrides the config file.
    #[arg(long)]
    refinement: Option<Refinement>,

    /// Write heat-map, cutout and input PNGs of published results here.
    #[arg(long)]
    dump_dir: Option<PathBuf>,

    /// Dump every Nth result seen by the poll loop. Results published
    /// between two polls are never seen and do not count.
    #[arg(long, default_value = "1")]
    dump_every: usize,

    /// Snapshot polling interval in milliseconds.
    #[arg(long, default_value = "15")]
    poll_ms: u64,

    /// Stop after this many published results.
    #[arg(long)]
    max_frames: Option<u64>,

    /// Measure errors against the annotations in the input manifest.
    #[arg(long)]
    evaluate: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = build_config(&cli)?;
    log::info!(
        "Tracking at {}x{} ({} channels), factor {}, threshold {}, {} refinement",
        config.frame_width,
        config.frame_height,
        config.channels.count(),
        config.factor,
        config.threshold,
        config.refinement
    );

    let pipeline = FramePipeline::new(
        config.clone(),
        Box::new(OnnxLocalizer::new(&cli.scan_model)?),
        Box::new(OnnxRefiner::new(&cli.pose_model)?),
    )?;

    if cli.evaluate {
        run_evaluation(&cli.input, &config, pipeline)
    } else {
        let source = open_source(&cli.input, &config)?;
        run_tracking(&cli, source, pipeline)
    }
}

fn build_config(cli: &Cli) -> Result<TrackerConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => TrackerConfig::load(path)?,
        None => TrackerConfig::default(),
    };
    if let Some(threshold) = cli.threshold {
        config.threshold = threshold;
    }
    if let Some(refinement) = cli.refinement {
        config.refinement = refinement;
    }
    config.validate()?;
    Ok(config)
}

fn open_source(
    input: &Path,
    config: &TrackerConfig,
) -> Result<Box<dyn FrameSource>, Box<dyn std::error::Error>> {
    if input.is_dir() || is_image_file(input) {
        Ok(Box::new(ImageSequenceSource::from_path(
            input,
            config.frame_width,
            config.frame_height,
            config.channels,
        )?))
    } else {
        Ok(Box::new(FfmpegFrameSource::open(
            input,
            config.frame_width,
            config.frame_height,
        )?))
    }
}

fn run_tracking(
    cli: &Cli,
    source: Box<dyn FrameSource>,
    pipeline: FramePipeline,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(dir) = &cli.dump_dir {
        std::fs::create_dir_all(dir)?;
    }

    let mut handle = ThreadedTracker::new().spawn(
        source,
        pipeline,
        Box::new(SummaryPipelineLogger::default()),
    );

    let poll = Duration::from_millis(cli.poll_ms);
    let mut last_sequence = 0u64;
    let mut observed = 0usize;
    let mut dumped = 0usize;
    let started = Instant::now();

    loop {
        let finished = drain_events(&handle);

        if let Some(snapshot) = handle.latest() {
            if snapshot.sequence != last_sequence {
                report(&snapshot, last_sequence);
                if let Some(dir) = &cli.dump_dir {
                    if is_dump_turn(observed, cli.dump_every) {
                        dump_snapshot(dir, &snapshot)?;
                        dumped += 1;
                    }
                }
                observed += 1;
                last_sequence = snapshot.sequence;
            }
        }

        if finished || cli.max_frames.is_some_and(|max| last_sequence >= max) {
            break;
        }
        std::thread::sleep(poll);
    }

    handle.stop()?;
    log::info!(
        "Observed {last_sequence} published result(s) in {:.1}s",
        started.elapsed().as_secs_f64()
    );
    if let Some(dir) = &cli.dump_dir {
        log::info!("Wrote {dumped} snapshot(s) to {}", dir.display());
    }
    Ok(())
}

/// True for the 1st, (every+1)th, ... snapshot the poll loop observes.
fn is_dump_turn(observed: usize, every: usize) -> bool {
    observed % every.max(1) == 0
}

/// Logs pending worker events. Returns true once the worker has stopped.
fn drain_events(handle: &TrackerHandle) -> bool {
    let mut finished = false;
    for event in handle.events().try_iter() {
        match event {
            TrackerEvent::FrameSkipped { frame_index, error } => match frame_index {
                Some(index) => log::debug!("Frame {index} skipped: {error}"),
                None => log::debug!("Read skipped: {error}"),
            },
            TrackerEvent::SourceExhausted => log::info!("End of input"),
            TrackerEvent::Stopped => finished = true,
            TrackerEvent::Published { .. } => {}
        }
    }
    finished || handle.is_finished()
}

fn report(snapshot: &TrackerSnapshot, last_sequence: u64) {
    let missed = snapshot.sequence - last_sequence - 1;
    if missed > 0 {
        log::debug!("{missed} result(s) published between polls");
    }
    match &snapshot.face {
        Some(face) => {
            let pos = face
                .head_pos
                .map(|p| format!("({:.3}, {:.3}, {:.3})", p.x, p.y, p.z))
                .unwrap_or_else(|| "invalid".to_string());
            log::info!(
                "Frame {}: screen ({:.1}, {:.1}) ndc ({:.3}, {:.3}, {:.3}) head {} yaw {:.3} pitch {:.3}",
                snapshot.frame_index,
                face.screen_x,
                face.screen_y,
                face.ndc.x,
                face.ndc.y,
                face.ndc.z,
                pos,
                face.head_dir.yaw,
                face.head_dir.pitch
            );
        }
        None => log::info!("Frame {}: no face", snapshot.frame_index),
    }
}

fn dump_snapshot(dir: &Path, snapshot: &TrackerSnapshot) -> Result<(), Box<dyn std::error::Error>> {
    let index = snapshot.frame_index;
    save_frame(&dir.join(format!("{index:06}_input.png")), &snapshot.input)?;
    save_frame(&dir.join(format!("{index:06}_heat.png")), &snapshot.heat_map_image)?;
    if let Some(cutout) = &snapshot.cutout_image {
        save_frame(&dir.join(format!("{index:06}_cutout.png")), cutout)?;
    }
    Ok(())
}

fn save_frame(path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
    let color = match frame.channels() {
        1 => image::ExtendedColorType::L8,
        3 => image::ExtendedColorType::Rgb8,
        4 => image::ExtendedColorType::Rgba8,
        n => return Err(format!("Cannot save a {n}-channel frame").into()),
    };
    image::save_buffer(path, frame.data(), frame.width(), frame.height(), color)?;
    Ok(())
}

fn run_evaluation(
    manifest: &Path,
    config: &TrackerConfig,
    pipeline: FramePipeline,
) -> Result<(), Box<dyn std::error::Error>> {
    let annotations = JsonAnnotationSource::open(
        manifest,
        config.frame_width,
        config.frame_height,
        config.channels,
    )?;
    let mut use_case = EvaluateTrackerUseCase::new(
        pipeline,
        Box::new(annotations),
        Box::new(SummaryPipelineLogger::default()),
    );
    let report = use_case.execute()?;
    log::info!("\n{report}");
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input not found: {}", cli.input.display()).into());
    }
    if cli.evaluate && cli.input.is_dir() {
        return Err("--evaluate expects a JSON manifest, not a directory".into());
    }
    if let Some(threshold) = cli.threshold {
        if !(0.0..1.0).contains(&threshold) {
            return Err(format!("Threshold must be in [0.0, 1.0), got {threshold}").into());
        }
    }
    if cli.poll_ms == 0 {
        return Err("Poll interval must be positive".into());
    }
    if cli.dump_every == 0 {
        return Err("--dump-every must be positive".into());
    }
    if cli.max_frames == Some(0) {
        return Err("--max-frames must be positive".into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(input: &Path, extra: &[&str]) -> Cli {
        let mut args = vec![
            "facescan",
            input.to_str().unwrap(),
            "--scan-model",
            "scan.onnx",
            "--pose-model",
            "pose.onnx",
        ];
        args.extend_from_slice(extra);
        Cli::parse_from(args)
    }

    #[test]
    fn test_validate_accepts_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate(&cli(dir.path(), &[])).is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_input() {
        let err = validate(&cli(Path::new("/nonexistent/video.mp4"), &[])).unwrap_err();
        assert!(err.to_string().contains("Input not found"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let dir = tempfile::tempdir().unwrap();
        for extra in [
            &["--threshold", "1.5"][..],
            &["--poll-ms", "0"][..],
            &["--dump-every", "0"][..],
            &["--max-frames", "0"][..],
            &["--evaluate"][..],
        ] {
            assert!(validate(&cli(dir.path(), extra)).is_err(), "{extra:?}");
        }
    }

    #[test]
    fn test_refinement_flag_parses() {
        let dir = tempfile::tempdir().unwrap();
        let parsed = cli(dir.path(), &["--refinement", "quadratic"]);
        assert_eq!(parsed.refinement, Some(Refinement::Quadratic));
        assert!(Cli::try_parse_from([
            "facescan",
            "x",
            "--scan-model",
            "a",
            "--pose-model",
            "b",
            "--refinement",
            "cubic"
        ])
        .is_err());
    }

    #[test]
    fn test_build_config_applies_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("tracker.json");
        std::fs::write(&config_path, r#"{"threshold": 0.2, "factor": 16}"#).unwrap();
        let parsed = cli(
            dir.path(),
            &[
                "--config",
                config_path.to_str().unwrap(),
                "--threshold",
                "0.5",
                "--refinement",
                "quadratic",
            ],
        );
        let config = build_config(&parsed).unwrap();
        assert_eq!(config.threshold, 0.5);
        assert_eq!(config.factor, 16);
        assert_eq!(config.refinement, Refinement::Quadratic);
    }

    #[test]
    fn test_save_frame_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("heat.png");
        let frame = Frame::new(vec![0, 64, 128, 255], 2, 2, 1, 0);
        save_frame(&path, &frame).unwrap();
        let img = image::open(&path).unwrap().to_luma8();
        assert_eq!(img.into_raw(), vec![0, 64, 128, 255]);
    }

    #[test]
    fn test_save_frame_rejects_two_channels() {
        let dir = tempfile::tempdir().unwrap();
        let frame = Frame::new(vec![0; 8], 2, 2, 2, 0);
        assert!(save_frame(&dir.path().join("x.png"), &frame).is_err());
    }

    #[test]
    fn test_dump_turns_follow_observed_count() {
        // None of these sequence numbers is 1 mod 5; a slow poll still dumps.
        let seen_sequences = [3u64, 9, 14, 20, 22, 30];
        let dumped: Vec<u64> = seen_sequences
            .iter()
            .enumerate()
            .filter(|&(observed, _)| is_dump_turn(observed, 5))
            .map(|(_, &sequence)| sequence)
            .collect();
        assert_eq!(dumped, vec![3, 30]);
        assert!((0..4).all(|i| is_dump_turn(i, 1)));
    }
}
