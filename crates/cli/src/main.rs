mod config;

use std::fs;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use crossbeam_channel::{Receiver, Sender};

use ppe_monitor_core::compliance::domain::frame_aggregator::FrameAggregator;
use ppe_monitor_core::detection::domain::object_detector::ObjectDetector;
use ppe_monitor_core::detection::infrastructure::onnx_yolo_detector::OnnxYoloDetector;
use ppe_monitor_core::overlay::infrastructure::banner_overlay_renderer::BannerOverlayRenderer;
use ppe_monitor_core::pipeline::live_command::LiveCommand;
use ppe_monitor_core::pipeline::monitor_error::MonitorError;
use ppe_monitor_core::pipeline::monitor_image_use_case::MonitorImageUseCase;
use ppe_monitor_core::pipeline::monitor_live_use_case::MonitorLiveUseCase;
use ppe_monitor_core::pipeline::monitor_video_use_case::MonitorVideoUseCase;
use ppe_monitor_core::pipeline::pipeline_logger::{PipelineLogger, StdoutPipelineLogger};
use ppe_monitor_core::pipeline::session_summary::SessionSummary;
use ppe_monitor_core::shared::constants::{IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};
use ppe_monitor_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use ppe_monitor_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;
use ppe_monitor_core::video::infrastructure::image_file_reader::ImageFileReader;
use ppe_monitor_core::video::infrastructure::image_file_writer::ImageFileWriter;

use crate::config::MonitorConfig;

/// Real-time PPE compliance monitoring for images, videos and cameras.
#[derive(Parser)]
#[command(name = "ppe-monitor")]
struct Cli {
    /// `webcam`, a camera index, a stream URL, or a video/image file.
    #[arg(long, default_value = "webcam")]
    source: String,

    /// ONNX model path (overrides the config file).
    #[arg(long)]
    model: Option<PathBuf>,

    /// Detection confidence threshold (0.0-1.0).
    #[arg(long)]
    conf: Option<f32>,

    /// Config file (defaults to the user config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for results, snapshots and recordings.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Live mode: also record the annotated stream.
    #[arg(long)]
    record: bool,

    /// Write the session summary as JSON to this path.
    #[arg(long)]
    summary_json: Option<PathBuf>,

    /// Run inference on the CPU only.
    #[arg(long)]
    cpu_only: bool,
}

/// Where frames come from, decided from `--source`.
#[derive(Debug, PartialEq)]
enum Source {
    Camera(String),
    Stream(String),
    Video(PathBuf),
    Image(PathBuf),
}

fn main() {
    env_logger::init();

    match run() {
        Ok(()) => {}
        Err(e) => {
            eprintln!("Error: {e}");
            if let Some(summary) = e
                .downcast_ref::<MonitorError>()
                .and_then(MonitorError::summary)
            {
                println!("{summary}");
            }
            process::exit(1);
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    let source = classify_source(&cli.source, &config.camera_device);
    log::info!("Source: {source:?}");

    let detector = build_detector(&config, !cli.cpu_only)?;
    let logger: Box<dyn PipelineLogger> =
        Box::new(StdoutPipelineLogger::new(config.progress_interval));
    let renderer = Box::new(BannerOverlayRenderer::new()?);
    let aggregator = FrameAggregator::default();
    let output_dir = config.output_dir.as_path();

    let result = match &source {
        Source::Image(path) => MonitorImageUseCase::new(
            Box::new(ImageFileReader::new()),
            Box::new(ImageFileWriter::new()),
            detector,
            renderer,
            aggregator,
            config.confidence_threshold,
            logger,
        )
        .execute(path, output_dir),
        Source::Video(path) => MonitorVideoUseCase::new(
            Box::new(FfmpegReader::new()),
            Box::new(FfmpegWriter::new()),
            detector,
            renderer,
            aggregator,
            config.confidence_threshold,
            logger,
        )
        .execute(path, output_dir),
        Source::Camera(device) | Source::Stream(device) => {
            let reader = if matches!(source, Source::Camera(_)) {
                FfmpegReader::camera()
            } else {
                FfmpegReader::new()
            };
            let commands = live_commands()?;
            let mut use_case = MonitorLiveUseCase::new(
                Box::new(reader),
                Box::new(ImageFileWriter::new()),
                detector,
                renderer,
                aggregator,
                config.confidence_threshold,
                logger,
                commands,
            );
            if cli.record {
                use_case = use_case.with_recorder(Box::new(FfmpegWriter::new()));
            }
            use_case.execute(Path::new(device), output_dir)
        }
    };

    report(result, cli.summary_json.as_deref())
}

/// Prints a finished session and writes its JSON summary. Failed sessions
/// that carry a partial summary still get the JSON file.
fn report(
    result: Result<SessionSummary, MonitorError>,
    summary_json: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    match result {
        Ok(summary) => {
            println!("{summary}");
            if let Some(path) = summary_json {
                write_summary_json(&summary, path)?;
            }
            Ok(())
        }
        Err(e) => {
            if let (Some(path), Some(summary)) = (summary_json, e.summary()) {
                if let Err(write_err) = write_summary_json(summary, path) {
                    log::warn!("Could not write {}: {write_err}", path.display());
                }
            }
            Err(e.into())
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<MonitorConfig, Box<dyn std::error::Error>> {
    resolve_config_from(cli, MonitorConfig::load(cli.config.as_deref())?)
}

/// Applies CLI overrides on top of `config`, then validates the result.
fn resolve_config_from(
    cli: &Cli,
    mut config: MonitorConfig,
) -> Result<MonitorConfig, Box<dyn std::error::Error>> {
    if let Some(model) = &cli.model {
        config.model_path = model.clone();
    }
    if let Some(conf) = cli.conf {
        config.confidence_threshold = conf;
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    config.validate()?;
    Ok(config)
}

fn build_detector(
    config: &MonitorConfig,
    accelerate: bool,
) -> Result<Box<dyn ObjectDetector>, Box<dyn std::error::Error>> {
    if !config.model_path.is_file() {
        return Err(format!("Model not found: {}", config.model_path.display()).into());
    }
    log::info!("Loading model: {}", config.model_path.display());
    Ok(Box::new(OnnxYoloDetector::new(
        &config.model_path,
        config.class_names.clone(),
        config.iou_threshold,
        accelerate,
    )?))
}

fn classify_source(source: &str, camera_device: &str) -> Source {
    if source.eq_ignore_ascii_case("webcam") {
        return Source::Camera(camera_device.to_string());
    }
    if !source.is_empty() && source.chars().all(|c| c.is_ascii_digit()) {
        return Source::Camera(camera_index_device(source));
    }
    if source.contains("://") {
        return Source::Stream(source.to_string());
    }
    let path = PathBuf::from(source);
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Source::Image(path)
    } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Source::Video(path)
    } else {
        Source::Stream(source.to_string())
    }
}

fn camera_index_device(index: &str) -> String {
    if cfg!(target_os = "linux") {
        format!("/dev/video{index}")
    } else if cfg!(target_os = "windows") {
        format!("video={index}")
    } else {
        index.to_string()
    }
}

/// Ctrl-C sends `Quit`; stdin lines `q` and `s` send `Quit` and `Snapshot`.
fn live_commands() -> Result<Receiver<LiveCommand>, Box<dyn std::error::Error>> {
    let (tx, rx) = crossbeam_channel::unbounded();

    let interrupt = tx.clone();
    ctrlc::set_handler(move || {
        let _ = interrupt.send(LiveCommand::Quit);
    })?;

    std::thread::spawn(move || forward_stdin(std::io::stdin().lock(), &tx));
    Ok(rx)
}

fn forward_stdin(input: impl BufRead, tx: &Sender<LiveCommand>) {
    for line in input.lines() {
        let Ok(line) = line else { break };
        match LiveCommand::parse(&line) {
            Some(command) => {
                if tx.send(command).is_err() {
                    break;
                }
            }
            None if !line.trim().is_empty() => {
                eprintln!("Unknown command '{}': use 's' to snapshot, 'q' to quit", line.trim());
            }
            None => {}
        }
    }
}

fn write_summary_json(
    summary: &SessionSummary,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(summary)?)?;
    log::info!("Summary written to {}", path.display());
    Ok(())
}
