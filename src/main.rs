mod app;
mod assets;
mod config;
mod display;
mod gesture;
mod model_download;
mod mouth;
mod pipeline;
mod types;
mod window;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use app::OverlayApp;
use assets::{OverlayPaths, Overlays};
use config::Args;
use model_download::{ModelDownloadEvent, ModelKind, ensure_model_ready, model_path};
use pipeline::{FaceDetector, HandDetector, LandmarkDetector};

/// Applied when `RUST_LOG` is unset, so degraded-mode warnings reach the console.
const DEFAULT_LOG_FILTER: &str = "info";

fn log_env(filter_var: &str) -> env_logger::Env<'_> {
    env_logger::Env::new()
        .filter_or(filter_var, DEFAULT_LOG_FILTER)
        .write_style(env_logger::DEFAULT_WRITE_STYLE_ENV)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(log_env(env_logger::DEFAULT_FILTER_ENV)).init();
    let args = Args::parse();

    // Failures are reported but never turned into a non-zero exit status.
    if let Err(err) = run(&args) {
        log::error!("{err:#}");
        eprintln!("error: {err:#}");
    }

    Ok(())
}

fn run(args: &Args) -> Result<()> {
    log::info!(
        "using {:?} overlays from {}",
        args.assets,
        args.asset_dir.display()
    );
    let overlays = Overlays::load(&OverlayPaths::for_set(&args.asset_dir, args.assets))
        .context("failed to load overlay images")?;

    let hand = build_hand_detector(&args.model_dir).context("hand tracking is unavailable")?;
    let face = if overlays.has_tongue() {
        build_face_detector(&args.model_dir)
    } else {
        None
    };
    let mut app = OverlayApp::new(Box::new(hand), face, overlays);

    run_camera(&mut app)
}

#[cfg(feature = "camera-nokhwa")]
fn run_camera(app: &mut OverlayApp) -> Result<()> {
    use pipeline::CameraSource;
    use window::WindowSink;

    let camera = CameraSource::open_default()?;
    let (width, height) = camera.resolution();
    let window = WindowSink::open(width, height)?;

    println!("Showing {width}x{height} camera feed. Press 'q' to quit.");
    let summary = app.run(camera, window)?;
    log::info!(
        "stopped after {} frames ({:?})",
        summary.frames_shown,
        summary.exit
    );
    Ok(())
}

#[cfg(not(feature = "camera-nokhwa"))]
fn run_camera(_app: &mut OverlayApp) -> Result<()> {
    anyhow::bail!("built without camera support; enable the `camera-nokhwa` feature")
}

fn prepare_model(model_dir: &Path, model: ModelKind) -> Result<PathBuf> {
    let path = model_path(model_dir, model);
    ensure_model_ready(model, &path, |event| match event {
        ModelDownloadEvent::AlreadyPresent { model } => {
            log::debug!("{} model found at {}", model.label(), path.display());
        }
        ModelDownloadEvent::Started { model, total } => {
            log::info!(
                "fetching {} model ({} bytes)",
                model.label(),
                total.map_or_else(|| "unknown".to_string(), |bytes| bytes.to_string())
            );
        }
        ModelDownloadEvent::Finished { model } => {
            log::info!("{} model ready", model.label());
        }
        _ => {}
    })?;
    Ok(path)
}

fn build_hand_detector(model_dir: &Path) -> Result<HandDetector> {
    let palm = prepare_model(model_dir, ModelKind::PalmDetector)?;
    let handpose = prepare_model(model_dir, ModelKind::HandLandmarks)?;
    HandDetector::new(&handpose, &palm)
}

/// Face tracking only feeds the tongue overlay, so any failure here just
/// switches that overlay off.
fn build_face_detector(model_dir: &Path) -> Option<Box<dyn LandmarkDetector>> {
    let build = || -> Result<FaceDetector> {
        let detector = prepare_model(model_dir, ModelKind::FaceDetector)?;
        let mesh = prepare_model(model_dir, ModelKind::FaceMesh)?;
        FaceDetector::new(&detector, &mesh)
    };

    match build() {
        Ok(face) => Some(Box::new(face)),
        Err(err) => {
            log::warn!("mouth detection disabled: {err:#}");
            None
        }
    }
}
