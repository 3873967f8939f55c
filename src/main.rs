use std::{sync::Arc, thread, time::Duration};

use anyhow::{Context, Result, anyhow};
use crossbeam_channel::bounded;

use pose_overlay::{
    camera,
    model_download::{default_pose_model_path, ensure_pose_model_ready},
    pipeline::{InMemorySurface, OrtPoseEngine, SessionState, start_pose_worker},
    types::LensFacing,
};

// Virtual portrait canvas for headless runs; a windowed front end would
// feed its real surface size into SessionState instead.
const CANVAS_WIDTH: u32 = 1080;
const CANVAS_HEIGHT: u32 = 1920;

fn main() -> Result<()> {
    env_logger::init();

    let mut lens_facing = LensFacing::Back;
    let mut max_frames: Option<u64> = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--front" => lens_facing = LensFacing::Front,
            "--back" => lens_facing = LensFacing::Back,
            "--frames" => {
                let value = args.next().ok_or_else(|| anyhow!("--frames needs a count"))?;
                max_frames = Some(value.parse().context("--frames needs a number")?);
            }
            other => return Err(anyhow!("unknown argument: {other}")),
        }
    }

    let cameras = camera::available_cameras().context("failed to enumerate cameras")?;
    let device = cameras
        .first()
        .cloned()
        .ok_or_else(|| anyhow!("no camera available"))?;
    log::info!("using camera: {}", device.label);

    let model_path = default_pose_model_path();
    ensure_pose_model_ready(&model_path, |_event| {})?;
    let engine = OrtPoseEngine::new(&model_path)?;

    let session = Arc::new(SessionState::new(lens_facing, CANVAS_WIDTH, CANVAS_HEIGHT));
    let (surface, overlay) = InMemorySurface::new(CANVAS_WIDTH, CANVAS_HEIGHT);

    let (frame_tx, frame_rx) = bounded(1);
    let worker = start_pose_worker(
        Box::new(engine),
        Box::new(surface),
        session.clone(),
        frame_rx,
    );
    let stream = camera::start_camera_stream(device.index.clone(), frame_tx)?;

    let mut last_count = 0;
    loop {
        thread::sleep(Duration::from_secs(1));

        let count = overlay.presented_count();
        if let Some(presented) = overlay.latest() {
            if let Some(hud) = presented.hud {
                log::info!(
                    "{} overlays presented; score {:.2}, {} inference {:.1} ms",
                    count,
                    hud.pose_score,
                    hud.device_label,
                    hud.inference_latency.as_secs_f64() * 1000.0
                );
            }
        } else if count == last_count {
            log::debug!("no overlay presented yet");
        }
        last_count = count;

        if let Some(limit) = max_frames {
            if count >= limit {
                break;
            }
        }
    }

    // Stop capture first so no new frames enter, then drain the worker.
    stream.stop();
    worker.stop();
    Ok(())
}
