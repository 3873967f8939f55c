pub mod color;
pub mod estimator;
pub mod normalize;
pub mod orient;
pub mod overlay;
pub mod skeleton;
pub mod surface;

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use anyhow::Result;
use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::types::{LensFacing, RawFrame};

pub use estimator::{Estimation, MODEL_HEIGHT, MODEL_WIDTH, OrtPoseEngine, PoseEngine};
pub use overlay::{BODY_EDGES, CanvasGeometry, DEFAULT_MIN_CONFIDENCE, OverlayShapes};
pub use skeleton::SkeletonRenderer;
pub use surface::{HudInfo, InMemorySurface, OverlayCanvas, OverlayHandle, OverlaySurface};

const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Session parameters shared between the presentation layer and the worker:
/// which lens is active and how the canvas maps to model space. Readers take
/// whole-value snapshots, so a resize mid-frame is never half-observed.
#[derive(Debug)]
pub struct SessionState {
    lens_facing: Mutex<LensFacing>,
    geometry: Mutex<CanvasGeometry>,
}

impl SessionState {
    pub fn new(lens_facing: LensFacing, canvas_width: u32, canvas_height: u32) -> Self {
        Self {
            lens_facing: Mutex::new(lens_facing),
            geometry: Mutex::new(CanvasGeometry::new(
                canvas_width,
                canvas_height,
                MODEL_WIDTH,
                MODEL_HEIGHT,
            )),
        }
    }

    /// Takes effect on the next captured frame.
    pub fn set_lens_facing(&self, lens_facing: LensFacing) {
        *lock_ignoring_poison(&self.lens_facing) = lens_facing;
    }

    pub fn lens_facing(&self) -> LensFacing {
        *lock_ignoring_poison(&self.lens_facing)
    }

    /// Recomputes the letterbox geometry for a resized surface. Never
    /// cached across a resize; the worker picks the new value up on its
    /// next frame.
    pub fn set_canvas_size(&self, canvas_width: u32, canvas_height: u32) {
        *lock_ignoring_poison(&self.geometry) =
            CanvasGeometry::new(canvas_width, canvas_height, MODEL_WIDTH, MODEL_HEIGHT);
    }

    pub fn geometry(&self) -> CanvasGeometry {
        *lock_ignoring_poison(&self.geometry)
    }
}

fn lock_ignoring_poison<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Handle to the running pose worker. Stopping signals the thread and joins
/// it; dropping does the same, so in-flight work never outlives teardown.
#[derive(Debug)]
pub struct PoseWorker {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl PoseWorker {
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for PoseWorker {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Spawns the single worker that runs the whole per-frame chain: convert,
/// orient, normalize, estimate, map, render. One frame in flight at a time;
/// frames arriving while busy are superseded by newer ones.
pub fn start_pose_worker(
    mut engine: Box<dyn PoseEngine>,
    mut surface: Box<dyn OverlaySurface>,
    session: Arc<SessionState>,
    frame_rx: Receiver<RawFrame>,
) -> PoseWorker {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();

    let handle = thread::spawn(move || {
        let renderer = SkeletonRenderer::default();

        while !stop_flag.load(Ordering::Relaxed) {
            let raw = match recv_latest_frame(&frame_rx) {
                Ok(Some(frame)) => frame,
                Ok(None) => continue,
                // Capture side hung up; drain and stop.
                Err(_) => break,
            };

            match process_frame(engine.as_mut(), &renderer, surface.as_mut(), &session, raw) {
                Ok(true) => {}
                Ok(false) => log::debug!("overlay surface unavailable, frame skipped"),
                Err(err) => log::warn!("frame dropped: {err:#}"),
            }
        }
    });

    PoseWorker {
        stop,
        handle: Some(handle),
    }
}

/// Blocks for the next frame (bounded by the stop poll interval), then
/// drains the channel so only the newest capture is processed.
fn recv_latest_frame(
    frame_rx: &Receiver<RawFrame>,
) -> Result<Option<RawFrame>, RecvTimeoutError> {
    let mut frame = match frame_rx.recv_timeout(STOP_POLL_INTERVAL) {
        Ok(frame) => frame,
        Err(RecvTimeoutError::Timeout) => return Ok(None),
        Err(err @ RecvTimeoutError::Disconnected) => return Err(err),
    };
    while let Ok(newer) = frame_rx.try_recv() {
        frame = newer;
    }
    Ok(Some(frame))
}

/// The per-frame pipeline. Returns Ok(false) when the surface skipped the
/// frame; any error aborts this frame only, the next one starts clean.
fn process_frame(
    engine: &mut dyn PoseEngine,
    renderer: &SkeletonRenderer,
    surface: &mut dyn OverlaySurface,
    session: &SessionState,
    raw: RawFrame,
) -> Result<bool> {
    let lens_facing = session.lens_facing();

    let rgba = color::convert(raw)?;
    let upright = orient::orient(rgba, lens_facing)?;
    let normalized = normalize::normalize(upright, MODEL_WIDTH, MODEL_HEIGHT)?;

    let estimation = engine.estimate(&normalized)?;

    let geometry = session.geometry();
    let shapes = overlay::map_to_canvas(&estimation.person, &geometry, DEFAULT_MIN_CONFIDENCE);
    let hud = HudInfo {
        pose_score: estimation.person.score,
        device_label: engine.device_label().to_string(),
        inference_latency: estimation.latency,
        anchor: geometry.hud_anchor(),
    };

    Ok(renderer.render_to_surface(surface, &shapes, Some(hud)))
}
