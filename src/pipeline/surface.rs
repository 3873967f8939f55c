use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

/// A transparent RGBA canvas the overlay is drawn into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverlayCanvas {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl OverlayCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rgba: vec![0u8; (width as usize) * (height as usize) * 4],
        }
    }

    pub fn clear(&mut self) {
        self.rgba.fill(0);
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y * self.width + x) as usize) * 4;
        [
            self.rgba[idx],
            self.rgba[idx + 1],
            self.rgba[idx + 2],
            self.rgba[idx + 3],
        ]
    }
}

/// Numeric diagnostics presented alongside the overlay. Text layout is the
/// presentation layer's job; this carries the values and where they go.
#[derive(Clone, Debug)]
pub struct HudInfo {
    pub pose_score: f32,
    pub device_label: String,
    pub inference_latency: Duration,
    /// Anchor just below the inscribed square.
    pub anchor: (f32, f32),
}

/// The presentation surface the overlay is drawn onto. `lock` may return
/// None while the surface is mid-transition (resize, teardown); callers
/// skip that frame. Every successful lock must be paired with exactly one
/// `present`, which `with_canvas` guarantees structurally.
pub trait OverlaySurface: Send {
    fn lock(&mut self) -> Option<OverlayCanvas>;
    fn present(&mut self, canvas: OverlayCanvas, hud: Option<HudInfo>);
}

/// Lock-draw-present in one scoped step. Returns false when the surface was
/// unavailable and the frame was skipped.
pub fn with_canvas<F>(surface: &mut dyn OverlaySurface, hud: Option<HudInfo>, draw: F) -> bool
where
    F: FnOnce(&mut OverlayCanvas),
{
    let Some(mut canvas) = surface.lock() else {
        return false;
    };
    draw(&mut canvas);
    surface.present(canvas, hud);
    true
}

/// A presented overlay frame, observable from outside the worker.
#[derive(Clone, Debug)]
pub struct PresentedOverlay {
    pub canvas: OverlayCanvas,
    pub hud: Option<HudInfo>,
}

#[derive(Debug, Default)]
struct SharedOverlay {
    latest: Mutex<Option<PresentedOverlay>>,
    presented: AtomicU64,
}

/// Software presentation surface for headless runs and tests: keeps the
/// most recent presented overlay and a monotonic present counter.
#[derive(Debug)]
pub struct InMemorySurface {
    width: u32,
    height: u32,
    shared: Arc<SharedOverlay>,
}

/// Read side of an [`InMemorySurface`].
#[derive(Clone, Debug)]
pub struct OverlayHandle {
    shared: Arc<SharedOverlay>,
}

impl InMemorySurface {
    pub fn new(width: u32, height: u32) -> (Self, OverlayHandle) {
        let shared = Arc::new(SharedOverlay::default());
        (
            Self {
                width,
                height,
                shared: shared.clone(),
            },
            OverlayHandle { shared },
        )
    }
}

impl OverlaySurface for InMemorySurface {
    fn lock(&mut self) -> Option<OverlayCanvas> {
        Some(OverlayCanvas::new(self.width, self.height))
    }

    fn present(&mut self, canvas: OverlayCanvas, hud: Option<HudInfo>) {
        let mut latest = self
            .shared
            .latest
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *latest = Some(PresentedOverlay { canvas, hud });
        self.shared.presented.fetch_add(1, Ordering::SeqCst);
    }
}

impl OverlayHandle {
    pub fn latest(&self) -> Option<PresentedOverlay> {
        self.shared
            .latest
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn presented_count(&self) -> u64 {
        self.shared.presented.load(Ordering::SeqCst)
    }
}
