use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Instant,
};

use anyhow::{Result, anyhow};
use crossbeam_channel::Sender;
use nokhwa::{
    Buffer, Camera,
    pixel_format::RgbFormat,
    query,
    utils::{
        ApiBackend, CameraIndex, CameraInfo, FrameFormat, RequestedFormat, RequestedFormatType,
    },
};

use crate::types::RawFrame;

// The pipeline's inbound contract is planar 4:2:0, so NV12 leads; the rest
// are listed so stream negotiation succeeds on drivers that reject it.
const PREFERRED_PIXEL_FORMATS: &[FrameFormat] = &[
    FrameFormat::NV12,
    FrameFormat::YUYV,
    FrameFormat::RAWRGB,
    FrameFormat::MJPEG,
];

fn requested_formats() -> [RequestedFormat<'static>; 3] {
    [
        RequestedFormat::with_formats(
            RequestedFormatType::AbsoluteHighestFrameRate,
            PREFERRED_PIXEL_FORMATS,
        ),
        RequestedFormat::with_formats(
            RequestedFormatType::AbsoluteHighestResolution,
            PREFERRED_PIXEL_FORMATS,
        ),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate),
    ]
}

#[derive(Clone, Debug)]
pub struct CameraDevice {
    pub index: CameraIndex,
    pub label: String,
}

#[derive(Debug)]
pub struct CameraStream {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl CameraStream {
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CameraStream {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

pub fn available_cameras() -> Result<Vec<CameraDevice>> {
    let cameras = query(ApiBackend::Auto)?;
    Ok(cameras
        .into_iter()
        .map(|info| CameraDevice {
            index: info.index().clone(),
            label: format_camera_label(&info),
        })
        .collect())
}

fn format_camera_label(info: &CameraInfo) -> String {
    info.human_name()
}

fn build_camera(index: CameraIndex) -> Result<Camera> {
    let mut last_err = None;

    for requested in requested_formats() {
        match Camera::new(index.clone(), requested) {
            Ok(mut camera) => match camera.open_stream() {
                Ok(()) => return Ok(camera),
                Err(err) => last_err = Some(err.into()),
            },
            Err(err) => last_err = Some(err.into()),
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow!("failed to open camera with any supported format")))
}

/// Re-exposes a semi-planar NV12 buffer as the three-plane RawFrame layout:
/// full luma plane plus U/V planes read at pixel stride 2. Returns None for
/// formats the pipeline cannot take; those frames are skipped upstream.
fn buffer_to_raw_frame(buffer: &Buffer) -> Option<RawFrame> {
    if buffer.source_frame_format() != FrameFormat::NV12 {
        return None;
    }

    let resolution = buffer.resolution();
    let width = resolution.width_x;
    let height = resolution.height_y;
    let data = buffer.buffer();

    let y_len = width as usize * height as usize;
    let uv_len = y_len / 2;
    if data.len() < y_len + uv_len {
        return None;
    }

    let uv = &data[y_len..y_len + uv_len];
    Some(RawFrame {
        width,
        height,
        luma: data[..y_len].to_vec(),
        chroma_u: uv.to_vec(),
        chroma_v: uv[1..].to_vec(),
        chroma_pixel_stride: 2,
    })
}

/// Captures frames on a dedicated thread and hands them to the pipeline
/// over `frame_tx`. The channel is bounded; if the worker is still busy the
/// frame is dropped rather than queued.
pub fn start_camera_stream(index: CameraIndex, frame_tx: Sender<RawFrame>) -> Result<CameraStream> {
    // Fail fast before spawning the capture thread.
    build_camera(index.clone())?;

    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();

    let handle = thread::spawn(move || {
        let mut camera = match build_camera(index) {
            Ok(cam) => cam,
            Err(err) => {
                log::error!("failed to open camera: {err:?}");
                return;
            }
        };

        while !stop_flag.load(Ordering::Relaxed) {
            let frame_start = Instant::now();
            let buffer = match camera.frame() {
                Ok(buffer) => buffer,
                Err(err) => {
                    log::warn!(
                        "camera frame read failed (after {:?}): {err:?}",
                        frame_start.elapsed()
                    );
                    continue;
                }
            };

            let Some(raw) = buffer_to_raw_frame(&buffer) else {
                log::warn!(
                    "skipping non-4:2:0 camera frame ({:?})",
                    buffer.source_frame_format()
                );
                continue;
            };

            // Drop if the worker is busy; never queue a backlog.
            let _ = frame_tx.try_send(raw);
        }
    });

    Ok(CameraStream {
        stop,
        handle: Some(handle),
    })
}
