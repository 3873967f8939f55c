use std::path::PathBuf;

use anyhow::{Context, Result};
use image::RgbaImage;

use pose_overlay::{
    model_download::{default_pose_model_path, ensure_pose_model_ready},
    pipeline::{
        CanvasGeometry, DEFAULT_MIN_CONFIDENCE, MODEL_HEIGHT, MODEL_WIDTH, OrtPoseEngine,
        OverlayCanvas, PoseEngine, SkeletonRenderer, normalize, overlay,
    },
    types::RgbaFrame,
};

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let input_image = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("demo/person.png"));
    let output_image = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("demo/person_with_pose.png"));
    let model_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(default_pose_model_path);

    let photo = image::open(&input_image)
        .with_context(|| format!("failed to open image {}", input_image.display()))?
        .to_rgba8();
    let (width, height) = photo.dimensions();

    // A still photo is already upright, so the lens orientation stage is
    // skipped; the rest of the pipeline runs unchanged.
    let frame = RgbaFrame::new(width, height, photo.clone().into_raw())?;
    let normalized = normalize::normalize(frame, MODEL_WIDTH, MODEL_HEIGHT)?;

    ensure_pose_model_ready(&model_path, |_event| {})?;
    let mut engine = OrtPoseEngine::new(&model_path)?;

    println!(
        "Running inference with model {} on {}",
        model_path.display(),
        input_image.display()
    );
    let estimation = engine.estimate(&normalized).context("inference failed")?;
    println!(
        "Pose score {:.3}, inference took {:.1} ms",
        estimation.person.score,
        estimation.latency.as_secs_f64() * 1000.0
    );

    let geometry = CanvasGeometry::new(width, height, MODEL_WIDTH, MODEL_HEIGHT);
    let shapes = overlay::map_to_canvas(&estimation.person, &geometry, DEFAULT_MIN_CONFIDENCE);

    let mut canvas = OverlayCanvas::new(width, height);
    SkeletonRenderer::default().draw(&mut canvas, &shapes);

    let composited = composite(photo, &canvas);
    composited
        .save(&output_image)
        .with_context(|| format!("failed to save {}", output_image.display()))?;

    println!("Wrote {}", output_image.display());
    Ok(())
}

fn composite(mut photo: RgbaImage, canvas: &OverlayCanvas) -> RgbaImage {
    for (x, y, pixel) in photo.enumerate_pixels_mut() {
        let overlay_px = canvas.pixel(x, y);
        if overlay_px[3] != 0 {
            pixel.0 = overlay_px;
        }
    }
    photo
}
