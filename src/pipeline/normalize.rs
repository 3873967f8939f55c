use anyhow::{Context, Result, anyhow};
use fast_image_resize as fir;

use crate::types::{NormalizedFrame, RgbaFrame};

// Acceptable difference between the model input ratio and the frame ratio
// below which cropping is skipped entirely.
const RATIO_EPSILON: f32 = 1e-5;

/// Crops the frame to the model's aspect ratio (symmetric, truncating) and
/// scales it to exactly `target_w` x `target_h` with bilinear smoothing.
pub fn normalize(frame: RgbaFrame, target_w: u32, target_h: u32) -> Result<NormalizedFrame> {
    let expected = frame.width as usize * frame.height as usize * 4;
    if frame.rgba.len() != expected {
        return Err(anyhow!(
            "frame buffer size mismatch: got {}, expected {}",
            frame.rgba.len(),
            expected
        ));
    }

    let (crop_x, crop_y, crop_w, crop_h) = crop_rect(frame.width, frame.height, target_w, target_h);
    let cropped = crop(&frame, crop_x, crop_y, crop_w, crop_h);
    drop(frame);

    let scaled = scale(cropped, target_w, target_h)?;
    Ok(NormalizedFrame::new(scaled))
}

/// Computes the sub-rectangle to keep, per the symmetric crop policy:
/// whichever axis is proportionally too long loses `crop/2` from each side,
/// with integer truncation.
pub(crate) fn crop_rect(width: u32, height: u32, target_w: u32, target_h: u32) -> (u32, u32, u32, u32) {
    let bitmap_ratio = height as f32 / width as f32;
    let model_ratio = target_h as f32 / target_w as f32;

    if (model_ratio - bitmap_ratio).abs() < RATIO_EPSILON {
        return (0, 0, width, height);
    }

    if model_ratio < bitmap_ratio {
        // Source is relatively taller, so it is height constrained.
        let crop_height = height as f32 - (width as f32 / model_ratio);
        let top = (crop_height / 2.0) as u32;
        let new_height = (height as f32 - crop_height) as u32;
        (0, top, width, new_height)
    } else {
        let crop_width = width as f32 - (height as f32 * model_ratio);
        let left = (crop_width / 2.0) as u32;
        let new_width = (width as f32 - crop_width) as u32;
        (left, 0, new_width, height)
    }
}

fn crop(frame: &RgbaFrame, x: u32, y: u32, width: u32, height: u32) -> RgbaFrame {
    if x == 0 && y == 0 && width == frame.width && height == frame.height {
        return frame.clone();
    }

    let src_stride = frame.width as usize * 4;
    let row_bytes = width as usize * 4;
    let mut rgba = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let offset = (y as usize + row) * src_stride + x as usize * 4;
        rgba.extend_from_slice(&frame.rgba[offset..offset + row_bytes]);
    }

    RgbaFrame {
        rgba,
        width,
        height,
    }
}

fn scale(frame: RgbaFrame, target_w: u32, target_h: u32) -> Result<RgbaFrame> {
    if frame.width == target_w && frame.height == target_h {
        return Ok(frame);
    }

    let src_image =
        fir::images::Image::from_vec_u8(frame.width, frame.height, frame.rgba, fir::PixelType::U8x4)?;
    let mut dst_image = fir::images::Image::new(target_w, target_h, fir::PixelType::U8x4);
    let mut resizer = fir::Resizer::new();
    let resize_options = fir::ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Interpolation(fir::FilterType::Bilinear));
    resizer
        .resize(&src_image, &mut dst_image, Some(&resize_options))
        .context("fast resize failed")?;

    Ok(RgbaFrame {
        rgba: dst_image.into_vec(),
        width: target_w,
        height: target_h,
    })
}
