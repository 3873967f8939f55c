use crate::types::{FrameError, LensFacing, RgbaFrame};
use image::{ImageBuffer, Rgba, imageops};

type RgbaBuffer = ImageBuffer<Rgba<u8>, Vec<u8>>;

/// Brings a sensor-oriented frame upright for display.
///
/// Back lens: rotate +90° (clockwise). Front lens: rotate −90°, then mirror
/// horizontally about the image's own center so the preview behaves like a
/// mirror. Both paths swap width and height; axis-aligned rotations are
/// pixel-exact, no resampling happens.
pub fn orient(frame: RgbaFrame, lens_facing: LensFacing) -> Result<RgbaFrame, FrameError> {
    let (width, height) = (frame.width, frame.height);
    let expected = width as usize * height as usize * 4;
    if frame.rgba.len() != expected {
        return Err(FrameError::BufferSizeMismatch {
            got: frame.rgba.len(),
            expected,
        });
    }

    // The move into ImageBuffer consumes the input; the pre-transform
    // buffer is gone once this scope ends.
    let image: RgbaBuffer = RgbaBuffer::from_raw(width, height, frame.rgba)
        .ok_or(FrameError::BufferSizeMismatch { got: 0, expected })?;

    let upright = match lens_facing {
        LensFacing::Back => imageops::rotate90(&image),
        LensFacing::Front => {
            let rotated = imageops::rotate270(&image);
            imageops::flip_horizontal(&rotated)
        }
    };

    let (out_w, out_h) = upright.dimensions();
    Ok(RgbaFrame {
        rgba: upright.into_raw(),
        width: out_w,
        height: out_h,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with_pixel(width: u32, height: u32, x: u32, y: u32, color: [u8; 4]) -> RgbaFrame {
        let mut rgba = vec![0u8; (width * height * 4) as usize];
        let idx = ((y * width + x) * 4) as usize;
        rgba[idx..idx + 4].copy_from_slice(&color);
        RgbaFrame {
            rgba,
            width,
            height,
        }
    }

    const MARK: [u8; 4] = [200, 10, 30, 255];

    #[test]
    fn back_lens_rotates_plus_ninety() {
        // 640x480 in, 480x640 out, and the top-left source pixel lands in
        // the top-right corner: (x, y) -> (h - 1 - y, x).
        let frame = frame_with_pixel(640, 480, 0, 0, MARK);
        let out = orient(frame, LensFacing::Back).unwrap();
        assert_eq!((out.width, out.height), (480, 640));
        assert_eq!(out.pixel(479, 0), MARK);
    }

    #[test]
    fn back_lens_interior_pixel_mapping() {
        let frame = frame_with_pixel(640, 480, 10, 20, MARK);
        let out = orient(frame, LensFacing::Back).unwrap();
        assert_eq!(out.pixel(480 - 1 - 20, 10), MARK);
    }

    #[test]
    fn front_lens_rotates_minus_ninety_then_mirrors() {
        // rotate270: (x, y) -> (y, w - 1 - x); mirror: (x, y) -> (w' - 1 - x, y).
        let frame = frame_with_pixel(640, 480, 0, 0, MARK);
        let out = orient(frame, LensFacing::Front).unwrap();
        assert_eq!((out.width, out.height), (480, 640));
        assert_eq!(out.pixel(480 - 1 - 0, 640 - 1), MARK);
    }

    #[test]
    fn rotation_is_pixel_exact() {
        // Every source pixel must appear exactly once, unblended.
        let width = 6u32;
        let height = 4u32;
        let mut rgba = Vec::with_capacity((width * height * 4) as usize);
        for i in 0..(width * height) as u8 {
            rgba.extend_from_slice(&[i, i.wrapping_mul(3), 255 - i, 255]);
        }
        let frame = RgbaFrame {
            rgba: rgba.clone(),
            width,
            height,
        };

        let out = orient(frame, LensFacing::Back).unwrap();
        for y in 0..height {
            for x in 0..width {
                let src = [
                    rgba[((y * width + x) * 4) as usize],
                    rgba[((y * width + x) * 4 + 1) as usize],
                    rgba[((y * width + x) * 4 + 2) as usize],
                    255,
                ];
                assert_eq!(out.pixel(height - 1 - y, x), src);
            }
        }
    }

    #[test]
    fn mismatched_buffer_is_rejected() {
        let frame = RgbaFrame {
            rgba: vec![0; 12],
            width: 10,
            height: 10,
        };
        assert!(matches!(
            orient(frame, LensFacing::Back).unwrap_err(),
            FrameError::BufferSizeMismatch { .. }
        ));
    }
}
