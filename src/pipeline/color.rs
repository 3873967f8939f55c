use crate::types::{FrameError, RawFrame, RgbaFrame};
use yuv::{
    YuvBiPlanarImage, YuvConversionMode, YuvRange, YuvStandardMatrix, yuv_nv21_to_rgba,
};

// The camera encodes BT.601 full range; this must stay in lockstep with the
// sensor or skin tones shift visibly.
const YUV_MATRIX: YuvStandardMatrix = YuvStandardMatrix::Bt601;
const YUV_RANGE: YuvRange = YuvRange::Full;

/// Converts a planar YUV 4:2:0 frame into packed RGBA of the same
/// dimensions. Takes the frame by value; its planes are released on return.
///
/// The frame is first repacked into a bi-planar layout: the full-resolution
/// luma plane followed by interleaved V-then-U bytes, one pair per
/// sub-sampled chroma sample, honoring the source pixel stride. The chroma
/// ordering is fixed (NV21); sensors with other layouts must be adapted
/// before this point.
pub fn convert(frame: RawFrame) -> Result<RgbaFrame, FrameError> {
    let (width, height) = (frame.width, frame.height);
    if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
        return Err(FrameError::BadDimensions { width, height });
    }
    if frame.chroma_pixel_stride == 0 {
        return Err(FrameError::ZeroChromaStride);
    }

    let pixel_count = frame.pixel_count();
    if frame.luma.len() < pixel_count {
        return Err(FrameError::LumaPlaneTooSmall {
            got: frame.luma.len(),
            need: pixel_count,
        });
    }

    let chroma_samples = frame.chroma_sample_count();
    let stride = frame.chroma_pixel_stride;
    let chroma_need = (chroma_samples - 1) * stride + 1;
    if frame.chroma_u.len() < chroma_need {
        return Err(FrameError::ChromaPlaneTooSmall {
            plane: "U",
            got: frame.chroma_u.len(),
            need: chroma_need,
        });
    }
    if frame.chroma_v.len() < chroma_need {
        return Err(FrameError::ChromaPlaneTooSmall {
            plane: "V",
            got: frame.chroma_v.len(),
            need: chroma_need,
        });
    }

    // Luma samples are 8-bit here; sensors backed by wider storage units
    // must narrow to the low byte before handing frames over.
    let y_plane = &frame.luma[..pixel_count];

    let mut vu_plane = vec![0u8; chroma_samples * 2];
    for index in 0..chroma_samples {
        vu_plane[2 * index] = frame.chroma_v[index * stride];
        vu_plane[2 * index + 1] = frame.chroma_u[index * stride];
    }

    let image = YuvBiPlanarImage {
        y_plane,
        y_stride: width,
        uv_plane: &vu_plane,
        uv_stride: width,
        width,
        height,
    };

    let mut rgba = vec![0u8; pixel_count * 4];
    yuv_nv21_to_rgba(
        &image,
        &mut rgba,
        width * 4,
        YUV_RANGE,
        YUV_MATRIX,
        YuvConversionMode::Balanced,
    )
    .map_err(|err| FrameError::Conversion(format!("{err:?}")))?;

    Ok(RgbaFrame {
        rgba,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_frame(width: u32, height: u32, y: u8, u: u8, v: u8, stride: usize) -> RawFrame {
        let pixels = (width * height) as usize;
        let chroma = pixels / 4;
        RawFrame {
            width,
            height,
            luma: vec![y; pixels],
            chroma_u: vec![u; chroma * stride],
            chroma_v: vec![v; chroma * stride],
            chroma_pixel_stride: stride,
        }
    }

    #[test]
    fn output_dimensions_match_input() {
        let out = convert(flat_frame(64, 48, 90, 128, 128, 1)).unwrap();
        assert_eq!(out.width, 64);
        assert_eq!(out.height, 48);
        assert_eq!(out.rgba.len(), 64 * 48 * 4);
    }

    #[test]
    fn neutral_chroma_yields_gray() {
        // Full-range BT.601 with U=V=128 degenerates to R=G=B=Y.
        let out = convert(flat_frame(16, 16, 128, 128, 128, 1)).unwrap();
        let [r, g, b, a] = out.pixel(8, 8);
        assert!(r.abs_diff(128) <= 2, "r={r}");
        assert!(g.abs_diff(128) <= 2, "g={g}");
        assert!(b.abs_diff(128) <= 2, "b={b}");
        assert_eq!(a, 255);
    }

    #[test]
    fn conversion_is_deterministic() {
        let frame = flat_frame(32, 32, 77, 100, 180, 2);
        let a = convert(frame.clone()).unwrap();
        let b = convert(frame).unwrap();
        assert_eq!(a.rgba, b.rgba);
    }

    #[test]
    fn stride_two_reads_every_other_byte() {
        // A stride-2 plane where the off-stride bytes are garbage must
        // decode identically to the contiguous stride-1 plane.
        let width = 8u32;
        let height = 8u32;
        let chroma = (width * height / 4) as usize;

        let mut u2 = Vec::with_capacity(chroma * 2);
        let mut v2 = Vec::with_capacity(chroma * 2);
        for i in 0..chroma {
            u2.extend_from_slice(&[(100 + i) as u8, 0xAA]);
            v2.extend_from_slice(&[(60 + i) as u8, 0x55]);
        }
        let strided = RawFrame {
            width,
            height,
            luma: vec![120; (width * height) as usize],
            chroma_u: u2,
            chroma_v: v2,
            chroma_pixel_stride: 2,
        };

        let packed = RawFrame {
            width,
            height,
            luma: vec![120; (width * height) as usize],
            chroma_u: (0..chroma).map(|i| (100 + i) as u8).collect(),
            chroma_v: (0..chroma).map(|i| (60 + i) as u8).collect(),
            chroma_pixel_stride: 1,
        };

        assert_eq!(convert(strided).unwrap().rgba, convert(packed).unwrap().rgba);
    }

    #[test]
    fn short_luma_plane_is_rejected() {
        let mut frame = flat_frame(16, 16, 128, 128, 128, 1);
        frame.luma.truncate(100);
        assert_eq!(
            convert(frame).unwrap_err(),
            FrameError::LumaPlaneTooSmall {
                got: 100,
                need: 256
            }
        );
    }

    #[test]
    fn short_chroma_plane_is_rejected() {
        let mut frame = flat_frame(16, 16, 128, 128, 128, 1);
        frame.chroma_v.truncate(10);
        assert!(matches!(
            convert(frame).unwrap_err(),
            FrameError::ChromaPlaneTooSmall { plane: "V", .. }
        ));
    }

    #[test]
    fn odd_dimensions_are_rejected() {
        let frame = flat_frame(16, 16, 128, 128, 128, 1);
        let odd = RawFrame {
            width: 15,
            height: 16,
            ..frame
        };
        assert!(matches!(
            convert(odd).unwrap_err(),
            FrameError::BadDimensions { .. }
        ));
    }
}
