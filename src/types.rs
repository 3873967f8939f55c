use thiserror::Error;

/// Precondition failures on an inbound camera frame. Fatal for the frame
/// that carries them; the next frame is processed independently.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("luma plane too small: got {got} bytes, need {need}")]
    LumaPlaneTooSmall { got: usize, need: usize },
    #[error("{plane} chroma plane too small: got {got} bytes, need {need}")]
    ChromaPlaneTooSmall {
        plane: &'static str,
        got: usize,
        need: usize,
    },
    #[error("chroma pixel stride must be at least 1")]
    ZeroChromaStride,
    #[error("frame buffer size mismatch: got {got}, expected {expected}")]
    BufferSizeMismatch { got: usize, expected: usize },
    #[error("frame dimensions must be even and non-zero: {width}x{height}")]
    BadDimensions { width: u32, height: u32 },
    #[error("yuv conversion failed: {0}")]
    Conversion(String),
}

/// One planar YUV 4:2:0 frame as delivered by the camera. The two chroma
/// planes hold width/2 × height/2 logical samples each, read at
/// `chroma_pixel_stride` byte steps (stride 2 for semi-planar sources).
#[derive(Clone, Debug)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub luma: Vec<u8>,
    pub chroma_u: Vec<u8>,
    pub chroma_v: Vec<u8>,
    pub chroma_pixel_stride: usize,
}

impl RawFrame {
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn chroma_sample_count(&self) -> usize {
        (self.width as usize / 2) * (self.height as usize / 2)
    }
}

/// Packed RGBA image, 4 bytes per pixel, alpha ignored by the pipeline.
/// Stages take it by value; dropping the old buffer is the explicit free.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbaFrame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl RgbaFrame {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, FrameError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(FrameError::BufferSizeMismatch {
                got: rgba.len(),
                expected,
            });
        }
        Ok(Self {
            rgba,
            width,
            height,
        })
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

/// Upright RGBA image resized to exactly the model input square. Only the
/// normalizer constructs this, so the dimension invariant holds everywhere.
#[derive(Clone, Debug)]
pub struct NormalizedFrame {
    frame: RgbaFrame,
}

impl NormalizedFrame {
    pub(crate) fn new(frame: RgbaFrame) -> Self {
        Self { frame }
    }

    pub fn width(&self) -> u32 {
        self.frame.width
    }

    pub fn height(&self) -> u32 {
        self.frame.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.frame.rgba
    }

    pub fn into_inner(self) -> RgbaFrame {
        self.frame
    }
}

/// Which way the active sensor points. Session-scoped; a toggle takes
/// effect on the next captured frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LensFacing {
    Front,
    Back,
}

/// PoseNet body parts in model output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum BodyPart {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl BodyPart {
    pub const COUNT: usize = 17;

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Nose),
            1 => Some(Self::LeftEye),
            2 => Some(Self::RightEye),
            3 => Some(Self::LeftEar),
            4 => Some(Self::RightEar),
            5 => Some(Self::LeftShoulder),
            6 => Some(Self::RightShoulder),
            7 => Some(Self::LeftElbow),
            8 => Some(Self::RightElbow),
            9 => Some(Self::LeftWrist),
            10 => Some(Self::RightWrist),
            11 => Some(Self::LeftHip),
            12 => Some(Self::RightHip),
            13 => Some(Self::LeftKnee),
            14 => Some(Self::RightKnee),
            15 => Some(Self::LeftAnkle),
            16 => Some(Self::RightAnkle),
            _ => None,
        }
    }
}

/// One detected keypoint; x/y are in model-input pixel space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeyPoint {
    pub part: BodyPart,
    pub x: f32,
    pub y: f32,
    pub score: f32,
}

/// A single detected pose: one keypoint per body part, in BodyPart order.
#[derive(Clone, Debug)]
pub struct Person {
    pub keypoints: [KeyPoint; BodyPart::COUNT],
    pub score: f32,
}

impl Person {
    pub fn new(keypoints: [KeyPoint; BodyPart::COUNT]) -> Self {
        let score = keypoints.iter().map(|kp| kp.score).sum::<f32>() / BodyPart::COUNT as f32;
        Self { keypoints, score }
    }

    pub fn get(&self, part: BodyPart) -> &KeyPoint {
        &self.keypoints[part as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_part_from_index_covers_full_range() {
        assert_eq!(BodyPart::from_index(0), Some(BodyPart::Nose));
        assert_eq!(BodyPart::from_index(16), Some(BodyPart::RightAnkle));
        assert_eq!(BodyPart::from_index(17), None);
        for i in 0..BodyPart::COUNT {
            assert_eq!(BodyPart::from_index(i).unwrap() as usize, i);
        }
    }

    #[test]
    fn person_get_indexes_by_part() {
        let mut keypoints = [KeyPoint {
            part: BodyPart::Nose,
            x: 0.0,
            y: 0.0,
            score: 0.0,
        }; BodyPart::COUNT];
        for (i, kp) in keypoints.iter_mut().enumerate() {
            kp.part = BodyPart::from_index(i).unwrap();
        }
        keypoints[BodyPart::LeftWrist as usize].x = 42.0;
        keypoints[BodyPart::LeftWrist as usize].score = 0.9;

        let person = Person::new(keypoints);
        assert_eq!(person.get(BodyPart::LeftWrist).x, 42.0);
        assert_eq!(person.get(BodyPart::LeftWrist).score, 0.9);
    }

    #[test]
    fn person_score_is_mean_of_keypoint_scores() {
        let mut keypoints = [KeyPoint {
            part: BodyPart::Nose,
            x: 0.0,
            y: 0.0,
            score: 0.5,
        }; BodyPart::COUNT];
        for (i, kp) in keypoints.iter_mut().enumerate() {
            kp.part = BodyPart::from_index(i).unwrap();
        }
        let person = Person::new(keypoints);
        assert!((person.score - 0.5).abs() < 1e-6);
    }

    #[test]
    fn rgba_frame_rejects_wrong_buffer_size() {
        let err = RgbaFrame::new(4, 4, vec![0; 10]).unwrap_err();
        assert_eq!(
            err,
            FrameError::BufferSizeMismatch {
                got: 10,
                expected: 64
            }
        );
    }
}
