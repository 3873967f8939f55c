use crate::types::{BodyPart, Person};

/// Minimum keypoint score before a joint is considered reliable enough to
/// draw. Comparison is strict: a score exactly at the threshold is out.
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.5;

const HUD_MARGIN: f32 = 15.0;

/// Anatomical skeleton graph: the joint pairs connected by lines when both
/// endpoints pass the confidence threshold.
pub const BODY_EDGES: [(BodyPart, BodyPart); 12] = [
    (BodyPart::LeftWrist, BodyPart::LeftElbow),
    (BodyPart::LeftElbow, BodyPart::LeftShoulder),
    (BodyPart::LeftShoulder, BodyPart::RightShoulder),
    (BodyPart::RightShoulder, BodyPart::RightElbow),
    (BodyPart::RightElbow, BodyPart::RightWrist),
    (BodyPart::LeftShoulder, BodyPart::LeftHip),
    (BodyPart::LeftHip, BodyPart::RightHip),
    (BodyPart::RightHip, BodyPart::RightShoulder),
    (BodyPart::LeftHip, BodyPart::LeftKnee),
    (BodyPart::LeftKnee, BodyPart::LeftAnkle),
    (BodyPart::RightHip, BodyPart::RightKnee),
    (BodyPart::RightKnee, BodyPart::RightAnkle),
];

/// Mapping from model-input space onto the presentation canvas: the model
/// square is stretched over the largest square inscribed in the canvas,
/// centered by integer letterbox offsets on the longer axis.
///
/// Recomputed whenever the surface size changes; never cached across a
/// resize.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasGeometry {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub square_side: u32,
    pub left: f32,
    pub top: f32,
    pub width_ratio: f32,
    pub height_ratio: f32,
}

impl CanvasGeometry {
    pub fn new(canvas_width: u32, canvas_height: u32, model_w: u32, model_h: u32) -> Self {
        let square_side = canvas_width.min(canvas_height);
        let left = ((canvas_width - square_side) / 2) as f32;
        let top = ((canvas_height - square_side) / 2) as f32;
        Self {
            canvas_width,
            canvas_height,
            square_side,
            left,
            top,
            // Equal for square model inputs; kept distinct so non-square
            // models keep working.
            width_ratio: square_side as f32 / model_w as f32,
            height_ratio: square_side as f32 / model_h as f32,
        }
    }

    /// Screen position of a model-space point.
    pub fn map(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x * self.width_ratio + self.left,
            y * self.height_ratio + self.top,
        )
    }

    /// Where diagnostic text goes: just below the inscribed square.
    pub fn hud_anchor(&self) -> (f32, f32) {
        (self.left, self.top + self.square_side as f32 + HUD_MARGIN)
    }
}

/// The drawable result of mapping one pose: dot positions for keypoints
/// that passed the threshold, and line segments for edges whose both
/// endpoints passed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverlayShapes {
    pub dots: Vec<(f32, f32)>,
    pub lines: Vec<[(f32, f32); 2]>,
}

/// Maps a pose into canvas coordinates, dropping keypoints at or below
/// `min_confidence`. Model coordinates outside the input square are passed
/// through unclamped; the renderer's bounds checks make that safe.
pub fn map_to_canvas(person: &Person, geometry: &CanvasGeometry, min_confidence: f32) -> OverlayShapes {
    let mut shapes = OverlayShapes::default();

    for keypoint in &person.keypoints {
        if keypoint.score > min_confidence {
            shapes.dots.push(geometry.map(keypoint.x, keypoint.y));
        }
    }

    for (first, second) in BODY_EDGES {
        let a = person.get(first);
        let b = person.get(second);
        if a.score > min_confidence && b.score > min_confidence {
            shapes
                .lines
                .push([geometry.map(a.x, a.y), geometry.map(b.x, b.y)]);
        }
    }

    shapes
}
