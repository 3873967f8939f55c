use super::overlay::OverlayShapes;
use super::surface::{HudInfo, OverlayCanvas, OverlaySurface, with_canvas};

pub const KEYPOINT_RADIUS: i32 = 8;
pub const SKELETON_LINE_THICKNESS: i32 = 8;

const LINE_COLOR: [u8; 4] = [56, 189, 248, 255];
const DOT_COLOR: [u8; 4] = [248, 113, 113, 255];

/// Draws thresholded keypoints and skeleton lines onto a transparent
/// overlay. Rendering failures are non-fatal; an unavailable surface just
/// skips the frame.
#[derive(Clone, Copy, Debug)]
pub struct SkeletonRenderer {
    dot_radius: i32,
    line_thickness: i32,
    dot_color: [u8; 4],
    line_color: [u8; 4],
}

impl Default for SkeletonRenderer {
    fn default() -> Self {
        Self {
            dot_radius: KEYPOINT_RADIUS,
            line_thickness: SKELETON_LINE_THICKNESS,
            dot_color: DOT_COLOR,
            line_color: LINE_COLOR,
        }
    }
}

impl SkeletonRenderer {
    /// Locks the surface, draws, presents. Returns false when the surface
    /// was unavailable and the frame was skipped.
    pub fn render_to_surface(
        &self,
        surface: &mut dyn OverlaySurface,
        shapes: &OverlayShapes,
        hud: Option<HudInfo>,
    ) -> bool {
        with_canvas(surface, hud, |canvas| self.draw(canvas, shapes))
    }

    pub fn draw(&self, canvas: &mut OverlayCanvas, shapes: &OverlayShapes) {
        canvas.clear();

        for [a, b] in &shapes.lines {
            draw_line(canvas, a, b, self.line_color, self.line_thickness);
        }

        for &(x, y) in &shapes.dots {
            draw_circle(
                canvas,
                (x as i32, y as i32),
                self.dot_radius,
                self.dot_color,
            );
        }
    }
}

fn draw_line(
    canvas: &mut OverlayCanvas,
    p0: &(f32, f32),
    p1: &(f32, f32),
    color: [u8; 4],
    thickness: i32,
) {
    let (mut x0, mut y0) = (p0.0 as i32, p0.1 as i32);
    let (x1, y1) = (p1.0 as i32, p1.1 as i32);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let radius = (thickness.max(1) - 1) / 2;

    loop {
        put_pixel_safe(canvas, x0, y0, color);
        if radius > 0 {
            for ox in -radius..=radius {
                for oy in -radius..=radius {
                    if ox == 0 && oy == 0 {
                        continue;
                    }
                    if ox.abs() + oy.abs() <= radius {
                        put_pixel_safe(canvas, x0 + ox, y0 + oy, color);
                    }
                }
            }
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

fn draw_circle(canvas: &mut OverlayCanvas, center: (i32, i32), radius: i32, color: [u8; 4]) {
    let (cx, cy) = center;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put_pixel_safe(canvas, cx + dx, cy + dy, color);
            }
        }
    }
}

fn put_pixel_safe(canvas: &mut OverlayCanvas, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 {
        return;
    }
    let (ux, uy) = (x as u32, y as u32);
    if ux >= canvas.width || uy >= canvas.height {
        return;
    }
    let idx = ((uy * canvas.width + ux) as usize) * 4;
    canvas.rgba[idx..idx + 4].copy_from_slice(&color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::surface::InMemorySurface;

    #[test]
    fn draw_starts_from_a_transparent_canvas() {
        let renderer = SkeletonRenderer::default();
        let mut canvas = OverlayCanvas::new(64, 64);
        canvas.rgba.fill(200);

        renderer.draw(&mut canvas, &OverlayShapes::default());
        assert!(canvas.rgba.iter().all(|&b| b == 0));
    }

    #[test]
    fn dot_is_drawn_at_the_keypoint() {
        let renderer = SkeletonRenderer::default();
        let mut canvas = OverlayCanvas::new(64, 64);
        let shapes = OverlayShapes {
            dots: vec![(32.0, 32.0)],
            lines: Vec::new(),
        };

        renderer.draw(&mut canvas, &shapes);
        assert_eq!(canvas.pixel(32, 32), DOT_COLOR);
        // Inside the disc radius.
        assert_eq!(canvas.pixel(32 + KEYPOINT_RADIUS as u32, 32), DOT_COLOR);
        // Well outside stays transparent.
        assert_eq!(canvas.pixel(60, 60), [0, 0, 0, 0]);
    }

    #[test]
    fn line_covers_both_endpoints() {
        let renderer = SkeletonRenderer::default();
        let mut canvas = OverlayCanvas::new(64, 64);
        let shapes = OverlayShapes {
            dots: Vec::new(),
            lines: vec![[(5.0, 5.0), (50.0, 5.0)]],
        };

        renderer.draw(&mut canvas, &shapes);
        assert_eq!(canvas.pixel(5, 5), LINE_COLOR);
        assert_eq!(canvas.pixel(50, 5), LINE_COLOR);
        assert_eq!(canvas.pixel(27, 5), LINE_COLOR);
    }

    #[test]
    fn out_of_bounds_shapes_do_not_panic() {
        let renderer = SkeletonRenderer::default();
        let mut canvas = OverlayCanvas::new(16, 16);
        let shapes = OverlayShapes {
            dots: vec![(-40.0, 8.0), (200.0, 200.0)],
            lines: vec![[(-10.0, -10.0), (30.0, 30.0)]],
        };
        renderer.draw(&mut canvas, &shapes);
    }

    #[test]
    fn render_to_surface_presents_the_overlay() {
        let renderer = SkeletonRenderer::default();
        let (mut surface, handle) = InMemorySurface::new(32, 32);
        let shapes = OverlayShapes {
            dots: vec![(16.0, 16.0)],
            lines: Vec::new(),
        };

        assert!(renderer.render_to_surface(&mut surface, &shapes, None));
        let presented = handle.latest().unwrap();
        assert_eq!(presented.canvas.pixel(16, 16), DOT_COLOR);
        assert_eq!(handle.presented_count(), 1);
    }
}
