use anyhow::{Result, anyhow};
use ndarray::{Array4, ArrayViewD};
use rayon::prelude::*;

use crate::types::{BodyPart, KeyPoint, NormalizedFrame, Person};

pub const MODEL_WIDTH: u32 = 257;
pub const MODEL_HEIGHT: u32 = 257;

/// Packs a normalized frame into the model's NHWC input tensor, scaling
/// pixel values to [-1, 1].
pub(crate) fn frame_to_tensor(frame: &NormalizedFrame) -> Result<Array4<f32>> {
    let (width, height) = (frame.width() as usize, frame.height() as usize);
    let expected = width * height * 4;
    if frame.rgba().len() != expected {
        return Err(anyhow!(
            "frame buffer size mismatch: got {}, expected {}",
            frame.rgba().len(),
            expected
        ));
    }

    let normalized: Vec<f32> = frame
        .rgba()
        .par_chunks_exact(4)
        .flat_map_iter(|px| {
            [
                px[0] as f32 / 127.5 - 1.0,
                px[1] as f32 / 127.5 - 1.0,
                px[2] as f32 / 127.5 - 1.0,
            ]
        })
        .collect();

    Array4::<f32>::from_shape_vec((1, height, width, 3), normalized)
        .map_err(|err| anyhow!("failed to build input tensor: {err}"))
}

/// Decodes PoseNet outputs into a pose. `heatmaps` is [1, rows, cols, 17];
/// `offsets` is [1, rows, cols, 34] with y-offsets in the first 17 channels
/// and x-offsets in the rest. For each part: argmax the heatmap, refine
/// with the offset at that cell, sigmoid the raw logit into a score.
pub(crate) fn decode_pose(
    heatmaps: &ArrayViewD<'_, f32>,
    offsets: &ArrayViewD<'_, f32>,
    model_w: u32,
    model_h: u32,
) -> Result<Person> {
    let heat_shape = heatmaps.shape();
    if heat_shape.len() != 4 || heat_shape[0] != 1 || heat_shape[3] != BodyPart::COUNT {
        return Err(anyhow!("unexpected heatmap shape: {heat_shape:?}"));
    }
    let (rows, cols) = (heat_shape[1], heat_shape[2]);
    if rows < 2 || cols < 2 {
        return Err(anyhow!("heatmap grid too small: {rows}x{cols}"));
    }

    let offset_shape = offsets.shape();
    if offset_shape != [1, rows, cols, BodyPart::COUNT * 2] {
        return Err(anyhow!("unexpected offset shape: {offset_shape:?}"));
    }

    let mut keypoints = Vec::with_capacity(BodyPart::COUNT);
    for index in 0..BodyPart::COUNT {
        let part = BodyPart::from_index(index)
            .ok_or_else(|| anyhow!("body part index out of range: {index}"))?;

        let (mut best_row, mut best_col) = (0usize, 0usize);
        let mut best = f32::NEG_INFINITY;
        for row in 0..rows {
            for col in 0..cols {
                let value = heatmaps[[0, row, col, index]];
                if value > best {
                    best = value;
                    best_row = row;
                    best_col = col;
                }
            }
        }

        let y = best_row as f32 / (rows - 1) as f32 * model_h as f32
            + offsets[[0, best_row, best_col, index]];
        let x = best_col as f32 / (cols - 1) as f32 * model_w as f32
            + offsets[[0, best_row, best_col, index + BodyPart::COUNT]];

        keypoints.push(KeyPoint {
            part,
            x,
            y,
            score: sigmoid(best),
        });
    }

    let keypoints: [KeyPoint; BodyPart::COUNT] = keypoints
        .try_into()
        .map_err(|_| anyhow!("keypoint count mismatch"))?;
    Ok(Person::new(keypoints))
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
