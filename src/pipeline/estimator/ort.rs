use std::{path::Path, time::Instant};

use anyhow::{Context, Result, anyhow};
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;

use super::{Estimation, PoseEngine, common};
use crate::types::NormalizedFrame;

/// ONNX Runtime backed pose engine running the PoseNet single-pose model.
pub struct OrtPoseEngine {
    session: Session,
    device_label: String,
}

impl OrtPoseEngine {
    pub fn new(model_path: &Path) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(2)?
            .commit_from_file(model_path)
            .with_context(|| format!("failed to load ORT session from {}", model_path.display()))?;

        Ok(Self {
            session,
            device_label: "cpu".to_string(),
        })
    }
}

impl PoseEngine for OrtPoseEngine {
    fn estimate(&mut self, frame: &NormalizedFrame) -> Result<Estimation> {
        let input = common::frame_to_tensor(frame)?;
        let tensor = Tensor::from_array(input)?;

        let started = Instant::now();
        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .context("failed to run ORT session")?;
        let latency = started.elapsed();

        if outputs.len() < 2 {
            return Err(anyhow!(
                "model returned {} outputs, need heatmaps and offsets",
                outputs.len()
            ));
        }

        let heatmaps = outputs[0].try_extract_array::<f32>()?;
        let offsets = outputs[1].try_extract_array::<f32>()?;
        let person = common::decode_pose(
            &heatmaps.view(),
            &offsets.view(),
            frame.width(),
            frame.height(),
        )?;

        Ok(Estimation { person, latency })
    }

    fn device_label(&self) -> &str {
        &self.device_label
    }
}
