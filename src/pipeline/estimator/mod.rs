mod common;
mod ort;

use std::time::Duration;

use crate::types::{NormalizedFrame, Person};

pub use common::{MODEL_HEIGHT, MODEL_WIDTH};
pub use ort::OrtPoseEngine;

/// One inference result: the detected pose plus how long the model took.
#[derive(Clone, Debug)]
pub struct Estimation {
    pub person: Person,
    pub latency: Duration,
}

/// The pose-model collaborator. Injected so the pipeline runs against a
/// deterministic stub in tests; the shipped implementation is
/// [`OrtPoseEngine`].
pub trait PoseEngine: Send + 'static {
    fn estimate(&mut self, frame: &NormalizedFrame) -> anyhow::Result<Estimation>;

    /// Diagnostic label for the device the model runs on.
    fn device_label(&self) -> &str;
}
