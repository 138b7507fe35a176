//! Inference contract for pretrained sequence models

use crate::error::PipelineResult;
use ndarray::{Array2, ArrayView3};
use std::sync::Arc;

/// A pretrained sequence-to-one regressor.
///
/// Implementations are immutable after loading and must be safe to call
/// from several pipeline runs at once.
pub trait SequenceModel: Send + Sync {
    /// Identifier used in logs and prediction records
    fn name(&self) -> &str;

    /// Run inference on a `(batch, sequence, features)` tensor and return
    /// `(batch, outputs)`. The first scalar is the next-step prediction in
    /// scaled space.
    fn infer(&self, input: ArrayView3<'_, f32>) -> PipelineResult<Array2<f32>>;
}

/// Model handle shared read-only across runs
pub type SharedModel = Arc<dyn SequenceModel>;
