//! Signal synthesis, decision combination and the pipeline that drives them.

pub mod decision;
pub mod engine;
pub mod synthesizer;

pub use decision::*;
pub use engine::SignalPipeline;
pub use synthesizer::*;
