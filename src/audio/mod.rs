pub mod analyzer;
pub mod constants;
pub mod ring_queue;
pub mod sample_accumulator;
pub mod transform_generator;

pub use analyzer::{create_analyzer_channels, AnalyzerInput};
pub use sample_accumulator::{AudioBlock, Channel};
