// file: src/pipeline/mod.rs
// description: job orchestration and console progress reporting

pub mod orchestrator;
pub mod progress;

pub use orchestrator::{JobRunner, OcrEngine};
pub use progress::{ConsoleProgress, RunStats};
