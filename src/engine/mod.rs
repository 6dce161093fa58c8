pub mod context;
pub mod pipeline;
pub mod task;

pub use pipeline::{ImportOrchestrator, ImportPhase};
