pub mod config;
pub mod error;
pub mod event;
pub mod model;

pub use error::{IngestError, Result};
