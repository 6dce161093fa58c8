pub mod client;
pub mod middleware;
pub mod pacer;

pub use client::Transport;
pub use pacer::{Pacer, RecordingSleeper, Sleeper, TokioSleeper};
