// file: src/tracker/mod.rs
// description: brings an in-flight job to a terminal state (poll and stream modes)

pub mod cancel;
pub mod poller;
pub mod sse;

pub use cancel::{cancel_pair, CancelHandle, CancelToken};
pub use poller::StatusPoller;
pub use sse::{SseDecoder, StreamEnd, StreamReader};
