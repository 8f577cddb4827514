// file: src/models/mod.rs
// description: data model exports

pub mod job;
pub mod record;
pub mod wire;

pub use job::{Job, JobKind, JobState, Progress};
pub use record::{BatchSummary, Person, RecordResult, RecordStatus};
pub use wire::{
    BatchRecord, BatchResponse, OcrItem, OcrResponse, RemoteTaskStatus, StreamEvent, TaskTicket,
};
