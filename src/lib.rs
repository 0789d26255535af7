//! `scrivener` is a small transcription job server built on top of Whisper.
//!
//! This crate provides:
//! - A task registry and FIFO dispatch queue with consume-once status reads
//! - A single background worker that drains the queue sequentially
//! - Pluggable transcription engines sharing one model context contract
//! - Output encoders that write SRT and JSON artifacts next to the input
//!
//! The library carries every moving part of the server; the HTTP binary is
//! thin glue over [`api::Gateway`], which keeps the whole request surface
//! testable without sockets.

// High-level API (most consumers should start here).
pub mod api;
pub mod scrivener;

// Task bookkeeping, dispatch, and the background worker.
pub mod queue;
pub mod registry;
pub mod task;
pub mod worker;

// Transcription engines.
pub mod engine;
pub mod engines;

// Segment data structures.
pub mod segments;

// Audio decoding.
pub mod wav;

// Output selection and encoder interfaces.
pub mod output;
pub mod segment_encoder;

// Output encoders that serialize segments into various formats.
pub mod json_array_encoder;
pub mod srt_encoder;

// Logging configuration and control.
#[cfg(feature = "logging")]
pub mod logging;

pub mod error;

pub use api::Gateway;
pub use engine::{Engine, EngineKind};
pub use error::{Error, Result};
pub use scrivener::Scrivener;
