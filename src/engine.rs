use std::path::Path;

use anyhow::Result;

use crate::segments::Segment;

/// A speech-to-text engine.
///
/// The worker depends only on this contract; the concrete variant behind it
/// is chosen once at startup. Implementations own their model resources and
/// run from the worker thread while HTTP handlers share the same process.
pub trait Engine: Send + Sync {
    /// Identify the dominant language of the audio at `path`.
    ///
    /// Returns a whisper language code such as `"en"`.
    fn detect_language(&self, path: &Path) -> Result<String>;

    /// Transcribe the audio at `path` into ordered timed segments.
    ///
    /// `language` must be a concrete language code; callers resolve
    /// auto-detection before invoking this.
    fn transcribe(&self, path: &Path, language: &str) -> Result<Vec<Segment>>;
}

/// The engine variants selectable at startup.
///
/// The selection also keys the artifact set written for finished tasks (see
/// [`crate::output::OutputWriter`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum EngineKind {
    /// whisper.cpp segments exactly as emitted.
    Whisper,

    /// Segment boundaries tightened to their usable token timings.
    Aligned,

    /// Segments regrouped into sentence-shaped cues.
    Stable,
}
