use std::path::Path;

use anyhow::Result;
use whisper_rs::WhisperContext;

use crate::engine::Engine;
use crate::segments::Segment;
use crate::wav::get_samples_from_wav;

/// The basic engine: whisper.cpp segments exactly as emitted.
pub struct WhisperEngine {
    ctx: WhisperContext,
}

impl WhisperEngine {
    pub fn new(ctx: WhisperContext) -> Self {
        Self { ctx }
    }
}

impl Engine for WhisperEngine {
    fn detect_language(&self, path: &Path) -> Result<String> {
        super::detect_language_from_file(&self.ctx, path)
    }

    fn transcribe(&self, path: &Path, language: &str) -> Result<Vec<Segment>> {
        let (samples, _spec) = get_samples_from_wav(path)?;
        let state = super::run_full(
            &self.ctx,
            super::transcription_params(language, false),
            &samples,
        )?;
        super::collect_segments(&state, language)
    }
}
