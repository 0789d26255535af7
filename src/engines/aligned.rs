use std::path::Path;

use anyhow::{Context, Result};
use whisper_rs::{WhisperContext, WhisperSegment};

use crate::engine::Engine;
use crate::segments::{Segment, centiseconds_to_seconds};
use crate::wav::get_samples_from_wav;

/// Engine variant that tightens segment boundaries using token timings.
///
/// whisper's segment-level timestamps often include leading and trailing
/// silence; the usable token timings inside a segment give a tighter span.
/// Segments whose tokens carry no usable timing keep their original bounds.
pub struct AlignedEngine {
    ctx: WhisperContext,
}

impl AlignedEngine {
    pub fn new(ctx: WhisperContext) -> Self {
        Self { ctx }
    }
}

impl Engine for AlignedEngine {
    fn detect_language(&self, path: &Path) -> Result<String> {
        super::detect_language_from_file(&self.ctx, path)
    }

    fn transcribe(&self, path: &Path, language: &str) -> Result<Vec<Segment>> {
        let (samples, _spec) = get_samples_from_wav(path)?;
        let state = super::run_full(
            &self.ctx,
            super::transcription_params(language, true),
            &samples,
        )?;

        let mut segments = Vec::new();
        for whisper_segment in state.as_iter() {
            let text = whisper_segment
                .to_str()
                .context("failed to get segment text")?
                .to_owned();

            let fallback = (
                centiseconds_to_seconds(whisper_segment.start_timestamp()),
                centiseconds_to_seconds(whisper_segment.end_timestamp()),
            );
            let timings = token_timings(&whisper_segment)?;
            let (start_seconds, end_seconds) = tightened_span(fallback, &timings);

            segments.push(Segment {
                start_seconds,
                end_seconds,
                text,
                language_code: language.to_owned(),
            });
        }

        Ok(segments)
    }
}

/// Per-token timing extracted from a whisper segment.
struct TokenTiming {
    text: String,
    start_seconds: f32,
    end_seconds: f32,
}

fn token_timings(segment: &WhisperSegment) -> Result<Vec<TokenTiming>> {
    let token_count = segment.n_tokens();
    let token_count = usize::try_from(token_count)
        .with_context(|| format!("segment reported negative token count: {token_count}"))?;

    let mut timings = Vec::with_capacity(token_count);
    for token_idx in 0..token_count {
        let token = segment
            .get_token(token_idx as i32)
            .context("failed to get token from segment")?;

        let data = token.token_data();
        let text = token
            .to_str()
            .with_context(|| format!("failed to get token text at index {token_idx}"))?
            .to_owned();

        timings.push(TokenTiming {
            text,
            start_seconds: centiseconds_to_seconds(data.t0),
            end_seconds: centiseconds_to_seconds(data.t1),
        });
    }

    Ok(timings)
}

/// Tighten a segment's span to the extent of its usable token timings.
///
/// Whisper special/control tokens (formatted like `[_BEG_]`, `[_TT_50]`) and
/// tokens with unknown timestamps (-1, clamped to 0) are skipped. When no
/// usable timing remains, the fallback span is returned unchanged.
fn tightened_span(fallback: (f32, f32), timings: &[TokenTiming]) -> (f32, f32) {
    let mut min_start: Option<f32> = None;
    let mut max_end: Option<f32> = None;

    for timing in timings {
        if timing.text.starts_with("[_") && timing.text.ends_with("_]") {
            continue;
        }
        if timing.start_seconds <= 0.0 && timing.end_seconds <= 0.0 {
            continue;
        }

        min_start = Some(min_start.map_or(timing.start_seconds, |v| v.min(timing.start_seconds)));
        max_end = Some(max_end.map_or(timing.end_seconds, |v| v.max(timing.end_seconds)));
    }

    match (min_start, max_end) {
        (Some(start), Some(end)) if end >= start => (start, end),
        _ => fallback,
    }
}
