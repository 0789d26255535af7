//! Engine variants and the whisper.cpp plumbing they share.
//!
//! All variants run the same model through the same `FullParams` base; they
//! differ only in how raw whisper segments become the segments handed to the
//! output writer.

mod aligned;
mod logging;
mod stable;
mod whisper;

pub use aligned::AlignedEngine;
pub use stable::StableEngine;
pub use whisper::WhisperEngine;

use std::path::Path;

use anyhow::{Context, Result, anyhow, ensure};
use whisper_rs::{
    FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters, WhisperState,
};

use crate::engine::{Engine, EngineKind};
use crate::segments::{Segment, centiseconds_to_seconds};
use crate::wav::{TARGET_SAMPLE_RATE, get_samples_from_wav};

/// Window whisper evaluates for language detection: 30 seconds of 16kHz audio.
const DETECT_WINDOW_SAMPLES: usize = 30 * TARGET_SAMPLE_RATE as usize;

/// Load the engine variant selected at startup.
///
/// The model is loaded exactly once here; every task executed for the
/// process lifetime reuses the resulting context.
pub fn load(kind: EngineKind, model_path: &str, gpu_device: i32) -> crate::Result<Box<dyn Engine>> {
    let ctx = load_context(model_path, gpu_device)?;
    Ok(match kind {
        EngineKind::Whisper => Box::new(WhisperEngine::new(ctx)),
        EngineKind::Aligned => Box::new(AlignedEngine::new(ctx)),
        EngineKind::Stable => Box::new(StableEngine::new(ctx)),
    })
}

fn load_context(model_path: &str, gpu_device: i32) -> Result<WhisperContext> {
    // We keep whisper logs quiet so the process fully controls its output.
    logging::init_whisper_logging();

    ensure!(!model_path.trim().is_empty(), "model path must be provided");
    let path = Path::new(model_path);
    ensure!(path.is_file(), "model not found at '{model_path}'");

    let mut ctx_params = WhisperContextParameters::default();
    ctx_params.gpu_device(gpu_device);

    WhisperContext::new_with_params(model_path, ctx_params)
        .with_context(|| format!("failed to load model from path: {model_path}"))
}

/// Detect the dominant language of the audio file at `path`.
///
/// whisper evaluates a single 30-second window, so the leading audio is
/// padded or trimmed to exactly that length before the detection pass.
pub(crate) fn detect_language_from_file(ctx: &WhisperContext, path: &Path) -> Result<String> {
    let (mut probe, _spec) = get_samples_from_wav(path)?;
    probe.truncate(DETECT_WINDOW_SAMPLES);
    probe.resize(DETECT_WINDOW_SAMPLES, 0.0);

    let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
    apply_common_params(&mut params);
    params.set_language(None);
    params.set_single_segment(true);

    let state = run_full(ctx, params, &probe)?;
    let lang_id = state.full_lang_id_from_state();
    let code = whisper_rs::get_lang_str(lang_id)
        .ok_or_else(|| anyhow!("whisper reported unknown language id {lang_id}"))?;

    Ok(code.to_owned())
}

/// Build the transcription parameters shared by all engine variants.
pub(crate) fn transcription_params(language: &str, token_timestamps: bool) -> FullParams<'_, '_> {
    let mut params = FullParams::new(SamplingStrategy::BeamSearch {
        beam_size: 5,
        patience: 1.0,
    });

    apply_common_params(&mut params);
    params.set_language(Some(language));
    params.set_token_timestamps(token_timestamps);

    params
}

fn apply_common_params(params: &mut FullParams) {
    params.set_n_threads(num_cpus::get() as i32);
    params.set_translate(false);
    params.set_no_context(true);
    params.set_single_segment(false);

    params.set_print_progress(false);
    params.set_print_special(false);
    params.set_print_realtime(false);
    params.set_print_timestamps(false);
}

pub(crate) fn run_full(
    ctx: &WhisperContext,
    params: FullParams,
    samples: &[f32],
) -> Result<WhisperState> {
    let mut state = ctx
        .create_state()
        .context("failed to create whisper state")?;

    state
        .full(params, samples)
        .context("failed to run whisper full()")?;

    Ok(state)
}

/// Collect whisper's segments as emitted, stamped with the resolved language.
pub(crate) fn collect_segments(state: &WhisperState, language: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    for whisper_segment in state.as_iter() {
        let text = whisper_segment
            .to_str()
            .context("failed to get segment text")?
            .to_owned();

        segments.push(Segment {
            start_seconds: centiseconds_to_seconds(whisper_segment.start_timestamp()),
            end_seconds: centiseconds_to_seconds(whisper_segment.end_timestamp()),
            text,
            language_code: language.to_owned(),
        });
    }

    Ok(segments)
}
