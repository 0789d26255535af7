use serde::Serialize;

/// A single timed span of transcribed text.
///
/// Text is carried exactly as the engine emitted it (whisper segments often
/// lead with a space); encoders decide how much cleanup their format needs.
#[derive(Debug, Serialize, Clone)]
pub struct Segment {
    pub start_seconds: f32,
    pub end_seconds: f32,
    pub text: String,
    pub language_code: String,
}

/// Convert whisper's centisecond timestamps to seconds.
///
/// whisper uses -1 for unknown; clamp to 0 so consumers don't see -0.01s.
pub(crate) fn centiseconds_to_seconds(value: i64) -> f32 {
    if value < 0 { 0.0 } else { value as f32 / 100.0 }
}
