use std::io::Write;

use crate::segment_encoder::SegmentEncoder;
use crate::segments::Segment;
use crate::{Error, Result};

/// A `SegmentEncoder` that writes segments as SubRip (SRT) cues.
///
/// Design:
/// - We stream output directly to a `Write` implementation.
/// - SRT has no file header, so there is nothing to write lazily; an empty
///   run produces an empty file, which players accept.
pub struct SrtEncoder<W: Write> {
    /// The underlying writer we stream SRT into.
    w: W,

    /// 1-based index of the next cue.
    next_index: u64,

    /// Whether the encoder has been closed.
    closed: bool,
}

impl<W: Write> SrtEncoder<W> {
    /// Create a new SRT encoder that writes to the provided writer.
    pub fn new(w: W) -> Self {
        Self {
            w,
            next_index: 1,
            closed: false,
        }
    }
}

impl<W: Write> SegmentEncoder for SrtEncoder<W> {
    /// Write a single numbered cue in SRT format.
    fn write_segment(&mut self, seg: &Segment) -> Result<()> {
        if self.closed {
            return Err(Error::msg("cannot write segment: encoder is already closed"));
        }

        // SRT timestamps use `HH:MM:SS,mmm` with a comma decimal marker.
        let start = format_timestamp_srt(seg.start_seconds);
        let end = format_timestamp_srt(seg.end_seconds);

        writeln!(&mut self.w, "{}", self.next_index)?;
        writeln!(&mut self.w, "{start} --> {end}")?;
        writeln!(&mut self.w, "{}", sanitize_cue_text(&seg.text))?;

        // Blank line separates cues.
        writeln!(&mut self.w)?;

        // Flush so streaming consumers see output promptly.
        self.w.flush()?;

        self.next_index += 1;
        Ok(())
    }

    /// Flush the underlying writer. This is idempotent.
    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        self.w.flush()?;
        self.closed = true;

        Ok(())
    }
}

/// Clean up engine text for use as SRT cue text.
///
/// A literal `-->` inside the text would read as a timing line to strict
/// parsers, so it is rewritten to `->`.
fn sanitize_cue_text(text: &str) -> String {
    text.trim().replace("-->", "->")
}

/// Format seconds into an SRT timestamp (`HH:MM:SS,mmm`).
///
/// Rounding policy:
/// - We round to the nearest millisecond to reduce drift when converting from `f32`.
fn format_timestamp_srt(seconds: f32) -> String {
    let total_ms = (seconds * 1000.0).round() as u64;

    let ms = total_ms % 1000;
    let total_s = total_ms / 1000;

    let s = total_s % 60;
    let total_m = total_s / 60;

    let m = total_m % 60;
    let h = total_m / 60;

    format!("{h:02}:{m:02}:{s:02},{ms:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start: f32, end: f32, text: &str) -> Segment {
        Segment {
            start_seconds: start,
            end_seconds: end,
            text: text.to_string(),
            language_code: "en".to_string(),
        }
    }

    #[test]
    fn srt_close_without_segments_emits_nothing() -> anyhow::Result<()> {
        let mut out = Vec::new();
        let mut enc = SrtEncoder::new(&mut out);
        enc.close()?;
        assert_eq!(std::str::from_utf8(&out)?, "");
        Ok(())
    }

    #[test]
    fn srt_numbers_cues_from_one() -> anyhow::Result<()> {
        let mut out = Vec::new();
        let mut enc = SrtEncoder::new(&mut out);

        enc.write_segment(&seg(0.0, 1.2345, "hello"))?;
        enc.write_segment(&seg(61.2, 62.0, "world"))?;
        enc.close()?;

        let s = std::str::from_utf8(&out)?;
        assert!(s.starts_with("1\n00:00:00,000 --> 00:00:01,235\nhello\n\n"));
        assert!(s.contains("2\n00:01:01,200 --> 00:01:02,000\nworld\n\n"));
        Ok(())
    }

    #[test]
    fn srt_trims_and_defuses_timing_arrows_in_text() -> anyhow::Result<()> {
        let mut out = Vec::new();
        let mut enc = SrtEncoder::new(&mut out);

        enc.write_segment(&seg(0.0, 1.0, " a --> b "))?;
        enc.close()?;

        let s = std::str::from_utf8(&out)?;
        assert!(s.contains("\na -> b\n"));
        // The only remaining `-->` is the timing line itself.
        assert_eq!(s.matches("-->").count(), 1);
        Ok(())
    }

    #[test]
    fn srt_format_timestamp_rounds_to_nearest_millisecond() {
        assert_eq!(format_timestamp_srt(0.0004), "00:00:00,000");
        assert_eq!(format_timestamp_srt(0.0005), "00:00:00,001");
        assert_eq!(format_timestamp_srt(1.9995), "00:00:02,000");
        assert_eq!(format_timestamp_srt(3661.5), "01:01:01,500");
    }

    #[test]
    fn srt_write_after_close_errors() -> anyhow::Result<()> {
        let mut out = Vec::new();
        let mut enc = SrtEncoder::new(&mut out);
        enc.close()?;
        let err = enc.write_segment(&seg(0.0, 1.0, "nope")).unwrap_err();
        assert!(err.to_string().contains("already closed"));
        Ok(())
    }
}
