use std::io::Write;

use crate::Result;
use crate::segment_encoder::SegmentEncoder;
use crate::segments::Segment;

/// A `SegmentEncoder` that writes segments as a single JSON array.
///
/// Design:
/// - We stream output directly to a `Write` implementation to avoid
///   buffering all segments in memory.
/// - The opening `[` is written lazily, so an empty run still yields valid
///   JSON (`[]`) and nothing is emitted until there is something to emit.
pub struct JsonArrayEncoder<W: Write> {
    /// The underlying writer we stream JSON into.
    w: W,

    /// How many segments have been written. Zero means the array is not
    /// open yet; anything else means the next element needs a comma first.
    written: usize,

    /// Whether the encoder has been closed.
    /// Once closed, no further writes are allowed.
    closed: bool,
}

impl<W: Write> JsonArrayEncoder<W> {
    /// Create a new JSON array encoder that writes to the given writer.
    pub fn new(w: W) -> Self {
        Self {
            w,
            written: 0,
            closed: false,
        }
    }
}

impl<W: Write> SegmentEncoder for JsonArrayEncoder<W> {
    /// Serialize a single segment and append it to the JSON array.
    fn write_segment(&mut self, seg: &Segment) -> Result<()> {
        if self.closed {
            return Err(crate::Error::msg(
                "cannot write segment: encoder is already closed",
            ));
        }

        if self.written == 0 {
            self.w.write_all(b"[")?;
        } else {
            self.w.write_all(b",")?;
        }

        // Stream the segment directly into the writer as JSON.
        serde_json::to_writer(&mut self.w, seg)?;
        self.written += 1;

        // Flush so streaming consumers see output promptly.
        self.w.flush()?;

        Ok(())
    }

    /// Finalize the JSON array and flush the underlying writer.
    ///
    /// This method is idempotent:
    /// - Calling `close()` multiple times is safe.
    /// - After closing, no further segments may be written.
    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        // Still output a valid JSON array even if no segments were written.
        if self.written == 0 {
            self.w.write_all(b"[")?;
        }
        self.w.write_all(b"]")?;
        self.w.flush()?;

        self.closed = true;
        Ok(())
    }
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
    fn json_array_close_without_segments_emits_empty_array() -> anyhow::Result<()> {
        let mut out = Vec::new();
        let mut enc = JsonArrayEncoder::new(&mut out);
        enc.close()?;
        assert_eq!(std::str::from_utf8(&out)?, "[]");
        Ok(())
    }

    #[test]
    fn json_array_writes_valid_json_incrementally() -> anyhow::Result<()> {
        let mut out = Vec::new();
        let mut enc = JsonArrayEncoder::new(&mut out);

        enc.write_segment(&seg(0.0, 1.0, "hello"))?;
        enc.write_segment(&seg(1.0, 2.5, "world"))?;
        enc.close()?;

        let s = std::str::from_utf8(&out)?;
        let parsed: serde_json::Value = serde_json::from_str(s)?;
        let arr = parsed.as_array().expect("expected JSON array");
        assert_eq!(arr.len(), 2);
        assert_eq!(arr[0]["text"], "hello");
        assert_eq!(arr[0]["start_seconds"], 0.0);
        assert_eq!(arr[1]["text"], "world");
        Ok(())
    }

    #[test]
    fn json_array_close_is_idempotent() -> anyhow::Result<()> {
        let mut out = Vec::new();
        let mut enc = JsonArrayEncoder::new(&mut out);
        enc.close()?;
        enc.close()?;
        assert_eq!(std::str::from_utf8(&out)?, "[]");
        Ok(())
    }

    #[test]
    fn json_array_write_after_close_errors() -> anyhow::Result<()> {
        let mut out = Vec::new();
        let mut enc = JsonArrayEncoder::new(&mut out);
        enc.close()?;
        let err = enc.write_segment(&seg(0.0, 1.0, "nope")).unwrap_err();
        assert!(err.to_string().contains("already closed"));
        Ok(())
    }
}
