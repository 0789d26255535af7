use crate::Result;
use crate::segments::Segment;

/// Streaming sink for transcription segments.
///
/// Encoders receive segments one at a time and must be closed to finalize
/// their output. `close` is idempotent; writing after close is an error.
pub trait SegmentEncoder {
    fn write_segment(&mut self, seg: &Segment) -> Result<()>;
    fn close(&mut self) -> Result<()>;
}
