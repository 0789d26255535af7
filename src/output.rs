use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::engine::EngineKind;
use crate::json_array_encoder::JsonArrayEncoder;
use crate::segment_encoder::SegmentEncoder;
use crate::segments::Segment;
use crate::srt_encoder::SrtEncoder;
use crate::{Error, Result};

/// Writes the artifact set for a finished task.
///
/// The set is keyed on the engine variant selected at startup:
/// - `Whisper` writes `<stem>.srt` and `<stem>.json`
/// - `Aligned` and `Stable` write `<stem>.srt`
///
/// Artifacts are derived from the source file's stem and written into the
/// given directory (the worker passes the source file's own directory).
#[derive(Debug, Clone, Copy)]
pub struct OutputWriter {
    kind: EngineKind,
}

impl OutputWriter {
    pub fn new(kind: EngineKind) -> Self {
        Self { kind }
    }

    /// Write all artifacts for `segments`, returning the written paths.
    pub fn write(
        &self,
        segments: &[Segment],
        source: &Path,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        let stem = source
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| {
                Error::msg(format!(
                    "cannot derive an output name from '{}'",
                    source.display()
                ))
            })?;

        let mut written = Vec::new();

        let srt_path = output_dir.join(format!("{stem}.srt"));
        drain(SrtEncoder::new(create(&srt_path)?), segments)?;
        written.push(srt_path);

        if self.kind == EngineKind::Whisper {
            let json_path = output_dir.join(format!("{stem}.json"));
            drain(JsonArrayEncoder::new(create(&json_path)?), segments)?;
            written.push(json_path);
        }

        Ok(written)
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    Ok(BufWriter::new(File::create(path)?))
}

fn drain<E: SegmentEncoder>(mut encoder: E, segments: &[Segment]) -> Result<()> {
    for segment in segments {
        encoder.write_segment(segment)?;
    }
    encoder.close()
}
