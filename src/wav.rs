use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use anyhow::{Context, Result};
use hound::{WavReader, WavSpec};

/// Sample rate whisper.cpp expects.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Load WAV audio from a file path and return normalized audio samples.
pub fn get_samples_from_wav(path: &Path) -> Result<(Vec<f32>, WavSpec)> {
    let file = File::open(path)
        .with_context(|| format!("failed to open audio file '{}'", path.display()))?;
    get_samples_from_wav_reader(BufReader::new(file))
}

/// Load WAV audio from a reader and return normalized audio samples.
///
/// What we return:
/// - A `Vec<f32>` containing mono audio samples normalized to `[-1.0, 1.0]`
/// - The associated `WavSpec` so callers still have access to metadata
///
/// Format requirements: mono, 16-bit PCM, at the target sample rate. Enforcing
/// this here keeps the engines simple and predictable.
pub fn get_samples_from_wav_reader<R>(reader: R) -> Result<(Vec<f32>, WavSpec)>
where
    R: Read + Seek,
{
    let mut reader = WavReader::new(reader).context("failed to read WAV data from reader")?;
    let spec = reader.spec();

    if spec.channels != 1 {
        anyhow::bail!(
            "expected mono WAV (1 channel), got {} channels",
            spec.channels
        );
    }

    if spec.sample_rate != TARGET_SAMPLE_RATE {
        anyhow::bail!(
            "expected {} Hz sample rate, got {} Hz",
            TARGET_SAMPLE_RATE,
            spec.sample_rate
        );
    }

    // Normalize i16 PCM to f32 in [-1.0, 1.0], the format the engines expect.
    let mut samples = Vec::new();
    for sample in reader.samples::<i16>() {
        let pcm = sample?;
        let normalized = pcm as f32 / i16::MAX as f32;
        samples.push(normalized);
    }

    Ok((samples, spec))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn wav_bytes(channels: u16, sample_rate: u32, samples: &[i16]) -> Vec<u8> {
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = hound::WavWriter::new(&mut cursor, spec).expect("write wav header");
        for sample in samples {
            writer.write_sample(*sample).expect("write sample");
        }
        writer.finalize().expect("finalize wav");
        cursor.into_inner()
    }

    #[test]
    fn reads_and_normalizes_mono_16k() -> anyhow::Result<()> {
        let bytes = wav_bytes(1, TARGET_SAMPLE_RATE, &[0, i16::MAX, i16::MIN + 1]);
        let (samples, spec) = get_samples_from_wav_reader(Cursor::new(bytes))?;

        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, TARGET_SAMPLE_RATE);
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0], 0.0);
        assert_eq!(samples[1], 1.0);
        assert!((samples[2] + 1.0).abs() < 1e-4);
        Ok(())
    }

    #[test]
    fn rejects_stereo_input() {
        let bytes = wav_bytes(2, TARGET_SAMPLE_RATE, &[0, 0]);
        let err = get_samples_from_wav_reader(Cursor::new(bytes)).unwrap_err();
        assert!(err.to_string().contains("mono"));
    }

    #[test]
    fn rejects_wrong_sample_rate() {
        let bytes = wav_bytes(1, 44_100, &[0]);
        let err = get_samples_from_wav_reader(Cursor::new(bytes)).unwrap_err();
        assert!(err.to_string().contains("16000 Hz"));
    }

    #[test]
    fn missing_file_reports_the_path() {
        let err = get_samples_from_wav(Path::new("/nonexistent/clip.wav")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/clip.wav"));
    }
}
