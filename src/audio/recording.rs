use anyhow::{Context, Result};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::audio::SAMPLE_RATE;

/// Write the complete audio of a finalized call to a WAV file.
///
/// Returns `Ok(None)` when the call never produced audio. Failures here
/// are reported to the caller, which logs and proceeds with finalization;
/// losing the recording must not lose the record.
pub fn write_call_recording(
    dir: impl AsRef<Path>,
    call_id: &str,
    pcm: &[u8],
) -> Result<Option<PathBuf>> {
    if pcm.is_empty() {
        return Ok(None);
    }

    let dir = dir.as_ref();
    fs::create_dir_all(dir).context("Failed to create recordings directory")?;

    let filename = format!(
        "call_{}_{}.wav",
        call_id,
        Utc::now().format("%Y%m%d_%H%M%S")
    );
    let path = dir.join(filename);

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(&path, spec)
        .with_context(|| format!("Failed to create WAV file: {:?}", path))?;

    for bytes in pcm.chunks_exact(2) {
        let sample = i16::from_le_bytes([bytes[0], bytes[1]]);
        writer
            .write_sample(sample)
            .context("Failed to write sample to WAV")?;
    }

    writer.finalize().context("Failed to finalize WAV file")?;

    info!("Saved call recording: {}", path.display());

    Ok(Some(path))
}
