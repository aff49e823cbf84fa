use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::audio::{SampleBank, SampleBuffer, SampleId};

// Decode a WAV from disk and hand it to the bank. Runs on the caller's thread,
// never on the audio thread.
pub fn load_into_bank(bank: &SampleBank, path: &Path, target_rate: u32) -> anyhow::Result<SampleId> {
    let buffer = SampleBuffer::load_wav(path, target_rate)?;
    if buffer.is_empty() {
        anyhow::bail!("{} contains no audio", path.display());
    }
    let id = bank.register(buffer);
    tracing::debug!(path = %path.display(), ?id, "sample loaded");
    Ok(id)
}

// All .wav files directly inside `dir`, sorted by name
pub fn index_wav_in_dir(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read {}", dir.display()))?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
        })
        .collect();
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, frames: usize) {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 48000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..frames {
            writer.write_sample(i as f32 / frames as f32).unwrap();
            writer.write_sample(0.0f32).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn indexes_only_wav_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(&dir.path().join("b_snare.wav"), 4);
        write_wav(&dir.path().join("a_kick.WAV"), 4);
        std::fs::write(dir.path().join("notes.txt"), "hi").unwrap();

        let found = index_wav_in_dir(dir.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a_kick.WAV", "b_snare.wav"]);
    }

    #[test]
    fn loads_and_registers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kick.wav");
        write_wav(&path, 480);

        let bank = SampleBank::new();
        let id = load_into_bank(&bank, &path, 48000).unwrap();
        let buf = bank.get(id, false).unwrap();
        assert_eq!(buf.len(), 480);
        assert_eq!(buf.data[0].right, 0.0);
    }

    #[test]
    fn empty_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("silence.wav");
        write_wav(&path, 0);
        let bank = SampleBank::new();
        assert!(load_into_bank(&bank, &path, 48000).is_err());
        assert!(bank.is_empty());
    }
}
