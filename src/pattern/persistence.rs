// Pattern and config files, stored as pretty JSON next to the samples.
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::model::Pattern;
use crate::config::SequencerConfig;
use crate::error::ConfigError;

const RINGSEQ_DIR: &str = ".ringseq";
const PATTERN_FILE: &str = "pattern.json";
const CONFIG_FILE: &str = "config.json";

// <project_dir>/.ringseq/pattern.json
pub fn pattern_file_path(project_dir: &Path) -> PathBuf {
    project_dir.join(RINGSEQ_DIR).join(PATTERN_FILE)
}

pub fn config_file_path(project_dir: &Path) -> PathBuf {
    project_dir.join(RINGSEQ_DIR).join(CONFIG_FILE)
}

pub fn load_pattern(path: &Path) -> Result<Pattern, ConfigError> {
    let mut pattern: Pattern = read_json(path)?;
    pattern.sanitize();
    Ok(pattern)
}

pub fn save_pattern(path: &Path, pattern: &Pattern) -> Result<(), ConfigError> {
    write_json(path, pattern)
}

pub fn load_config(path: &Path) -> Result<SequencerConfig, ConfigError> {
    read_json(path)
}

pub fn save_config(path: &Path, config: &SequencerConfig) -> Result<(), ConfigError> {
    write_json(path, config)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

// creates the parent directory if needed
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ConfigError> {
    let json = serde_json::to_string_pretty(value)?;
    let io_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, json).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::model::TrigCondition;

    #[test]
    fn pattern_survives_a_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = pattern_file_path(dir.path());

        let mut pattern = Pattern::default();
        pattern.tracks[1].solo = true;
        pattern.tracks[1].steps[4].active = true;
        pattern.tracks[1].steps[4].condition = Some(TrigCondition::NotFill);
        save_pattern(&path, &pattern).unwrap();

        let loaded = load_pattern(&path).unwrap();
        assert_eq!(loaded, pattern);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&config_file_path(dir.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_config(&path).unwrap_err(), ConfigError::Parse { .. }));
    }
}
