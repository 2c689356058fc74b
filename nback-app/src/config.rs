use anyhow::{Context, Result};
use log::info;
use nback_cortex::{CortexConfig, RecordingSettings};
use nback_task::TaskConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything one session needs, loadable from a JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub task: TaskConfig,
    pub cortex: CortexConfig,
    pub recording: RecordingSettings,
}

impl AppConfig {
    /// Reads `path` if it exists; otherwise the built-in defaults apply.
    /// Credentials from the environment win either way.
    pub fn load(path: &Path) -> Result<Self> {
        let config: AppConfig = if path.exists() {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        } else {
            info!("no config at {}, using defaults", path.display());
            Self::default()
        };
        let AppConfig {
            task,
            cortex,
            recording,
        } = config;
        Ok(AppConfig {
            task,
            cortex: cortex.with_env_overrides(),
            recording,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_missing_file_yields_the_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config.task.countdown_s, 5);
        assert_eq!(config.recording.title, "trial");
    }

    #[test]
    fn partial_files_override_only_their_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nback.json");
        std::fs::write(
            &path,
            r#"{"task": {"task_duration_s": 12}, "recording": {"title": "pilot"}}"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.task.task_duration_s, 12);
        assert_eq!(config.task.countdown_s, 5);
        assert_eq!(config.recording.title, "pilot");
        assert_eq!(config.recording.export_version, "V2");
    }

    #[test]
    fn broken_files_surface_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nback.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(AppConfig::load(&path).is_err());
    }
}
