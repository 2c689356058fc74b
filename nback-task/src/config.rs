use nback_core::{EmptyStimulusSet, StimulusSet};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Presentation-side parameters for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    /// Seconds counted down on screen before the trial starts.
    pub countdown_s: u32,
    /// How long each stimulus stays up before the next one replaces it.
    pub stimulus_interval_ms: u64,
    /// Length of the trial; also the recording duration.
    pub task_duration_s: u64,
    /// Recency window: 3 entries give the 2-back task.
    pub nback_window: usize,
    pub images: Vec<String>,
    pub image_dir: PathBuf,
    pub results_path: PathBuf,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            countdown_s: 5,
            stimulus_interval_ms: 1000,
            task_duration_s: 30,
            nback_window: 3,
            images: vec!["dog.png".into(), "cat.png".into(), "bird.png".into()],
            image_dir: PathBuf::from("assets/images"),
            results_path: PathBuf::from("session_results.json"),
        }
    }
}

impl TaskConfig {
    pub fn stimulus_set(&self) -> Result<StimulusSet, EmptyStimulusSet> {
        StimulusSet::new(self.image_dir.clone(), self.images.clone())
    }

    pub fn task_duration(&self) -> Duration {
        Duration::from_secs(self.task_duration_s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_standard_session() {
        let config = TaskConfig::default();
        assert_eq!(config.countdown_s, 5);
        assert_eq!(config.stimulus_interval_ms, 1000);
        assert_eq!(config.task_duration_s, 30);
        assert_eq!(config.images.len(), 3);
        assert_eq!(config.task_duration(), Duration::from_secs(30));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: TaskConfig = serde_json::from_str(r#"{"task_duration_s": 12}"#).unwrap();
        assert_eq!(config.task_duration_s, 12);
        assert_eq!(config.countdown_s, 5);
        assert_eq!(config.nback_window, 3);
    }

    #[test]
    fn stimulus_set_reflects_the_image_list() {
        let set = TaskConfig::default().stimulus_set().unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.name(0), Some("dog.png"));
    }
}
