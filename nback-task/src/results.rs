use anyhow::{Context, Result};
use nback_core::SessionSummary;
use std::fs::File;
use std::path::Path;

/// Writes the session summary as pretty-printed JSON.
pub fn write_summary(path: &Path, summary: &SessionSummary) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    let file =
        File::create(path).with_context(|| format!("creating result file {}", path.display()))?;
    serde_json::to_writer_pretty(file, summary).context("writing session summary")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nback_core::Presentation;

    fn summary() -> SessionSummary {
        SessionSummary {
            score: 2,
            presentations: 5,
            repeat_opportunities: 3,
            duration_s: 30,
            log: vec![Presentation {
                index: 0,
                stimulus: "dog.png".into(),
                onset_ns: 123,
                repeat: false,
                flagged: false,
                scored: false,
            }],
        }
    }

    #[test]
    fn summaries_round_trip_through_the_result_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results").join("session_results.json");

        write_summary(&path, &summary()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let loaded: SessionSummary = serde_json::from_str(&text).unwrap();
        assert_eq!(loaded.score, 2);
        assert_eq!(loaded.presentations, 5);
        assert_eq!(loaded.log.len(), 1);
        assert_eq!(loaded.log[0].stimulus, "dog.png");
    }
}
