use crate::client::CortexClient;
use crate::config::CortexConfig;
use crate::error::{CortexError, Result};
use crate::protocol::{warning, ExportOutcome, Headset, RecordingSettings};
use log::{debug, info, warn};
use std::time::Duration;

const WARNING_TIMEOUT: Duration = Duration::from_secs(10);
/// The service needs a moment after closing the session before it will
/// export the record.
const EXPORT_SETTLE: Duration = Duration::from_secs(3);

/// Runs one full recording session against the service:
/// access -> authorize -> headset -> session -> record -> stop -> export.
pub struct Recorder {
    config: CortexConfig,
    settings: RecordingSettings,
    warning_timeout: Duration,
    export_settle: Duration,
}

impl Recorder {
    pub fn new(config: CortexConfig, settings: RecordingSettings) -> Self {
        Self {
            config,
            settings,
            warning_timeout: WARNING_TIMEOUT,
            export_settle: EXPORT_SETTLE,
        }
    }

    pub fn with_timing(mut self, warning_timeout: Duration, export_settle: Duration) -> Self {
        self.warning_timeout = warning_timeout;
        self.export_settle = export_settle;
        self
    }

    pub async fn run(&self, duration: Duration) -> Result<ExportOutcome> {
        self.config.validate()?;
        info!(
            "recording '{}' for {:.0} s",
            self.settings.title,
            duration.as_secs_f64()
        );

        let mut client = CortexClient::connect(&self.config).await?;

        if !client
            .request_access(&self.config.client_id, &self.config.client_secret)
            .await?
        {
            return Err(CortexError::AccessDenied);
        }
        let token = client
            .authorize(&self.config.client_id, &self.config.client_secret, self.config.debit)
            .await?;
        debug!("authorized");

        let headsets = client.query_headsets().await?;
        let headset = self.pick_headset(&headsets)?.clone();
        info!("using headset {}", headset.id);

        if !headset.is_connected() {
            client.connect_headset(&headset.id).await?;
            client
                .wait_for_warning(warning::HEADSET_CONNECTED, self.warning_timeout)
                .await?;
        }

        let session = client.create_session(&token, &headset.id).await?;
        info!("session {}", session.id);

        let record = client
            .create_record(&token, &session.id, &self.settings)
            .await?;
        info!(
            "recording started: {} ({}) at {}",
            record.title, record.uuid, record.start_datetime
        );

        self.wait(duration).await;

        let stopped = client.stop_record(&token, &session.id).await?;
        info!(
            "recording stopped: {} ({} -> {})",
            stopped.uuid,
            stopped.start_datetime,
            stopped.end_datetime.as_deref().unwrap_or("?")
        );

        // The service only releases the record for export once the headset
        // is disconnected and all subscriptions have stopped.
        client.disconnect_headset(&headset.id).await?;
        match client
            .wait_for_warning(warning::CORTEX_STOP_ALL_SUB, self.warning_timeout)
            .await
        {
            Ok(()) => {}
            Err(CortexError::WarningTimeout(_)) => {
                warn!("service did not confirm subscription stop, exporting anyway");
            }
            Err(e) => return Err(e),
        }
        tokio::time::sleep(self.export_settle).await;

        let outcome = client
            .export_record(&token, &[stopped.uuid.clone()], &self.settings)
            .await?;
        info!(
            "export finished: {} succeeded, {} failed",
            outcome.success.len(),
            outcome.failure.len()
        );

        client.close().await?;
        Ok(outcome)
    }

    fn pick_headset<'a>(&self, headsets: &'a [Headset]) -> Result<&'a Headset> {
        if self.config.headset_id.is_empty() {
            headsets.first().ok_or(CortexError::NoHeadset)
        } else {
            headsets
                .iter()
                .find(|h| h.id == self.config.headset_id)
                .ok_or(CortexError::NoHeadset)
        }
    }

    async fn wait(&self, duration: Duration) {
        let seconds = duration.as_secs();
        for elapsed in 1..=seconds {
            tokio::time::sleep(Duration::from_secs(1)).await;
            debug!("recording at {} s", elapsed);
        }
        let remainder = duration - Duration::from_secs(seconds);
        if !remainder.is_zero() {
            tokio::time::sleep(remainder).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headset(id: &str) -> Headset {
        Headset {
            id: id.into(),
            status: "discovered".into(),
            connected_by: None,
        }
    }

    fn recorder_for(headset_id: &str) -> Recorder {
        let config = CortexConfig {
            headset_id: headset_id.into(),
            ..Default::default()
        };
        Recorder::new(config, RecordingSettings::default())
    }

    #[test]
    fn the_first_headset_wins_when_none_is_wanted() {
        let recorder = recorder_for("");
        let headsets = [headset("EPOCX-1"), headset("EPOCX-2")];
        assert_eq!(recorder.pick_headset(&headsets).unwrap().id, "EPOCX-1");
    }

    #[test]
    fn a_wanted_headset_is_matched_by_id() {
        let recorder = recorder_for("EPOCX-2");
        let headsets = [headset("EPOCX-1"), headset("EPOCX-2")];
        assert_eq!(recorder.pick_headset(&headsets).unwrap().id, "EPOCX-2");
    }

    #[test]
    fn missing_headsets_are_an_error() {
        let recorder = recorder_for("");
        assert!(matches!(
            recorder.pick_headset(&[]),
            Err(CortexError::NoHeadset)
        ));

        let recorder = recorder_for("EPOCX-9");
        assert!(matches!(
            recorder.pick_headset(&[headset("EPOCX-1")]),
            Err(CortexError::NoHeadset)
        ));
    }
}
