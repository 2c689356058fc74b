use log::{error, info};
use nback_cortex::{CortexConfig, Recorder, RecordingSettings};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Runs the whole recording sequence on its own thread so the presentation
/// loop never blocks on the service.
pub fn spawn_recording(
    config: CortexConfig,
    settings: RecordingSettings,
    duration: Duration,
) -> JoinHandle<()> {
    thread::Builder::new()
        .name("cortex-recorder".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(e) => {
                    error!("recording runtime failed to start: {}", e);
                    return;
                }
            };
            match runtime.block_on(Recorder::new(config, settings).run(duration)) {
                Ok(outcome) => info!("recording exported: {} record(s)", outcome.success.len()),
                Err(e) => error!("recording failed: {}", e),
            }
        })
        .expect("spawning recorder thread")
}
