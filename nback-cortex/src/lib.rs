//! Client for an Emotiv Cortex-style EEG recording service.
//!
//! The service speaks JSON-RPC 2.0 over a local WebSocket. [`CortexClient`]
//! owns the socket and matches responses to requests; [`Recorder`] runs the
//! full session sequence: access, authorize, headset, session, record,
//! stop, disconnect, export.

pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod recorder;

pub use client::{CortexClient, CortexEvent};
pub use config::CortexConfig;
pub use error::{CortexError, Result};
pub use protocol::{ExportFormat, ExportOutcome, Headset, RecordingSettings};
pub use recorder::Recorder;
