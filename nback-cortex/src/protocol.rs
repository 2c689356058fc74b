use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC methods the recording sequence uses.
pub mod method {
    pub const REQUEST_ACCESS: &str = "requestAccess";
    pub const AUTHORIZE: &str = "authorize";
    pub const QUERY_HEADSETS: &str = "queryHeadsets";
    pub const CONTROL_DEVICE: &str = "controlDevice";
    pub const CREATE_SESSION: &str = "createSession";
    pub const CREATE_RECORD: &str = "createRecord";
    pub const STOP_RECORD: &str = "stopRecord";
    pub const EXPORT_RECORD: &str = "exportRecord";
}

/// Warning codes the service pushes outside the request/response flow.
pub mod warning {
    pub const ACCESS_RIGHT_GRANTED: u64 = 9;
    pub const ACCESS_RIGHT_REJECTED: u64 = 10;
    pub const HEADSET_CONNECTED: u64 = 104;
    pub const CORTEX_STOP_ALL_SUB: u64 = 142;
    pub const SESSION_CLOSED: u64 = 143;
}

#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: Value,
}

impl<'a> RpcRequest<'a> {
    pub fn new(id: u64, method: &'a str, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method,
            params,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    pub id: Option<u64>,
    pub result: Option<Value>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

/// `{"warning": {"code": ..., "message": ...}}`, pushed without an id.
#[derive(Debug, Deserialize)]
pub struct WarningEnvelope {
    pub warning: WarningBody,
}

#[derive(Debug, Deserialize)]
pub struct WarningBody {
    pub code: u64,
    /// A plain string for most codes, an object for some.
    #[serde(default)]
    pub message: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Headset {
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, rename = "connectedBy")]
    pub connected_by: Option<String>,
}

impl Headset {
    pub fn is_connected(&self) -> bool {
        self.status == "connected"
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionInfo {
    pub id: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordInfo {
    pub uuid: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub start_datetime: String,
    #[serde(default)]
    pub end_datetime: Option<String>,
}

/// createRecord/stopRecord wrap the record in an envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct RecordEnvelope {
    pub record: RecordInfo,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccessResult {
    #[serde(rename = "accessGranted")]
    pub access_granted: bool,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthorizeResult {
    #[serde(rename = "cortexToken")]
    pub cortex_token: String,
}

/// exportRecord reports per-record outcomes.
#[derive(Debug, Default, Deserialize)]
pub struct ExportOutcome {
    #[serde(default)]
    pub success: Vec<Value>,
    #[serde(default)]
    pub failure: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    #[serde(rename = "CSV")]
    Csv,
    #[serde(rename = "EDF")]
    Edf,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "CSV",
            ExportFormat::Edf => "EDF",
        }
    }
}

/// What to record and where the service should export it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingSettings {
    pub title: String,
    pub description: String,
    pub export_folder: PathBuf,
    pub export_format: ExportFormat,
    /// Only meaningful for CSV exports.
    pub export_version: String,
    pub stream_types: Vec<String>,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            title: "trial".into(),
            description: String::new(),
            export_folder: PathBuf::from("recordings"),
            export_format: ExportFormat::Csv,
            export_version: "V2".into(),
            stream_types: vec!["EEG".into()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn requests_serialize_to_the_wire_shape() {
        let request = RpcRequest::new(3, method::AUTHORIZE, json!({"clientId": "abc"}));
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "jsonrpc": "2.0",
                "id": 3,
                "method": "authorize",
                "params": {"clientId": "abc"}
            })
        );
    }

    #[test]
    fn responses_carry_either_result_or_error() {
        let ok: RpcResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"result":{"cortexToken":"t"}}"#)
                .unwrap();
        assert_eq!(ok.id, Some(1));
        assert!(ok.result.is_some() && ok.error.is_none());

        let err: RpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":2,"error":{"code":-32001,"message":"invalid token"}}"#,
        )
        .unwrap();
        let error = err.error.unwrap();
        assert_eq!(error.code, -32001);
        assert_eq!(error.message, "invalid token");
    }

    #[test]
    fn warnings_parse_with_string_or_object_messages() {
        let plain: WarningEnvelope =
            serde_json::from_str(r#"{"warning":{"code":142,"message":"All subscriptions stopped"}}"#)
                .unwrap();
        assert_eq!(plain.warning.code, warning::CORTEX_STOP_ALL_SUB);

        let object: WarningEnvelope = serde_json::from_str(
            r#"{"warning":{"code":104,"message":{"headsetId":"EPOCX-1234","behavior":"connected"}}}"#,
        )
        .unwrap();
        assert_eq!(object.warning.code, warning::HEADSET_CONNECTED);
        assert!(object.warning.message.is_object());
    }

    #[test]
    fn headset_lists_parse_with_missing_fields() {
        let headsets: Vec<Headset> = serde_json::from_str(
            r#"[{"id":"EPOCX-1234","status":"connected"},{"id":"INSIGHT-9"}]"#,
        )
        .unwrap();
        assert_eq!(headsets.len(), 2);
        assert!(headsets[0].is_connected());
        assert!(!headsets[1].is_connected());
    }

    #[test]
    fn record_envelopes_unwrap_to_the_record() {
        let envelope: RecordEnvelope = serde_json::from_str(
            r#"{"record":{"uuid":"u-1","title":"trial","startDatetime":"2026-01-01T10:00:00.000+00:00"}}"#,
        )
        .unwrap();
        assert_eq!(envelope.record.uuid, "u-1");
        assert_eq!(envelope.record.start_datetime, "2026-01-01T10:00:00.000+00:00");
        assert_eq!(envelope.record.end_datetime, None);
    }

    #[test]
    fn export_outcomes_default_their_lists() {
        let outcome: ExportOutcome =
            serde_json::from_str(r#"{"success":[{"recordId":"u-1"}]}"#).unwrap();
        assert_eq!(outcome.success.len(), 1);
        assert!(outcome.failure.is_empty());
    }

    #[test]
    fn recording_settings_default_to_the_csv_eeg_export() {
        let settings = RecordingSettings::default();
        assert_eq!(settings.title, "trial");
        assert_eq!(settings.export_format, ExportFormat::Csv);
        assert_eq!(settings.export_format.as_str(), "CSV");
        assert_eq!(settings.export_version, "V2");
        assert_eq!(settings.stream_types, vec!["EEG".to_string()]);
    }
}
