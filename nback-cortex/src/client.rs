use crate::config::CortexConfig;
use crate::error::{CortexError, Result};
use crate::protocol::{
    method, AccessResult, AuthorizeResult, ExportOutcome, Headset, RecordEnvelope, RecordInfo,
    RecordingSettings, RpcRequest, RpcResponse, SessionInfo, WarningEnvelope,
};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{
    connect_async, connect_async_tls_with_config, Connector, MaybeTlsStream, WebSocketStream,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<RpcResponse>>>>;

/// Out-of-band notification pushed by the service.
#[derive(Debug, Clone)]
pub enum CortexEvent {
    Warning { code: u64, message: String },
}

/// Owns the WebSocket to the service. A background task routes responses to
/// their callers by request id and forwards warnings to an event channel.
pub struct CortexClient {
    sink: SplitSink<WsStream, Message>,
    pending: Pending,
    events: mpsc::UnboundedReceiver<CortexEvent>,
    reader: JoinHandle<()>,
    next_id: u64,
}

impl CortexClient {
    /// Opens the socket and starts the read loop. `wss` URLs accept the
    /// self-signed certificate the local service presents.
    pub async fn connect(config: &CortexConfig) -> Result<Self> {
        let request = config.url.as_str().into_client_request()?;
        let (stream, _) = if config.url.starts_with("wss") {
            let tls = native_tls::TlsConnector::builder()
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true)
                .build()?;
            connect_async_tls_with_config(request, None, false, Some(Connector::NativeTls(tls)))
                .await?
        } else {
            connect_async(request).await?
        };
        info!("[cortex] connected to {}", config.url);

        let (sink, source) = stream.split();
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let (event_tx, events) = mpsc::unbounded_channel();
        let reader = tokio::spawn(Self::read_loop(source, pending.clone(), event_tx));

        Ok(Self {
            sink,
            pending,
            events,
            reader,
            next_id: 0,
        })
    }

    async fn read_loop(
        mut source: SplitStream<WsStream>,
        pending: Pending,
        events: mpsc::UnboundedSender<CortexEvent>,
    ) {
        while let Some(message) = source.next().await {
            match message {
                Ok(Message::Text(text)) => Self::dispatch(&text, &pending, &events),
                Ok(Message::Close(_)) => {
                    debug!("[cortex] service closed the connection");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("[cortex] read error: {}", e);
                    break;
                }
            }
        }
        // Dropping the pending senders fails any in-flight calls.
        pending.lock().unwrap().clear();
    }

    fn dispatch(text: &str, pending: &Pending, events: &mpsc::UnboundedSender<CortexEvent>) {
        if let Ok(envelope) = serde_json::from_str::<WarningEnvelope>(text) {
            let message = match &envelope.warning.message {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            debug!("[cortex] warning {}: {}", envelope.warning.code, message);
            let _ = events.send(CortexEvent::Warning {
                code: envelope.warning.code,
                message,
            });
            return;
        }
        match serde_json::from_str::<RpcResponse>(text) {
            Ok(response) => {
                let Some(id) = response.id else {
                    debug!("[cortex] response without id dropped");
                    return;
                };
                match pending.lock().unwrap().remove(&id) {
                    Some(tx) => {
                        let _ = tx.send(response);
                    }
                    None => debug!("[cortex] response for unknown request {} dropped", id),
                }
            }
            Err(e) => debug!("[cortex] unparseable message dropped: {}", e),
        }
    }

    /// Sends one JSON-RPC request and waits for its response.
    pub async fn call(&mut self, method: &str, params: Value) -> Result<Value> {
        self.next_id += 1;
        let id = self.next_id;
        let payload = serde_json::to_string(&RpcRequest::new(id, method, params))?;

        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().insert(id, tx);
        debug!("[cortex] -> {} (id {})", method, id);
        if let Err(e) = self.sink.send(Message::Text(payload)).await {
            self.pending.lock().unwrap().remove(&id);
            return Err(e.into());
        }

        let response = rx.await.map_err(|_| CortexError::ConnectionClosed)?;
        if let Some(error) = response.error {
            return Err(CortexError::Api {
                code: error.code,
                message: error.message,
            });
        }
        response
            .result
            .ok_or_else(|| CortexError::UnexpectedResponse(method.to_string()))
    }

    pub async fn request_access(&mut self, client_id: &str, client_secret: &str) -> Result<bool> {
        let result = self
            .call(
                method::REQUEST_ACCESS,
                json!({ "clientId": client_id, "clientSecret": client_secret }),
            )
            .await?;
        let access: AccessResult = serde_json::from_value(result)?;
        if !access.access_granted {
            info!("[cortex] access pending approval: {}", access.message);
        }
        Ok(access.access_granted)
    }

    pub async fn authorize(
        &mut self,
        client_id: &str,
        client_secret: &str,
        debit: u32,
    ) -> Result<String> {
        let result = self
            .call(
                method::AUTHORIZE,
                json!({ "clientId": client_id, "clientSecret": client_secret, "debit": debit }),
            )
            .await?;
        let authorized: AuthorizeResult = serde_json::from_value(result)?;
        Ok(authorized.cortex_token)
    }

    pub async fn query_headsets(&mut self) -> Result<Vec<Headset>> {
        let result = self.call(method::QUERY_HEADSETS, json!({})).await?;
        Ok(serde_json::from_value(result)?)
    }

    pub async fn connect_headset(&mut self, headset_id: &str) -> Result<()> {
        self.call(
            method::CONTROL_DEVICE,
            json!({ "command": "connect", "headset": headset_id }),
        )
        .await?;
        Ok(())
    }

    pub async fn disconnect_headset(&mut self, headset_id: &str) -> Result<()> {
        self.call(
            method::CONTROL_DEVICE,
            json!({ "command": "disconnect", "headset": headset_id }),
        )
        .await?;
        Ok(())
    }

    pub async fn create_session(&mut self, token: &str, headset_id: &str) -> Result<SessionInfo> {
        let result = self
            .call(
                method::CREATE_SESSION,
                json!({ "cortexToken": token, "headset": headset_id, "status": "active" }),
            )
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    pub async fn create_record(
        &mut self,
        token: &str,
        session_id: &str,
        settings: &RecordingSettings,
    ) -> Result<RecordInfo> {
        let result = self
            .call(
                method::CREATE_RECORD,
                json!({
                    "cortexToken": token,
                    "session": session_id,
                    "title": settings.title,
                    "description": settings.description,
                }),
            )
            .await?;
        let envelope: RecordEnvelope = serde_json::from_value(result)?;
        Ok(envelope.record)
    }

    pub async fn stop_record(&mut self, token: &str, session_id: &str) -> Result<RecordInfo> {
        let result = self
            .call(
                method::STOP_RECORD,
                json!({ "cortexToken": token, "session": session_id }),
            )
            .await?;
        let envelope: RecordEnvelope = serde_json::from_value(result)?;
        Ok(envelope.record)
    }

    pub async fn export_record(
        &mut self,
        token: &str,
        record_ids: &[String],
        settings: &RecordingSettings,
    ) -> Result<ExportOutcome> {
        let result = self
            .call(
                method::EXPORT_RECORD,
                json!({
                    "cortexToken": token,
                    "recordIds": record_ids,
                    "folder": settings.export_folder,
                    "format": settings.export_format.as_str(),
                    "streamTypes": settings.stream_types,
                    "version": settings.export_version,
                }),
            )
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Waits for a warning with the given code; other warnings are skipped.
    pub async fn wait_for_warning(&mut self, code: u64, timeout: Duration) -> Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let event = tokio::time::timeout_at(deadline, self.events.recv())
                .await
                .map_err(|_| CortexError::WarningTimeout(code))?;
            match event {
                Some(CortexEvent::Warning {
                    code: received, ..
                }) if received == code => return Ok(()),
                Some(CortexEvent::Warning { code: received, message }) => {
                    debug!(
                        "[cortex] ignoring warning {} ({}) while waiting for {}",
                        received, message, code
                    );
                }
                None => return Err(CortexError::ConnectionClosed),
            }
        }
    }

    /// Closes the socket and stops the read loop.
    pub async fn close(mut self) -> Result<()> {
        let _ = self.sink.send(Message::Close(None)).await;
        self.reader.abort();
        info!("[cortex] disconnected");
        Ok(())
    }
}

impl Drop for CortexClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}
