use thiserror::Error;

#[derive(Debug, Error)]
pub enum CortexError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("tls setup failed: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("service error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("client id and secret must be configured (CORTEX_CLIENT_ID / CORTEX_CLIENT_SECRET)")]
    MissingCredentials,

    #[error("access rejected; approve this application in the service launcher and retry")]
    AccessDenied,

    #[error("no usable headset found")]
    NoHeadset,

    #[error("unexpected response to {0}")]
    UnexpectedResponse(String),

    #[error("connection closed by the service")]
    ConnectionClosed,

    #[error("timed out waiting for warning {0}")]
    WarningTimeout(u64),
}

pub type Result<T> = std::result::Result<T, CortexError>;
