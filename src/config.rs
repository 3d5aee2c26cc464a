use std::path::PathBuf;

/// Everything a running server needs, passed explicitly into the router and
/// from there into each connection. There is no ambient server state.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the listener binds to, e.g. `127.0.0.1:9000`.
    pub bind_addr: String,
    /// Directory static resources are resolved under. Requests escaping it
    /// are rejected.
    pub document_root: PathBuf,
    /// File served for `GET /`.
    pub index_file: PathBuf,
    pub websocket: WebSocketConfig,
}

impl ServerConfig {
    pub fn new(
        bind_addr: impl Into<String>,
        document_root: impl Into<PathBuf>,
        index_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            bind_addr: bind_addr.into(),
            document_root: document_root.into(),
            index_file: index_file.into(),
            websocket: WebSocketConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WebSocketConfig {
    /// Upper bound for a single frame's declared payload length. Frames above
    /// it are rejected before the payload is read.
    pub max_payload_size: Option<usize>,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        WebSocketConfig {
            max_payload_size: Some(16 << 20),
        }
    }
}
