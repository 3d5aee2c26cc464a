use std::io;
use thiserror::Error;
use tokio::time::error::Elapsed;

#[derive(Error, Debug)]
pub enum Error {
    // General Errors
    #[error("IO Error happened: {source}")]
    IOError {
        #[from]
        source: io::Error,
    },

    #[error("{source}")]
    Timeout {
        #[from]
        source: Elapsed,
    },

    #[error("{source}")]
    JsonError {
        #[from]
        source: serde_json::Error,
    },

    // Handshake Errors
    #[error("{source}")]
    HttpParseError {
        #[from]
        source: httparse::Error,
    },

    #[error("Incomplete HTTP request")]
    IncompleteHTTPRequest,

    #[error("Couldn't find Sec-WebSocket-Key header in the request")]
    NoSecWebsocketKey,

    // Framing Errors
    #[error("peer closed the connection")]
    PeerClosed,

    #[error("malformed frame: {0}")]
    MalformedFrame(&'static str),

    #[error("Invalid Opcode")]
    InvalidOpcode,

    #[error("Max payload size reached")]
    MaxPayloadSize,

    // Static serving Errors
    #[error("resource not found: {0}")]
    ResourceNotFound(String),
}
