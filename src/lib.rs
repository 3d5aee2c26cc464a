//! Minimal development server with live WebSocket push.
//!
//! Serves the static files of a project over plain HTTP and, when the browser
//! asks for it, upgrades the connection to the WebSocket protocol so the server
//! can push live events to the page. The interesting surface is the WebSocket
//! layer: the opening handshake, the binary frame codec (masking included), and
//! the per-connection receive loop that keeps a socket alive across the
//! protocol switch.
//!
//! It's an async crate based on the tokio runtime, working directly on top of a
//! tokio `TcpStream`, following the framing and handshake rules of the
//! [WebSocket Protocol RFC](https://datatracker.ietf.org/doc/html/rfc6455).
//! Everything outside the WebSocket core is routine file serving.

pub mod config;
pub mod error;
pub mod event;
pub mod files;
pub mod frame;
pub mod handshake;
pub mod request;
pub mod server;
pub mod session;
