use crate::error::Error;
use crate::session::SessionWriter;
use futures::Stream;
use rand::Rng;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

pub type ID = Uuid;

// Used for generating a new UUID, every time a new client connects the server
pub fn generate_new_uuid() -> Uuid {
    let buf = rand::rng().random::<[u8; 16]>();

    Uuid::new_v8(buf)
}

/// Everything the embedding event manager gets to see about live connections.
/// It holds the only registry of who is currently in websocket mode; the core
/// just reports what happened to each session.
pub enum Event {
    /// A connection finished the handshake. The writer is the push handle for
    /// this client and stays valid until `Disconnect` arrives for the same ID.
    NewClient(ID, SessionWriter),
    /// A decoded, non-sentinel payload arrived from the client.
    NewMessage(ID, Vec<u8>),
    /// The session ended: peer close, stop sentinel, shutdown or error.
    Disconnect(ID),
    /// The session ended because of this error. `Disconnect` still follows.
    Error(ID, Error),
}

// This struct implements the Stream trait, so the end-user doesn't need to
// interact with the mpsc tokio channel directly
pub struct EventStream {
    receiver: UnboundedReceiver<Event>,
}

impl EventStream {
    pub fn new(receiver: UnboundedReceiver<Event>) -> Self {
        Self { receiver }
    }
}

impl Stream for EventStream {
    type Item = Event;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        Pin::new(&mut this.receiver).poll_recv(cx)
    }
}
