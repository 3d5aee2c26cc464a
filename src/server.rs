use crate::config::ServerConfig;
use crate::error::Error;
use crate::event::{generate_new_uuid, Event, EventStream, ID};
use crate::files;
use crate::handshake;
use crate::request::HttpRequest;
use crate::session::{PayloadHandler, Session, SessionWriter};
use log::{debug, error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{split, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::select;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tokio::sync::{watch, Mutex};

/// The dev server: one accept loop, one task per accepted connection. Each
/// connection is either answered with a static resource and dropped, or
/// upgraded to a long-lived websocket session.
pub struct Server {
    listener: TcpListener,
    config: Arc<ServerConfig>,
    shutdown: watch::Receiver<bool>,
}

/// Flips the shutdown signal every accept loop and session is watching.
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

impl Server {
    pub async fn bind(config: ServerConfig) -> Result<(Self, ShutdownHandle), Error> {
        let listener = TcpListener::bind(&config.bind_addr).await?;
        let (tx, rx) = watch::channel(false);

        Ok((
            Server {
                listener,
                config: Arc::new(config),
                shutdown: rx,
            },
            ShutdownHandle { tx },
        ))
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    /// Spawns the accept loop and hands back the stream of connection events
    /// for the embedding event manager to consume.
    pub fn run(self) -> EventStream {
        let (event_tx, event_rx) = unbounded_channel();

        tokio::spawn(accept_loop(
            self.listener,
            self.config,
            event_tx,
            self.shutdown,
        ));

        EventStream::new(event_rx)
    }
}

async fn accept_loop(
    listener: TcpListener,
    config: Arc<ServerConfig>,
    event_tx: UnboundedSender<Event>,
    mut shutdown: watch::Receiver<bool>,
) {
    if let Ok(addr) = listener.local_addr() {
        info!("listening on {}", addr);
    }

    loop {
        select! {
            _ = shutdown.changed() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!("accepted connection from {}", peer);
                    tokio::spawn(handle_connection(
                        stream,
                        peer,
                        config.clone(),
                        event_tx.clone(),
                        shutdown.clone(),
                    ));
                }
                Err(err) => error!("failed to accept connection: {}", err),
            }
        }
    }
}

// Top of one connection's task. Whatever goes wrong in here stays on this
// task; the listener and the other sessions never see it.
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    config: Arc<ServerConfig>,
    event_tx: UnboundedSender<Event>,
    shutdown: watch::Receiver<bool>,
) {
    if let Err(err) = route(stream, config, event_tx, shutdown).await {
        error!("connection from {} failed: {}", peer, err);
    }
}

/// Decides what an accepted connection is: a websocket upgrade, which switches
/// protocols and runs the session loop until the connection dies, or a plain
/// request answered from disk and finished right away.
async fn route(
    stream: TcpStream,
    config: Arc<ServerConfig>,
    event_tx: UnboundedSender<Event>,
    shutdown: watch::Receiver<bool>,
) -> Result<(), Error> {
    let (read_half, mut write_half) = split(stream);
    let mut reader = BufReader::new(read_half);

    let request = HttpRequest::parse(&mut reader).await?;

    if !handshake::is_upgrade_request(&request) {
        return files::serve(&mut write_half, &config, &request.path).await;
    }

    handshake::accept(&mut write_half, &request).await?;

    let id = generate_new_uuid();
    info!("upgraded connection {} to websocket", id);

    // After the protocol switch the session owns both halves; the HTTP side
    // above must not run its usual close-after-response teardown.
    let writer = SessionWriter::new(Arc::new(Mutex::new(write_half)));
    let _ = event_tx.send(Event::NewClient(id, writer.clone()));

    let session = Session::new(id, reader, shutdown, config.websocket.clone());
    let mut forwarder = EventForwarder {
        id: session.id(),
        events: event_tx.clone(),
    };

    if let Err(err) = session.run(&mut forwarder).await {
        error!("websocket session {} failed: {}", id, err);
        let _ = event_tx.send(Event::Error(id, err));
    }

    let _ = writer.close().await;
    let _ = event_tx.send(Event::Disconnect(id));
    debug!("websocket session {} closed", id);

    Ok(())
}

// Bridges the per-session handler interface onto the server-wide event
// channel.
struct EventForwarder {
    id: ID,
    events: UnboundedSender<Event>,
}

impl PayloadHandler for EventForwarder {
    fn on_data(&mut self, payload: Vec<u8>) {
        let _ = self.events.send(Event::NewMessage(self.id, payload));
    }
}
