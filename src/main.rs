use futures::StreamExt;
use livesock::config::ServerConfig;
use livesock::event::{Event, ID};
use livesock::server::Server;
use livesock::session::SessionWriter;
use log::{error, info};
use std::collections::HashMap;
use std::env;
use std::process::exit;

// Small embedded event manager: tracks the live connections and echoes every
// payload back, which is enough to watch the push path from a browser console.
#[tokio::main]
async fn main() {
    env_logger::init();

    let mut args = env::args().skip(1);
    let bind_addr = args.next().unwrap_or_else(|| "127.0.0.1:9000".to_string());
    let document_root = args.next().unwrap_or_else(|| ".".to_string());
    let index_file = args
        .next()
        .unwrap_or_else(|| format!("{}/index.html", document_root));

    let config = ServerConfig::new(bind_addr, document_root, index_file);

    let (server, _shutdown) = match Server::bind(config).await {
        Ok(bound) => bound,
        Err(err) => {
            error!("failed to bind: {}", err);
            exit(1);
        }
    };

    let mut events = server.run();
    let mut clients: HashMap<ID, SessionWriter> = HashMap::new();

    while let Some(event) = events.next().await {
        match event {
            Event::NewClient(id, writer) => {
                info!("client {} connected", id);
                clients.insert(id, writer);
            }
            Event::NewMessage(id, payload) => {
                info!("client {} sent {} bytes", id, payload.len());
                if let Some(writer) = clients.get(&id) {
                    if let Err(err) = writer.send(&payload).await {
                        error!("failed to push to client {}: {}", id, err);
                    }
                }
            }
            Event::Disconnect(id) => {
                info!("client {} disconnected", id);
                clients.remove(&id);
            }
            Event::Error(id, err) => error!("client {} errored: {}", id, err),
        }
    }
}
