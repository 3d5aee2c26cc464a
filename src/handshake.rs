use crate::error::Error;
use crate::request::HttpRequest;
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use sha1::{Digest, Sha1};
use tokio::io::AsyncWriteExt;

pub const SEC_WEBSOCKET_KEY: &str = "Sec-WebSocket-Key";

// Fixed GUID every WebSocket server appends to the client key, per RFC 6455.
pub(crate) const UUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

pub(crate) const HTTP_ACCEPT_RESPONSE: &str = "HTTP/1.1 101 Switching Protocols\r\n\
Connection: Upgrade\r\n\
Upgrade: websocket\r\n\
Sec-WebSocket-Accept: {}\r\n\
\r\n";

/// Whether the request asks for the protocol switch: `Connection` carries the
/// `Upgrade` token and `Upgrade` names `websocket`. Both checks are
/// case-insensitive, and `Connection` is treated as the comma-separated list
/// it is (browsers send things like `keep-alive, Upgrade`).
pub fn is_upgrade_request(request: &HttpRequest) -> bool {
    let wants_upgrade = request
        .get_header_value("Connection")
        .map(|value| {
            value
                .split(',')
                .any(|token| token.trim().eq_ignore_ascii_case("upgrade"))
        })
        .unwrap_or(false);

    let to_websocket = request
        .get_header_value("Upgrade")
        .map(|value| value.trim().eq_ignore_ascii_case("websocket"))
        .unwrap_or(false);

    wants_upgrade && to_websocket
}

pub(crate) fn generate_websocket_accept_value(key: &str) -> String {
    let mut sha1 = Sha1::new();
    sha1.update(key.as_bytes());
    sha1.update(UUID.as_bytes());
    BASE64_STANDARD.encode(sha1.finalize())
}

/// Completes the server side of the opening handshake: computes the accept
/// value for the client key and writes the 101 response. Once this returns,
/// the connection is in websocket mode and plain HTTP handling must not touch
/// it again.
pub async fn accept<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    request: &HttpRequest,
) -> Result<(), Error> {
    let key = request
        .get_header_value(SEC_WEBSOCKET_KEY)
        .filter(|key| !key.is_empty())
        .ok_or(Error::NoSecWebsocketKey)?;

    let accept_value = generate_websocket_accept_value(&key);
    let response = HTTP_ACCEPT_RESPONSE.replace("{}", &accept_value);

    writer.write_all(response.as_bytes()).await?;
    writer.flush().await?;

    Ok(())
}
