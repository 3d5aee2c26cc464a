use crate::error::Error;
use bytes::BytesMut;
use tokio::io::AsyncReadExt;
use tokio::time::{timeout, Duration};

const MAX_HEADER_SIZE: usize = 1024 * 16; // 16 kilobytes
const HEADER_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// An owned copy of a parsed HTTP request head. `httparse` borrows from the
/// read buffer, so the interesting parts are copied out once parsing is done.
#[derive(Debug)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    /// Reads the request head off the socket and parses it.
    ///
    /// The read is bounded to 16 KB and 10 seconds, so a peer that trickles
    /// bytes or never sends the blank line can't hold the connection task
    /// forever before the protocol switch.
    pub async fn parse<R: AsyncReadExt + Unpin>(reader: &mut R) -> Result<Self, Error> {
        let mut header_buf = BytesMut::with_capacity(1024);

        loop {
            let mut tmp_buf = vec![0; 1024];
            let n = timeout(HEADER_READ_TIMEOUT, reader.read(&mut tmp_buf)).await??;
            if n == 0 {
                return Err(Error::IncompleteHTTPRequest);
            }
            header_buf.extend_from_slice(&tmp_buf[..n]);

            // The blank line ends the head; everything needed is in the buffer.
            if header_buf.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
            if header_buf.len() > MAX_HEADER_SIZE {
                return Err(Error::IncompleteHTTPRequest);
            }
        }

        let mut headers = [httparse::EMPTY_HEADER; 32];
        let mut request = httparse::Request::new(&mut headers);

        match request.parse(&header_buf)? {
            httparse::Status::Complete(_) => Ok(Self {
                method: request.method.unwrap_or("GET").to_string(),
                path: request.path.unwrap_or("/").to_string(),
                headers: request
                    .headers
                    .iter()
                    .map(|h| {
                        (
                            h.name.to_string(),
                            String::from_utf8_lossy(h.value).to_string(),
                        )
                    })
                    .collect(),
            }),
            httparse::Status::Partial => Err(Error::IncompleteHTTPRequest),
        }
    }

    /// Header lookup by name, case-insensitively, as header names are.
    pub fn get_header_value(&self, header_name: &str) -> Option<String> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(header_name))
            .map(|(_, value)| value.clone())
    }
}
