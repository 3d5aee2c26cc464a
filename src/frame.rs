use crate::error::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

#[derive(Debug, Clone, PartialEq)]
pub enum OpCode {
    Continue,
    Text,
    Binary,
    Close,
    Ping,
    Pong,
}

impl OpCode {
    pub fn from(byte: u8) -> Result<Self, Error> {
        match byte {
            0x0 => Ok(OpCode::Continue),
            0x1 => Ok(OpCode::Text),
            0x2 => Ok(OpCode::Binary),
            0x8 => Ok(OpCode::Close),
            0x9 => Ok(OpCode::Ping),
            0xA => Ok(OpCode::Pong),
            _ => Err(Error::InvalidOpcode),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            OpCode::Continue => 0x0,
            OpCode::Text => 0x1,
            OpCode::Binary => 0x2,
            OpCode::Close => 0x8,
            OpCode::Ping => 0x9,
            OpCode::Pong => 0xA,
        }
    }

    pub fn is_control(&self) -> bool {
        matches!(self, OpCode::Close | OpCode::Ping | OpCode::Pong)
    }
}

/// One WebSocket protocol unit: header flags plus payload. Fragments are not
/// reassembled here; a non-final frame is handed to the caller as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub final_fragment: bool,
    pub opcode: OpCode,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(final_fragment: bool, opcode: OpCode, payload: Vec<u8>) -> Self {
        Self {
            final_fragment,
            opcode,
            payload,
        }
    }

    pub fn text(payload: Vec<u8>) -> Self {
        Self::new(true, OpCode::Text, payload)
    }

    pub fn binary(payload: Vec<u8>) -> Self {
        Self::new(true, OpCode::Binary, payload)
    }
}

/// XOR the payload against the 4-byte key, cycling over it. Client-to-server
/// frames arrive masked like this; applying the same key again restores the
/// original bytes, so masking and unmasking are the same operation.
pub fn apply_mask(mask: [u8; 4], payload: &mut [u8]) {
    for (i, byte) in payload.iter_mut().enumerate() {
        *byte ^= mask[i % 4];
    }
}

/// Decodes a single frame from the byte source.
///
/// An EOF on the very first header read means the peer hung up and is reported
/// as [`Error::PeerClosed`]; running dry anywhere later in the frame is a
/// malformed, truncated frame. Declared lengths above `max_payload_size` are
/// rejected before any payload byte is read.
pub async fn read_frame<T: AsyncReadExt + Unpin>(
    buf_reader: &mut T,
    max_payload_size: usize,
) -> Result<Frame, Error> {
    let mut header = [0u8; 2];

    buf_reader.read_exact(&mut header).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::PeerClosed
        } else {
            Error::from(e)
        }
    })?;

    // The first bit of the first byte tells whether this frame is the final
    // fragment of a message, the low nibble carries the opcode. The RSV bits
    // in between are ignored, no extension is negotiated.
    let final_fragment = (header[0] & 0b10000000) != 0;
    let opcode = OpCode::from(header[0] & 0b00001111)?;

    // Second byte: mask bit on top, then a 7-bit payload length which may
    // defer to a 16-bit or 64-bit big-endian extension.
    let masked = (header[1] & 0b10000000) != 0;
    let mut length = (header[1] & 0b01111111) as usize;

    if length == 126 {
        let mut be_bytes = [0u8; 2];
        read_frame_part(buf_reader, &mut be_bytes).await?;
        length = u16::from_be_bytes(be_bytes) as usize;
    } else if length == 127 {
        let mut be_bytes = [0u8; 8];
        read_frame_part(buf_reader, &mut be_bytes).await?;
        length = u64::from_be_bytes(be_bytes) as usize;
    }

    if length > max_payload_size {
        return Err(Error::MaxPayloadSize);
    }

    let mask = if masked {
        let mut mask = [0u8; 4];
        read_frame_part(buf_reader, &mut mask).await?;
        Some(mask)
    } else {
        None
    };

    let mut payload = vec![0u8; length];
    read_frame_part(buf_reader, &mut payload).await?;

    if let Some(mask) = mask {
        apply_mask(mask, &mut payload);
    }

    Ok(Frame {
        final_fragment,
        opcode,
        payload,
    })
}

// Past the first header bytes, hitting EOF means the peer stopped mid-frame.
async fn read_frame_part<T: AsyncReadExt + Unpin>(
    buf_reader: &mut T,
    buf: &mut [u8],
) -> Result<(), Error> {
    buf_reader.read_exact(buf).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::MalformedFrame("truncated frame")
        } else {
            Error::from(e)
        }
    })?;
    Ok(())
}

/// Encodes a frame onto the byte sink. Server-to-client frames are never
/// masked, so the mask bit stays clear and no key is written.
pub async fn write_frame<T: AsyncWriteExt + Unpin>(
    stream: &mut T,
    frame: Frame,
) -> Result<(), Error> {
    let first_byte = (frame.final_fragment as u8) << 7 | frame.opcode.as_u8();
    let payload_len = frame.payload.len();

    stream.write_all(&[first_byte]).await?;

    // Length tier is picked from the payload size alone: up to 125 inline,
    // up to 65535 as the 126 marker plus 16 bits, above that the 127 marker
    // plus a full 64-bit big-endian length.
    if payload_len <= 125 {
        stream.write_all(&[payload_len as u8]).await?;
    } else if payload_len <= 65535 {
        stream
            .write_all(&[126, (payload_len >> 8) as u8, payload_len as u8])
            .await?;
    } else {
        let bytes = (payload_len as u64).to_be_bytes();
        stream
            .write_all(&[
                127, bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6],
                bytes[7],
            ])
            .await?;
    }

    stream.write_all(&frame.payload).await?;
    stream.flush().await?;

    Ok(())
}
