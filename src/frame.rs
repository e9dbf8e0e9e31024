//! GDL90 framing
//!
//! A frame is `0x7E | stuffed(message ++ crc16_le(message)) | 0x7E`, where
//! stuffing replaces every `0x7E` / `0x7D` byte with `0x7D, byte ^ 0x20`.

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

use crate::crc::{crc16, split_crc};

/// Frame delimiter.
pub const FLAG_BYTE: u8 = 0x7E;
/// Control-escape byte.
pub const ESCAPE_BYTE: u8 = 0x7D;
/// XOR applied to an escaped byte.
pub const ESCAPE_XOR: u8 = 0x20;

/// A frame that cannot be unstuffed. A CRC mismatch is not one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedFrame {
    #[error("malformed frame: too short ({0} bytes)")]
    TooShort(usize),

    #[error("malformed frame: missing start/end flag")]
    MissingFlag,

    #[error("malformed frame: truncated escape at end of frame")]
    TruncatedEscape,

    #[error("malformed frame: unstuffed body too short for CRC ({0} bytes)")]
    MissingCrc(usize),
}

/// Result of [`unframe`]: the message bytes and whether the CRC matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unframed {
    /// Message ID plus payload, CRC removed
    pub message: Bytes,
    /// Whether the transmitted CRC matched the recomputed one
    pub crc_ok: bool,
}

#[inline]
fn put_stuffed(out: &mut BytesMut, b: u8) {
    if b == FLAG_BYTE || b == ESCAPE_BYTE {
        out.put_u8(ESCAPE_BYTE);
        out.put_u8(b ^ ESCAPE_XOR);
    } else {
        out.put_u8(b);
    }
}

/// Wrap a message (message ID + payload) into a GDL90 frame.
pub fn frame(message: &[u8]) -> Bytes {
    let crc = crc16(message).to_le_bytes();

    // Worst case every byte is escaped.
    let mut out = BytesMut::with_capacity(2 + (message.len() + 2) * 2);
    out.put_u8(FLAG_BYTE);
    for &b in message.iter().chain(crc.iter()) {
        put_stuffed(&mut out, b);
    }
    out.put_u8(FLAG_BYTE);
    out.freeze()
}

/// Reverse [`frame`]: check the flags, unstuff, and split off the CRC.
///
/// Callers must check [`Unframed::crc_ok`]; a successful return says nothing
/// about content integrity.
pub fn unframe(frame: &[u8]) -> Result<Unframed, MalformedFrame> {
    if frame.len() < 4 {
        return Err(MalformedFrame::TooShort(frame.len()));
    }
    if frame[0] != FLAG_BYTE || frame[frame.len() - 1] != FLAG_BYTE {
        return Err(MalformedFrame::MissingFlag);
    }

    let inner = &frame[1..frame.len() - 1];
    let mut body = BytesMut::with_capacity(inner.len());
    let mut bytes = inner.iter();
    while let Some(&b) = bytes.next() {
        if b == ESCAPE_BYTE {
            let escaped = bytes.next().ok_or(MalformedFrame::TruncatedEscape)?;
            body.put_u8(escaped ^ ESCAPE_XOR);
        } else {
            body.put_u8(b);
        }
    }

    let (message, received) = split_crc(&body).ok_or(MalformedFrame::MissingCrc(body.len()))?;
    let crc_ok = crc16(message) == received;
    let message_len = message.len();

    body.truncate(message_len);
    Ok(Unframed {
        message: body.freeze(),
        crc_ok,
    })
}
