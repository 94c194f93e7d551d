//! CI-V frame codec.
//!
//! Every CI-V message has the layout
//!
//! ```text
//! FE FE <dst> <src> <cmd> [<sub>] [<data>...] FD
//! ```
//!
//! where `dst`/`src` are bus addresses (the controller is `0xE0`), `cmd`
//! selects the function and the optional sub-command and BCD data follow.
//! The rig answers with the addresses swapped, either echoing the command
//! with data (reads) or with a bare `FB` (ACK) / `FA` (NAK).

use bytes::{BufMut, BytesMut};
use rigbridge_core::error::{Error, Result};

/// Preamble byte, sent twice at the start of every frame.
pub const PREAMBLE: u8 = 0xFE;

/// End-of-message marker.
pub const TERMINATOR: u8 = 0xFD;

/// Default controller (PC) address.
pub const CONTROLLER_ADDR: u8 = 0xE0;

/// Positive acknowledgement.
pub const ACK: u8 = 0xFB;

/// Negative acknowledgement.
pub const NAK: u8 = 0xFA;

/// A decoded CI-V frame.
///
/// `payload` holds everything between the command byte and the terminator,
/// sub-command included; the engine knows which commands carry one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CivFrame {
    pub dst_addr: u8,
    pub src_addr: u8,
    pub cmd: u8,
    pub payload: Vec<u8>,
}

impl CivFrame {
    pub fn is_ack(&self) -> bool {
        self.cmd == ACK && self.payload.is_empty()
    }

    pub fn is_nak(&self) -> bool {
        self.cmd == NAK
    }
}

/// Encode a command frame.
///
/// ```
/// use rigbridge_civ::civ::{encode_frame, CONTROLLER_ADDR};
///
/// // Read frequency from an IC-7300.
/// let frame = encode_frame(0x94, CONTROLLER_ADDR, 0x03, None, &[]);
/// assert_eq!(frame, vec![0xFE, 0xFE, 0x94, 0xE0, 0x03, 0xFD]);
/// ```
pub fn encode_frame(dst: u8, src: u8, cmd: u8, sub_cmd: Option<u8>, data: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(7 + data.len());
    buf.put_u8(PREAMBLE);
    buf.put_u8(PREAMBLE);
    buf.put_u8(dst);
    buf.put_u8(src);
    buf.put_u8(cmd);
    if let Some(sub) = sub_cmd {
        buf.put_u8(sub);
    }
    buf.put_slice(data);
    buf.put_u8(TERMINATOR);
    buf.to_vec()
}

/// Decode one complete reply as read up to and including the terminator.
///
/// The reply must begin with the preamble; anything else means the stream
/// is out of step and is reported as [`Error::InvalidResponse`].
pub fn decode_reply(bytes: &[u8]) -> Result<CivFrame> {
    if bytes.len() < 2 || bytes[0] != PREAMBLE || bytes[1] != PREAMBLE {
        return Err(Error::InvalidResponse(format!(
            "reply does not begin with CI-V preamble: {bytes:02X?}"
        )));
    }
    // Some interfaces repeat the preamble byte; tolerate extras.
    let start = bytes.iter().position(|&b| b != PREAMBLE).unwrap_or(bytes.len());
    let body = &bytes[start..];
    match body.split_last() {
        Some((&TERMINATOR, inner)) if inner.len() >= 3 => Ok(CivFrame {
            dst_addr: inner[0],
            src_addr: inner[1],
            cmd: inner[2],
            payload: inner[3..].to_vec(),
        }),
        _ => Err(Error::InvalidResponse(format!(
            "truncated CI-V reply: {bytes:02X?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---------------------------------------------------------------
    // Encoding
    // ---------------------------------------------------------------

    #[test]
    fn encode_read_frequency() {
        let bytes = encode_frame(0x94, CONTROLLER_ADDR, 0x03, None, &[]);
        assert_eq!(bytes, vec![0xFE, 0xFE, 0x94, 0xE0, 0x03, 0xFD]);
    }

    #[test]
    fn encode_with_sub_command() {
        let bytes = encode_frame(0x98, CONTROLLER_ADDR, 0x1C, Some(0x00), &[0x01]);
        assert_eq!(bytes, vec![0xFE, 0xFE, 0x98, 0xE0, 0x1C, 0x00, 0x01, 0xFD]);
    }

    // ---------------------------------------------------------------
    // Decoding
    // ---------------------------------------------------------------

    #[test]
    fn decode_ack() {
        let frame = decode_reply(&[0xFE, 0xFE, 0xE0, 0x94, 0xFB, 0xFD]).unwrap();
        assert!(frame.is_ack());
        assert!(!frame.is_nak());
        assert_eq!(frame.dst_addr, CONTROLLER_ADDR);
        assert_eq!(frame.src_addr, 0x94);
    }

    #[test]
    fn decode_nak() {
        let frame = decode_reply(&[0xFE, 0xFE, 0xE0, 0x94, 0xFA, 0xFD]).unwrap();
        assert!(frame.is_nak());
    }

    #[test]
    fn decode_frequency_reply() {
        let frame = decode_reply(&[
            0xFE, 0xFE, 0xE0, 0x94, 0x03, 0x00, 0x00, 0x23, 0x14, 0x00, 0xFD,
        ])
        .unwrap();
        assert_eq!(frame.cmd, 0x03);
        assert_eq!(frame.payload, vec![0x00, 0x00, 0x23, 0x14, 0x00]);
    }

    #[test]
    fn decode_tolerates_extra_preamble() {
        let frame = decode_reply(&[0xFE, 0xFE, 0xFE, 0xE0, 0x94, 0xFB, 0xFD]).unwrap();
        assert!(frame.is_ack());
    }

    #[test]
    fn decode_rejects_missing_preamble() {
        let result = decode_reply(&[0x00, 0xFE, 0xE0, 0x94, 0xFB, 0xFD]);
        assert!(matches!(result, Err(Error::InvalidResponse(_))));
    }

    #[test]
    fn decode_rejects_truncated() {
        assert!(decode_reply(&[0xFE, 0xFE, 0xE0, 0xFD]).is_err());
        assert!(decode_reply(&[0xFE, 0xFE, 0xE0, 0x94, 0x03]).is_err());
    }
}
