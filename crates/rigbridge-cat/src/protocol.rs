//! Shared text-CAT grammar.
//!
//! Commands are an ASCII mnemonic, an optional decimal payload and a `;`
//! terminator: `FA00014230000;`. A query is the bare mnemonic (`FA;`) and is
//! answered with mnemonic + value. A set is acknowledged by the rig echoing
//! the identical command. A reply containing `?` means the rig refused.

use rigbridge_core::error::{Error, Result};

/// The byte that ends every command and reply.
pub const TERMINATOR: u8 = b';';

/// Build a complete command from mnemonic and payload.
pub fn encode_command(mnemonic: &str, payload: &str) -> String {
    format!("{mnemonic}{payload};")
}

/// Turn raw reply bytes (terminator included) into text, rejecting `?`.
pub fn decode_reply(bytes: &[u8], sent: &str) -> Result<String> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| Error::InvalidResponse(format!("non-ASCII reply to {sent}: {bytes:02X?}")))?;
    if text.contains('?') {
        return Err(Error::CommandFailed(format!(
            "rig rejected {sent} with {text}"
        )));
    }
    Ok(text.to_string())
}

/// Strip `mnemonic` and the terminator from a query reply.
pub fn reply_payload<'a>(reply: &'a str, mnemonic: &str) -> Result<&'a str> {
    let body = reply.strip_suffix(';').unwrap_or(reply);
    body.strip_prefix(mnemonic).ok_or_else(|| {
        Error::InvalidResponse(format!("expected reply to {mnemonic}, got {reply}"))
    })
}
