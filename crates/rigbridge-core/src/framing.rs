//! Shared encoding helpers for the wire protocols.
//!
//! - packed BCD, both little-endian (CI-V frequencies, offsets) and
//!   big-endian (CI-V levels, channel numbers);
//! - fixed-width ASCII decimal fields (text CAT payloads);
//! - a caller-side retry helper with exponential backoff.
//!
//! BCD packs two decimal digits per byte, low digit in the low nibble.
//! In little-endian order the least significant byte comes first:
//!
//! ```text
//! 14,250,000 Hz -> digits 0014250000
//!   byte 0: 0x00  (Hz: 0, 0)
//!   byte 1: 0x00  (Hz: 00)
//!   byte 2: 0x25  (kHz: 2, 5)
//!   byte 3: 0x14  (MHz: 1, 4)
//!   byte 4: 0x00  (GHz: 0, 0)
//! ```

use std::future::Future;
use std::time::Duration;

use crate::error::{Error, Result};

/// Largest value representable in `len` packed BCD bytes.
fn bcd_limit(len: usize) -> u64 {
    10u64.saturating_pow((len * 2) as u32)
}

/// Encode `value` as `len` bytes of little-endian packed BCD.
///
/// Fails if the value has more decimal digits than fit in `len` bytes.
pub fn encode_bcd_le(value: u64, len: usize) -> Result<Vec<u8>> {
    if len < 10 && value >= bcd_limit(len) {
        return Err(Error::InvalidParameter(format!(
            "{value} does not fit in {} BCD digits",
            len * 2
        )));
    }
    let mut out = vec![0u8; len];
    let mut rest = value;
    for byte in &mut out {
        let lo = (rest % 10) as u8;
        rest /= 10;
        let hi = (rest % 10) as u8;
        rest /= 10;
        *byte = (hi << 4) | lo;
    }
    Ok(out)
}

/// Encode `value` as `len` bytes of big-endian packed BCD.
pub fn encode_bcd_be(value: u64, len: usize) -> Result<Vec<u8>> {
    let mut out = encode_bcd_le(value, len)?;
    out.reverse();
    Ok(out)
}

/// Decode little-endian packed BCD, rejecting nibbles above 9.
pub fn decode_bcd_le(bytes: &[u8]) -> Result<u64> {
    validate_bcd(bytes)?;
    let mut value: u64 = 0;
    for &byte in bytes.iter().rev() {
        value = value * 100 + u64::from(byte >> 4) * 10 + u64::from(byte & 0x0F);
    }
    Ok(value)
}

/// Decode big-endian packed BCD, rejecting nibbles above 9.
pub fn decode_bcd_be(bytes: &[u8]) -> Result<u64> {
    validate_bcd(bytes)?;
    let mut value: u64 = 0;
    for &byte in bytes {
        value = value * 100 + u64::from(byte >> 4) * 10 + u64::from(byte & 0x0F);
    }
    Ok(value)
}

/// Check that every nibble is a decimal digit.
pub fn validate_bcd(bytes: &[u8]) -> Result<()> {
    for (i, &byte) in bytes.iter().enumerate() {
        if byte & 0x0F > 9 || byte >> 4 > 9 {
            return Err(Error::InvalidResponse(format!(
                "invalid BCD digit at byte {i}: 0x{byte:02X}"
            )));
        }
    }
    Ok(())
}

/// Format `value` as a zero-padded decimal field exactly `width` digits wide.
pub fn encode_decimal(value: u64, width: usize) -> Result<String> {
    let text = format!("{value:0width$}");
    if text.len() > width {
        return Err(Error::InvalidParameter(format!(
            "{value} does not fit in {width} digits"
        )));
    }
    Ok(text)
}

/// Format a signed offset as `+NNNN` / `-NNNN` with `width` digits.
pub fn encode_signed_decimal(value: i32, width: usize) -> Result<String> {
    let sign = if value < 0 { '-' } else { '+' };
    let digits = encode_decimal(u64::from(value.unsigned_abs()), width)?;
    Ok(format!("{sign}{digits}"))
}

/// Parse an all-digit ASCII field.
pub fn parse_decimal(field: &str) -> Result<u64> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidResponse(format!(
            "expected decimal digits, got {field:?}"
        )));
    }
    field
        .parse::<u64>()
        .map_err(|e| Error::InvalidResponse(format!("bad decimal field {field:?}: {e}")))
}

/// Parse a field of the form `+NNNN` or `-NNNN` (a bare digit string is
/// treated as positive).
pub fn parse_signed_decimal(field: &str) -> Result<i32> {
    let (negative, digits) = match field.as_bytes().first() {
        Some(b'-') => (true, &field[1..]),
        Some(b'+') => (false, &field[1..]),
        _ => (false, field),
    };
    let magnitude = parse_decimal(digits)?;
    let magnitude = i32::try_from(magnitude)
        .map_err(|_| Error::InvalidResponse(format!("offset out of range: {field:?}")))?;
    Ok(if negative { -magnitude } else { magnitude })
}

/// Run `op` up to `attempts` times, doubling the delay between tries.
///
/// Only errors for which `retryable` returns true are retried; anything else
/// is returned immediately. The coordinator never retries wire commands on
/// its own; this is for callers such as connection setup that want to.
pub async fn retry_with_backoff<T, F, Fut>(
    attempts: u32,
    initial_delay: Duration,
    retryable: impl Fn(&Error) -> bool,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut delay = initial_delay;
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts && retryable(&e) => {
                tracing::debug!(attempt, ?delay, "retrying after error: {e}");
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
