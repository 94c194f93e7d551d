//! CI-V command builders and reply payload parsers.
//!
//! Builders return complete frames addressed to the rig at `addr` from
//! the controller. Parsers take the frame payload that follows the command
//! byte, with any sub-command already stripped.

use rigbridge_core::error::{Error, Result};
use rigbridge_core::framing::{decode_bcd_be, decode_bcd_le, encode_bcd_be, encode_bcd_le};
use rigbridge_core::{MemoryChannel, Mode, Passband};

use crate::civ::{encode_frame, CONTROLLER_ADDR};

// ---------------------------------------------------------------
// Command numbers
// ---------------------------------------------------------------

pub const CMD_READ_FREQ: u8 = 0x03;
pub const CMD_READ_MODE: u8 = 0x04;
pub const CMD_SET_FREQ: u8 = 0x05;
pub const CMD_SET_MODE: u8 = 0x06;
pub const CMD_VFO: u8 = 0x07;
pub const CMD_SPLIT: u8 = 0x0F;
pub const CMD_LEVEL: u8 = 0x14;
pub const CMD_METER: u8 = 0x15;
pub const CMD_EXTENDED: u8 = 0x1A;
pub const CMD_PTT: u8 = 0x1C;
pub const CMD_RIT_XIT: u8 = 0x21;

pub const SUB_VFO_A: u8 = 0x00;
pub const SUB_VFO_B: u8 = 0x01;
pub const SUB_VFO_MAIN: u8 = 0xD0;
pub const SUB_VFO_SUB: u8 = 0xD1;
pub const SUB_RF_POWER: u8 = 0x0A;
pub const SUB_S_METER: u8 = 0x02;
pub const SUB_MEMORY_CONTENTS: u8 = 0x00;
pub const SUB_DATA_MODE: u8 = 0x06;
pub const SUB_TX: u8 = 0x00;
pub const SUB_RIT_OFFSET: u8 = 0x00;
pub const SUB_RIT_ON: u8 = 0x01;
pub const SUB_XIT_ON: u8 = 0x02;

/// Marks an empty memory channel in memory-contents payloads.
pub const MEMORY_BLANK: u8 = 0xFF;

// ---------------------------------------------------------------
// Modes and filters
// ---------------------------------------------------------------

/// Map a voice/CW/RTTY mode to its CI-V mode byte.
///
/// Data sub-modes are sent as their base mode plus the data-mode flag.
pub fn mode_to_byte(mode: Mode) -> Option<u8> {
    match mode.base() {
        Mode::LSB => Some(0x00),
        Mode::USB => Some(0x01),
        Mode::AM => Some(0x02),
        Mode::CW => Some(0x03),
        Mode::RTTY => Some(0x04),
        Mode::FM => Some(0x05),
        Mode::CWR => Some(0x07),
        Mode::RTTYR => Some(0x08),
        _ => None,
    }
}

pub fn byte_to_mode(byte: u8) -> Result<Mode> {
    match byte {
        0x00 => Ok(Mode::LSB),
        0x01 => Ok(Mode::USB),
        0x02 => Ok(Mode::AM),
        0x03 => Ok(Mode::CW),
        0x04 => Ok(Mode::RTTY),
        0x05 => Ok(Mode::FM),
        0x07 => Ok(Mode::CWR),
        0x08 => Ok(Mode::RTTYR),
        other => Err(Error::InvalidResponse(format!(
            "unknown CI-V mode byte 0x{other:02X}"
        ))),
    }
}

/// Passbands for FIL1 (wide), FIL2 (normal), FIL3 (narrow).
fn filter_widths(mode: Mode) -> [u32; 3] {
    match mode.base() {
        Mode::CW | Mode::CWR => [1200, 500, 250],
        Mode::RTTY | Mode::RTTYR => [2400, 500, 250],
        Mode::AM => [9000, 6000, 3000],
        Mode::FM => [15000, 10000, 7000],
        _ => [3000, 2400, 1800],
    }
}

/// The passband selected by filter number `filter` (1-3) in `mode`.
pub fn filter_to_passband(mode: Mode, filter: u8) -> Result<Passband> {
    match filter {
        1..=3 => Ok(Passband::from_hz(filter_widths(mode)[usize::from(filter - 1)])),
        other => Err(Error::InvalidResponse(format!(
            "unknown CI-V filter number {other}"
        ))),
    }
}

/// The filter number whose width is closest to `passband`; FIL2 if none given.
pub fn passband_to_filter(mode: Mode, passband: Option<Passband>) -> u8 {
    let Some(passband) = passband else {
        return 2;
    };
    let widths = filter_widths(mode);
    let mut best = 0;
    for (i, width) in widths.iter().enumerate() {
        if width.abs_diff(passband.hz()) < widths[best].abs_diff(passband.hz()) {
            best = i;
        }
    }
    best as u8 + 1
}

// ---------------------------------------------------------------
// Builders
// ---------------------------------------------------------------

fn frame(addr: u8, cmd: u8, sub: Option<u8>, data: &[u8]) -> Vec<u8> {
    encode_frame(addr, CONTROLLER_ADDR, cmd, sub, data)
}

pub fn cmd_read_frequency(addr: u8) -> Vec<u8> {
    frame(addr, CMD_READ_FREQ, None, &[])
}

/// Fails before encoding anything if the frequency exceeds ten digits.
pub fn cmd_set_frequency(addr: u8, freq_hz: u64) -> Result<Vec<u8>> {
    let bcd = encode_bcd_le(freq_hz, 5)?;
    Ok(frame(addr, CMD_SET_FREQ, None, &bcd))
}

pub fn cmd_read_mode(addr: u8) -> Vec<u8> {
    frame(addr, CMD_READ_MODE, None, &[])
}

/// Set mode, with the filter byte only when `filter` is given.
pub fn cmd_set_mode(addr: u8, mode_byte: u8, filter: Option<u8>) -> Vec<u8> {
    match filter {
        Some(f) => frame(addr, CMD_SET_MODE, None, &[mode_byte, f]),
        None => frame(addr, CMD_SET_MODE, None, &[mode_byte]),
    }
}

pub fn cmd_read_data_mode(addr: u8) -> Vec<u8> {
    frame(addr, CMD_EXTENDED, Some(SUB_DATA_MODE), &[])
}

pub fn cmd_set_data_mode(addr: u8, on: bool, filter: u8) -> Vec<u8> {
    let data = if on { [0x01, filter] } else { [0x00, 0x00] };
    frame(addr, CMD_EXTENDED, Some(SUB_DATA_MODE), &data)
}

pub fn cmd_select_vfo(addr: u8, sub: u8) -> Vec<u8> {
    frame(addr, CMD_VFO, Some(sub), &[])
}

pub fn cmd_read_split(addr: u8) -> Vec<u8> {
    frame(addr, CMD_SPLIT, None, &[])
}

pub fn cmd_set_split(addr: u8, on: bool) -> Vec<u8> {
    frame(addr, CMD_SPLIT, Some(u8::from(on)), &[])
}

pub fn cmd_read_power(addr: u8) -> Vec<u8> {
    frame(addr, CMD_LEVEL, Some(SUB_RF_POWER), &[])
}

/// RF power as a 0-255 level, sent as two big-endian BCD bytes.
pub fn cmd_set_power(addr: u8, level: u16) -> Result<Vec<u8>> {
    let bcd = encode_bcd_be(u64::from(level.min(255)), 2)?;
    Ok(frame(addr, CMD_LEVEL, Some(SUB_RF_POWER), &bcd))
}

pub fn cmd_read_s_meter(addr: u8) -> Vec<u8> {
    frame(addr, CMD_METER, Some(SUB_S_METER), &[])
}

pub fn cmd_read_ptt(addr: u8) -> Vec<u8> {
    frame(addr, CMD_PTT, Some(SUB_TX), &[])
}

pub fn cmd_set_ptt(addr: u8, on: bool) -> Vec<u8> {
    frame(addr, CMD_PTT, Some(SUB_TX), &[u8::from(on)])
}

pub fn cmd_read_offset(addr: u8) -> Vec<u8> {
    frame(addr, CMD_RIT_XIT, Some(SUB_RIT_OFFSET), &[])
}

pub fn cmd_set_offset(addr: u8, offset_hz: i32) -> Result<Vec<u8>> {
    let data = encode_offset(offset_hz)?;
    Ok(frame(addr, CMD_RIT_XIT, Some(SUB_RIT_OFFSET), &data))
}

/// `sub` is [`SUB_RIT_ON`] or [`SUB_XIT_ON`].
pub fn cmd_read_offset_switch(addr: u8, sub: u8) -> Vec<u8> {
    frame(addr, CMD_RIT_XIT, Some(sub), &[])
}

pub fn cmd_set_offset_switch(addr: u8, sub: u8, on: bool) -> Vec<u8> {
    frame(addr, CMD_RIT_XIT, Some(sub), &[u8::from(on)])
}

pub fn cmd_read_memory(addr: u8, channel: u16) -> Result<Vec<u8>> {
    let ch = encode_bcd_be(u64::from(channel), 2)?;
    Ok(frame(addr, CMD_EXTENDED, Some(SUB_MEMORY_CONTENTS), &ch))
}

/// Write a channel: number, in-use flag, frequency, mode, filter, and on
/// rigs with data modes the data-mode flag.
pub fn cmd_write_memory(
    addr: u8,
    channel: &MemoryChannel,
    mode_byte: u8,
    has_data_mode: bool,
) -> Result<Vec<u8>> {
    let mut data = encode_bcd_be(u64::from(channel.number), 2)?;
    data.push(0x00);
    data.extend(encode_bcd_le(channel.frequency_hz, 5)?);
    data.push(mode_byte);
    data.push(passband_to_filter(channel.mode, None));
    if has_data_mode {
        data.push(u8::from(channel.mode.is_data()));
    }
    Ok(frame(addr, CMD_EXTENDED, Some(SUB_MEMORY_CONTENTS), &data))
}

pub fn cmd_clear_memory(addr: u8, channel: u16) -> Result<Vec<u8>> {
    let mut data = encode_bcd_be(u64::from(channel), 2)?;
    data.push(MEMORY_BLANK);
    Ok(frame(addr, CMD_EXTENDED, Some(SUB_MEMORY_CONTENTS), &data))
}

// ---------------------------------------------------------------
// Offset encoding
// ---------------------------------------------------------------

/// RIT/XIT offset as two little-endian BCD bytes plus a sign byte.
///
/// +150 Hz is `[0x50, 0x01, 0x00]`, -300 Hz is `[0x00, 0x03, 0x01]`.
pub fn encode_offset(offset_hz: i32) -> Result<Vec<u8>> {
    let mut data = encode_bcd_le(u64::from(offset_hz.unsigned_abs()), 2)?;
    data.push(u8::from(offset_hz < 0));
    Ok(data)
}

// ---------------------------------------------------------------
// Parsers
// ---------------------------------------------------------------

fn expect_len(data: &[u8], len: usize, what: &str) -> Result<()> {
    if data.len() != len {
        return Err(Error::InvalidResponse(format!(
            "expected {len} bytes for {what}, got {}",
            data.len()
        )));
    }
    Ok(())
}

pub fn parse_frequency(data: &[u8]) -> Result<u64> {
    expect_len(data, 5, "frequency")?;
    decode_bcd_le(data)
}

/// Mode byte plus optional filter number; rigs that omit the filter report
/// the normal passband.
pub fn parse_mode(data: &[u8]) -> Result<(Mode, Passband)> {
    match data {
        [mode] => {
            let mode = byte_to_mode(*mode)?;
            Ok((mode, mode.default_passband()))
        }
        [mode, filter] => {
            let mode = byte_to_mode(*mode)?;
            Ok((mode, filter_to_passband(mode, *filter)?))
        }
        _ => Err(Error::InvalidResponse(format!(
            "expected 1 or 2 bytes for mode, got {}",
            data.len()
        ))),
    }
}

/// Data-mode flag; some rigs append the data filter number.
pub fn parse_data_mode(data: &[u8]) -> Result<bool> {
    match data.first() {
        Some(&flag) if data.len() <= 2 => Ok(flag != 0),
        _ => Err(Error::InvalidResponse(format!(
            "expected 1 or 2 bytes for data mode, got {}",
            data.len()
        ))),
    }
}

pub fn parse_switch(data: &[u8], what: &str) -> Result<bool> {
    expect_len(data, 1, what)?;
    match data[0] {
        0x00 => Ok(false),
        0x01 => Ok(true),
        other => Err(Error::InvalidResponse(format!(
            "unexpected {what} value 0x{other:02X}"
        ))),
    }
}

/// A two-byte big-endian BCD level (0000-0255).
pub fn parse_level(data: &[u8]) -> Result<u16> {
    expect_len(data, 2, "level")?;
    let level = decode_bcd_be(data)?;
    u16::try_from(level)
        .ok()
        .filter(|&l| l <= 255)
        .ok_or_else(|| Error::InvalidResponse(format!("level out of range: {level}")))
}

pub fn parse_offset(data: &[u8]) -> Result<i32> {
    expect_len(data, 3, "offset")?;
    let magnitude = decode_bcd_le(&data[..2])? as i32;
    match data[2] {
        0x00 => Ok(magnitude),
        0x01 => Ok(-magnitude),
        other => Err(Error::InvalidResponse(format!(
            "unexpected offset sign byte 0x{other:02X}"
        ))),
    }
}

/// Memory-contents reply: channel number then either the blank marker or
/// in-use flag, frequency, mode, filter and (with `has_data_mode`) the
/// data-mode flag.
pub fn parse_memory(
    data: &[u8],
    expected_channel: u16,
    has_data_mode: bool,
) -> Result<Option<MemoryChannel>> {
    if data.len() < 3 {
        return Err(Error::InvalidResponse(format!(
            "memory reply too short: {data:02X?}"
        )));
    }
    let number = decode_bcd_be(&data[..2])? as u16;
    if number != expected_channel {
        return Err(Error::InvalidResponse(format!(
            "memory reply for channel {number}, asked for {expected_channel}"
        )));
    }
    if data[2] == MEMORY_BLANK {
        return Ok(None);
    }
    if data.len() < 10 {
        return Err(Error::InvalidResponse(format!(
            "memory reply too short: {data:02X?}"
        )));
    }
    let frequency_hz = decode_bcd_le(&data[3..8])?;
    let mut mode = byte_to_mode(data[8])?;
    if has_data_mode && data.get(10).is_some_and(|&flag| flag != 0) {
        mode = mode.with_data().ok_or_else(|| {
            Error::InvalidResponse(format!("data flag set on {mode} memory"))
        })?;
    }
    Ok(Some(MemoryChannel {
        number,
        frequency_hz,
        mode,
    }))
}
