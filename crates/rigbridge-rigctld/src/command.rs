//! Parsing of rigctld command lines.
//!
//! A line is one command: either a single-character short form (`F
//! 14230000`) or a backslash long form (`\set_freq 14230000`), followed by
//! whitespace-separated arguments.

use std::str::FromStr;

use rigbridge_core::{Mode, Passband, Vfo};
use thiserror::Error;

use crate::response::{RPRT_EINVAL, RPRT_ENIMPL};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command {0:?}")]
    Unknown(String),
    #[error("bad argument: {0}")]
    BadArgument(String),
}

impl CommandError {
    /// The RPRT code reported for this error.
    pub fn code(&self) -> i32 {
        match self {
            CommandError::Unknown(_) => RPRT_ENIMPL,
            CommandError::BadArgument(_) => RPRT_EINVAL,
        }
    }
}

/// A level name accepted by `l` / `L`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Level {
    /// Output power as a fraction of maximum.
    RfPower,
    /// Signal strength in dB relative to S9.
    Strength,
    /// A Hamlib level this server knows about but cannot provide.
    Unavailable(String),
}

/// Hamlib level names recognised but not provided.
const UNAVAILABLE_LEVELS: &[&str] = &[
    "AGC", "NB", "NR", "IF", "AF", "RF", "SQL", "PREAMP", "ATT", "MICGAIN", "KEYSPD", "COMP",
    "VOXGAIN", "CWPITCH", "NOTCHF", "PBT_IN", "PBT_OUT", "APF", "BKINDL", "SWR", "ALC",
    "RFPOWER_METER", "COMP_METER", "VD_METER", "ID_METER",
];

impl FromStr for Level {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.to_ascii_uppercase();
        match name.as_str() {
            "RFPOWER" => Ok(Level::RfPower),
            "STRENGTH" => Ok(Level::Strength),
            other if UNAVAILABLE_LEVELS.contains(&other) => Ok(Level::Unavailable(name)),
            _ => Err(CommandError::BadArgument(format!("unknown level {s:?}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    GetFreq,
    SetFreq(u64),
    GetMode,
    SetMode(Mode, Option<Passband>),
    GetVfo,
    SetVfo(Vfo),
    GetPtt,
    SetPtt(bool),
    GetLevel(Level),
    SetLevel(Level, f64),
    GetSplitVfo,
    SetSplitVfo(bool, Vfo),
    GetSplitFreq,
    SetSplitFreq(u64),
    GetSplitMode,
    SetSplitMode(Mode, Option<Passband>),
    GetRit,
    SetRit(i32),
    GetXit,
    SetXit(i32),
    GetInfo,
    DumpCaps,
    ChkVfo,
    SetExtResponse(bool),
    Quit,
}

impl Command {
    /// The long name, as used in Extended responses.
    pub fn long_name(&self) -> &'static str {
        match self {
            Command::GetFreq => "get_freq",
            Command::SetFreq(_) => "set_freq",
            Command::GetMode => "get_mode",
            Command::SetMode(..) => "set_mode",
            Command::GetVfo => "get_vfo",
            Command::SetVfo(_) => "set_vfo",
            Command::GetPtt => "get_ptt",
            Command::SetPtt(_) => "set_ptt",
            Command::GetLevel(_) => "get_level",
            Command::SetLevel(..) => "set_level",
            Command::GetSplitVfo => "get_split_vfo",
            Command::SetSplitVfo(..) => "set_split_vfo",
            Command::GetSplitFreq => "get_split_freq",
            Command::SetSplitFreq(_) => "set_split_freq",
            Command::GetSplitMode => "get_split_mode",
            Command::SetSplitMode(..) => "set_split_mode",
            Command::GetRit => "get_rit",
            Command::SetRit(_) => "set_rit",
            Command::GetXit => "get_xit",
            Command::SetXit(_) => "set_xit",
            Command::GetInfo => "get_info",
            Command::DumpCaps => "dump_caps",
            Command::ChkVfo => "chk_vfo",
            Command::SetExtResponse(_) => "set_ext_response",
            Command::Quit => "quit",
        }
    }
}

/// A parsed line: the command plus its raw arguments for echoing.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub command: Command,
    pub args: Vec<String>,
}

/// Map a short form to its long name.
fn long_name_for(short: char) -> Option<&'static str> {
    let name = match short {
        'f' => "get_freq",
        'F' => "set_freq",
        'm' => "get_mode",
        'M' => "set_mode",
        'v' => "get_vfo",
        'V' => "set_vfo",
        't' => "get_ptt",
        'T' => "set_ptt",
        'l' => "get_level",
        'L' => "set_level",
        's' => "get_split_vfo",
        'S' => "set_split_vfo",
        'i' => "get_split_freq",
        'I' => "set_split_freq",
        'x' => "get_split_mode",
        'X' => "set_split_mode",
        'j' => "get_rit",
        'J' => "set_rit",
        'z' => "get_xit",
        'Z' => "set_xit",
        '_' => "get_info",
        '1' => "dump_caps",
        'q' => "quit",
        _ => return None,
    };
    Some(name)
}

fn arg<'a>(args: &'a [&str], index: usize, what: &str) -> Result<&'a str, CommandError> {
    args.get(index)
        .copied()
        .ok_or_else(|| CommandError::BadArgument(format!("missing {what}")))
}

fn parse_frequency(text: &str) -> Result<u64, CommandError> {
    if let Ok(hz) = text.parse::<u64>() {
        return Ok(hz);
    }
    // Hamlib clients often send "%f" formatted values.
    match text.parse::<f64>() {
        Ok(hz) if hz.is_finite() && hz >= 0.0 => Ok(hz.round() as u64),
        _ => Err(CommandError::BadArgument(format!("bad frequency {text:?}"))),
    }
}

fn parse_mode(text: &str) -> Result<Mode, CommandError> {
    text.parse()
        .map_err(|_| CommandError::BadArgument(format!("bad mode {text:?}")))
}

/// `0` asks for the rig's default width and `-1` for no change.
fn parse_passband(text: Option<&str>) -> Result<Option<Passband>, CommandError> {
    let Some(text) = text else {
        return Ok(None);
    };
    match text.parse::<i64>() {
        Ok(-1) | Ok(0) => Ok(None),
        Ok(hz) if hz > 0 && hz <= i64::from(u32::MAX) => Ok(Some(Passband::from_hz(hz as u32))),
        _ => Err(CommandError::BadArgument(format!("bad passband {text:?}"))),
    }
}

fn parse_vfo(text: &str) -> Result<Vfo, CommandError> {
    text.parse()
        .map_err(|_| CommandError::BadArgument(format!("bad VFO {text:?}")))
}

fn parse_switch(text: &str) -> Result<bool, CommandError> {
    match text {
        "0" => Ok(false),
        // PTT 2 and 3 (mic / data source) still mean transmit.
        "1" | "2" | "3" => Ok(true),
        _ => Err(CommandError::BadArgument(format!("expected 0 or 1, got {text:?}"))),
    }
}

fn parse_offset(text: &str) -> Result<i32, CommandError> {
    text.parse()
        .map_err(|_| CommandError::BadArgument(format!("bad offset {text:?}")))
}

fn parse_level_value(text: &str) -> Result<f64, CommandError> {
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(CommandError::BadArgument(format!("bad level value {text:?}"))),
    }
}

fn build(name: &str, args: &[&str]) -> Result<Command, CommandError> {
    let command = match name {
        "get_freq" => Command::GetFreq,
        "set_freq" => Command::SetFreq(parse_frequency(arg(args, 0, "frequency")?)?),
        "get_mode" => Command::GetMode,
        "set_mode" => Command::SetMode(
            parse_mode(arg(args, 0, "mode")?)?,
            parse_passband(args.get(1).copied())?,
        ),
        "get_vfo" => Command::GetVfo,
        "set_vfo" => Command::SetVfo(parse_vfo(arg(args, 0, "VFO")?)?),
        "get_ptt" => Command::GetPtt,
        "set_ptt" => Command::SetPtt(parse_switch(arg(args, 0, "PTT")?)?),
        "get_level" => Command::GetLevel(arg(args, 0, "level")?.parse()?),
        "set_level" => Command::SetLevel(
            arg(args, 0, "level")?.parse()?,
            parse_level_value(arg(args, 1, "level value")?)?,
        ),
        "get_split_vfo" => Command::GetSplitVfo,
        "set_split_vfo" => {
            let on = parse_switch(arg(args, 0, "split")?)?;
            let tx = match args.get(1) {
                Some(text) => parse_vfo(text)?,
                None => Vfo::B,
            };
            Command::SetSplitVfo(on, tx)
        }
        "get_split_freq" => Command::GetSplitFreq,
        "set_split_freq" => Command::SetSplitFreq(parse_frequency(arg(args, 0, "frequency")?)?),
        "get_split_mode" => Command::GetSplitMode,
        "set_split_mode" => Command::SetSplitMode(
            parse_mode(arg(args, 0, "mode")?)?,
            parse_passband(args.get(1).copied())?,
        ),
        "get_rit" => Command::GetRit,
        "set_rit" => Command::SetRit(parse_offset(arg(args, 0, "offset")?)?),
        "get_xit" => Command::GetXit,
        "set_xit" => Command::SetXit(parse_offset(arg(args, 0, "offset")?)?),
        "get_info" => Command::GetInfo,
        "dump_caps" => Command::DumpCaps,
        "chk_vfo" => Command::ChkVfo,
        "set_ext_response" => Command::SetExtResponse(parse_switch(arg(args, 0, "flag")?)?),
        "quit" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(command)
}

/// Parse one line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<Request>, CommandError> {
    let mut tokens = line.split_whitespace();
    let Some(head) = tokens.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = tokens.collect();

    let name = if let Some(long) = head.strip_prefix('\\') {
        long
    } else {
        let mut chars = head.chars();
        match (chars.next(), chars.next()) {
            (Some(short), None) => {
                long_name_for(short).ok_or_else(|| CommandError::Unknown(head.to_string()))?
            }
            _ => return Err(CommandError::Unknown(head.to_string())),
        }
    };

    let command = build(name, &args)?;
    Ok(Some(Request {
        command,
        args: args.iter().map(|a| a.to_string()).collect(),
    }))
}
